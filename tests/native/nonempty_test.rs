//! NonEmpty recognition: fact joins, measure binding, degradation.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::NativeRegistry;
use cubist::olap::{MdxExpr, MdxValue};
use cubist::sql::Dialect;

#[test]
fn test_nonempty_joins_and_filters_nulls() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Unit Sales");
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("NonEmpty", vec![fx.state_set(&["CA", "OR"])]);
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    assert!(evaluator.constraint().is_join_required());
    assert!(!evaluator.preserve_empty_rows());

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("FROM \"sales_fact\""), "{sql}");
    assert!(sql.contains("INNER JOIN \"customer\""), "{sql}");
    assert!(
        sql.contains("\"sales_fact\".\"unit_sales\" IS NOT NULL"),
        "{sql}"
    );
}

#[test]
fn test_explicit_measures_bind() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let measures = MdxExpr::call(
        "{}",
        vec![
            MdxExpr::MeasureRef("Unit Sales".into()),
            MdxExpr::MeasureRef("Store Sales".into()),
        ],
    );
    let call = MdxExpr::call("NonEmpty", vec![fx.state_set(&["CA", "OR"]), measures]);
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains(
            "(\"sales_fact\".\"store_sales\" IS NOT NULL \
             OR \"sales_fact\".\"unit_sales\" IS NOT NULL)"
        ),
        "{sql}"
    );
}

#[test]
fn test_calculated_measure_expands() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // "Profit" expands to "Store Sales".
    let call = MdxExpr::call(
        "NonEmpty",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::MeasureRef("Profit".into()),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("\"sales_fact\".\"store_sales\" IS NOT NULL"),
        "{sql}"
    );
}

#[test]
fn test_unusable_measures_degrade_to_ambient() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Unit Sales");
    let registry = NativeRegistry::standard();

    // An unknown measure is treated as unrelated and ignored; with
    // nothing left, the ambient measure binds.
    let call = MdxExpr::call(
        "NonEmpty",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::MeasureRef("Warehouse Sales".into()),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("\"sales_fact\".\"unit_sales\" IS NOT NULL"),
        "{sql}"
    );
}

#[test]
fn test_no_measure_anywhere_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("NonEmpty", vec![fx.state_set(&["CA", "OR"])]);
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_nonempty_wrapping_topcount_keeps_limit() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Unit Sales");
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "NonEmpty",
        vec![MdxExpr::call(
            "TopCount",
            vec![
                fx.state_set(&["CA", "OR", "WA"]),
                MdxExpr::Literal(MdxValue::Int(2)),
                MdxExpr::MeasureRef("Unit Sales".into()),
            ],
        )],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("LIMIT 2"), "{sql}");
    assert!(
        sql.contains("\"sales_fact\".\"unit_sales\" IS NOT NULL"),
        "{sql}"
    );
}
