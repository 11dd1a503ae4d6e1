//! End-to-end TopCount/BottomCount recognition and SQL generation.

#[path = "../common/mod.rs"]
mod common;

use cubist::config::NativeConfig;
use cubist::native::NativeRegistry;
use cubist::olap::{MdxExpr, MdxValue};
use cubist::sql::Dialect;

fn top_count(set: MdxExpr, count: i64, measure: &str) -> MdxExpr {
    MdxExpr::call(
        "TopCount",
        vec![
            set,
            MdxExpr::Literal(MdxValue::Int(count)),
            MdxExpr::MeasureRef(measure.into()),
        ],
    )
}

#[test]
fn test_topcount_produces_native_evaluator() {
    common::init_tracing();
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = top_count(fx.state_set(&["CA", "OR", "WA", "NV"]), 2, "Unit Sales");
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    assert_eq!(evaluator.max_rows(), Some(2));
    assert_eq!(evaluator.bound_measure(), Some("Unit Sales"));
    assert_eq!(evaluator.return_args().len(), 1);
    assert!(evaluator.preserve_empty_rows());

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("FROM \"sales_fact\""), "fact join expected: {sql}");
    assert!(sql.contains("INNER JOIN \"customer\""), "{sql}");
    assert!(
        sql.contains("ORDER BY SUM(\"sales_fact\".\"unit_sales\") DESC NULLS LAST"),
        "{sql}"
    );
    assert!(sql.contains("LIMIT 2"), "{sql}");
    assert!(sql.contains("GROUP BY \"customer\".\"state_province\""), "{sql}");
    assert!(
        sql.contains("\"customer\".\"state_province\" IN ('CA', 'OR', 'WA', 'NV')"),
        "{sql}"
    );
}

#[test]
fn test_bottomcount_sorts_ascending() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "BottomCount",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::Literal(MdxValue::Int(3)),
            MdxExpr::MeasureRef("Unit Sales".into()),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY SUM(\"sales_fact\".\"unit_sales\") ASC NULLS LAST"),
        "{sql}"
    );
}

#[test]
fn test_disabled_feature_flag_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    ctx.config = NativeConfig {
        enable_top_count: false,
        ..NativeConfig::default()
    };
    let registry = NativeRegistry::standard();

    let call = top_count(fx.state_set(&["CA", "OR", "WA", "NV"]), 2, "Unit Sales");
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_non_literal_count_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "TopCount",
        vec![
            fx.state_set(&["CA"]),
            MdxExpr::MeasureRef("Unit Sales".into()),
            MdxExpr::MeasureRef("Unit Sales".into()),
        ],
    );
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_two_arg_form_requires_single_dimension() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // Single axis: accepted, ordered on the axis column.
    let single = MdxExpr::call(
        "TopCount",
        vec![fx.state_set(&["CA", "OR"]), MdxExpr::Literal(MdxValue::Int(1))],
    );
    let evaluator = registry.try_native(&single, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY \"customer\".\"state_province\" ASC"),
        "{sql}"
    );
    assert!(sql.contains("SELECT DISTINCT"), "no fact join expected: {sql}");

    // Two axes without an order expression: rejected.
    let double = MdxExpr::call(
        "TopCount",
        vec![
            MdxExpr::CrossJoin(
                Box::new(fx.state_set(&["CA", "OR"])),
                Box::new(fx.gender_set(&["M", "F"])),
            ),
            MdxExpr::Literal(MdxValue::Int(1)),
        ],
    );
    assert!(registry.try_native(&double, &mut ctx).unwrap().is_none());
}

#[test]
fn test_count_aggregator_orders_without_null_placement() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // COUNT never returns NULL, so no NULLS LAST is emitted.
    let call = top_count(fx.state_set(&["CA", "OR"]), 2, "Sales Count");
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY COUNT(\"sales_fact\".\"unit_sales\") DESC"),
        "{sql}"
    );
    assert!(!sql.contains("NULLS"), "{sql}");
}

#[test]
fn test_distinct_count_follows_same_nullability_rule() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = top_count(fx.state_set(&["CA", "OR"]), 2, "Customer Count");
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY COUNT(DISTINCT \"sales_fact\".\"customer_id\") DESC"),
        "{sql}"
    );
    assert!(!sql.contains("NULLS"), "{sql}");
}
