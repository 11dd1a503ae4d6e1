//! Subset recognition and LIMIT/OFFSET composition under nesting.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::NativeRegistry;
use cubist::olap::{MdxExpr, MdxValue};
use cubist::sql::Dialect;

fn subset(set: MdxExpr, start: i64, count: Option<i64>) -> MdxExpr {
    let mut args = vec![set, MdxExpr::Literal(MdxValue::Int(start))];
    if let Some(count) = count {
        args.push(MdxExpr::Literal(MdxValue::Int(count)));
    }
    MdxExpr::call("Subset", args)
}

#[test]
fn test_plain_subset() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = subset(fx.state_set(&["CA", "OR", "WA"]), 1, Some(2));
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    assert_eq!(evaluator.max_rows(), Some(2));

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("LIMIT 2"), "{sql}");
    assert!(sql.contains("OFFSET 1"), "{sql}");
}

#[test]
fn test_nested_subsets_compose() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // Subset(Subset(S, 2, 10), 3, 4) == Subset(S, 5, 4)
    let inner = subset(fx.state_set(&["CA", "OR", "WA"]), 2, Some(10));
    let outer = subset(inner, 3, Some(4));
    let evaluator = registry.try_native(&outer, &mut ctx).unwrap().unwrap();

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("LIMIT 4"), "{sql}");
    assert!(sql.contains("OFFSET 5"), "{sql}");
}

#[test]
fn test_subset_beyond_inner_limit_is_statically_empty() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // The inner TopCount yields at most 10 rows; an outer start of 100
    // exhausts the budget.
    let inner = MdxExpr::call(
        "TopCount",
        vec![
            fx.state_set(&["CA", "OR", "WA"]),
            MdxExpr::Literal(MdxValue::Int(10)),
            MdxExpr::MeasureRef("Unit Sales".into()),
        ],
    );
    let outer = subset(inner, 100, Some(5));
    let evaluator = registry.try_native(&outer, &mut ctx).unwrap().unwrap();

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("LIMIT 0"), "{sql}");
    assert!(!sql.contains("OFFSET"), "clamped query carries no offset: {sql}");
}

#[test]
fn test_subset_without_count_offsets_only() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = subset(fx.state_set(&["CA", "OR", "WA"]), 2, None);
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    assert_eq!(evaluator.max_rows(), None);

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("OFFSET 2"), "{sql}");
    assert!(!sql.contains("LIMIT"), "{sql}");
}

#[test]
fn test_negative_start_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = subset(fx.state_set(&["CA"]), -1, Some(2));
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}
