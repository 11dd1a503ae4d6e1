//! Aggregate/Sum recognition: aggregator resolution and rollup rules.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::NativeRegistry;
use cubist::olap::MdxExpr;
use cubist::sql::Dialect;

#[test]
fn test_sum_over_member_set() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Sum",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::MeasureRef("Unit Sales".into()),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    assert_eq!(evaluator.bound_measure(), Some("Unit Sales"));
    assert_eq!(evaluator.max_rows(), Some(1));

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("SUM(\"sales_fact\".\"unit_sales\")"), "{sql}");
    assert!(
        sql.contains("\"customer\".\"state_province\" IN ('CA', 'OR')"),
        "{sql}"
    );
    assert!(sql.contains("FROM \"sales_fact\""), "{sql}");
}

#[test]
fn test_one_arg_aggregate_uses_ambient_measure() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Unit Sales");
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("Aggregate", vec![fx.state_set(&["CA", "OR"])]);
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(sql.contains("SUM(\"sales_fact\".\"unit_sales\")"), "{sql}");
}

#[test]
fn test_count_degrades_to_sum_rollup() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Sales Count");
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("Aggregate", vec![fx.state_set(&["CA", "OR"])]);
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("SUM(\"sales_fact\".\"unit_sales\")"),
        "COUNT rolls up as SUM: {sql}"
    );
}

#[test]
fn test_one_arg_aggregate_rejects_non_sum_family() {
    let fx = common::sales_cube();
    let mut ctx = fx.context_with_measure("Customer Count");
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("Aggregate", vec![fx.state_set(&["CA", "OR"])]);
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_two_arg_aggregate_takes_measure_aggregator() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Aggregate",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::MeasureRef("Sales Count".into()),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("COUNT(\"sales_fact\".\"unit_sales\")"),
        "configured aggregator applies: {sql}"
    );
}

#[test]
fn test_two_arg_aggregate_rejects_distinct_count() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Aggregate",
        vec![
            fx.state_set(&["CA", "OR"]),
            MdxExpr::MeasureRef("Customer Count".into()),
        ],
    );
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_aggregate_without_ambient_measure_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call("Aggregate", vec![fx.state_set(&["CA", "OR"])]);
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}
