//! Order recognition: flags, hierarchy restrictions, join necessity.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::NativeRegistry;
use cubist::olap::{MdxExpr, MdxValue, MemberTuple};
use cubist::sql::Dialect;

fn order(set: MdxExpr, measure: &str, flag: &str) -> MdxExpr {
    MdxExpr::call(
        "Order",
        vec![
            set,
            MdxExpr::MeasureRef(measure.into()),
            MdxExpr::Literal(MdxValue::Str(flag.into())),
        ],
    )
}

#[test]
fn test_order_desc_over_member_set() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = order(fx.state_set(&["CA", "OR"]), "Unit Sales", "BDESC");
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    // Ordering on a stored measure forces the fact join.
    assert!(evaluator.constraint().is_join_required());

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY SUM(\"sales_fact\".\"unit_sales\") DESC NULLS LAST"),
        "{sql}"
    );
    assert!(sql.contains("GROUP BY"), "{sql}");
}

#[test]
fn test_order_through_calculated_measure() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    // "Profit" is calculated as a plain alias of "Store Sales".
    let call = order(fx.state_set(&["CA", "OR"]), "Profit", "BASC");
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();
    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    assert!(
        sql.contains("ORDER BY SUM(\"sales_fact\".\"store_sales\") ASC"),
        "{sql}"
    );
}

#[test]
fn test_hierarchical_order_rejected_on_deep_level() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let ca = fx.state_member("CA");
    let cities = MdxExpr::TupleSet(vec![
        MemberTuple::from(fx.city_member("San Francisco", &ca)),
        MemberTuple::from(fx.city_member("Oakland", &ca)),
    ]);

    // City sits two levels deep: hierarchical ASC cannot be reproduced by
    // a flat ORDER BY, but the "break hierarchy" flag can.
    let hierarchical = order(cities.clone(), "Unit Sales", "ASC");
    assert!(registry.try_native(&hierarchical, &mut ctx).unwrap().is_none());

    let flattened = order(cities, "Unit Sales", "BASC");
    assert!(registry.try_native(&flattened, &mut ctx).unwrap().is_some());
}

#[test]
fn test_unknown_flag_rejects() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = order(fx.state_set(&["CA"]), "Unit Sales", "SIDEWAYS");
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}

#[test]
fn test_order_expression_must_reach_stored_measure() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Order",
        vec![
            fx.state_set(&["CA"]),
            MdxExpr::Literal(MdxValue::Int(1)),
            MdxExpr::Literal(MdxValue::Str("BASC".into())),
        ],
    );
    assert!(registry.try_native(&call, &mut ctx).unwrap().is_none());
}
