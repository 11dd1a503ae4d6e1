//! Nested native functions: constraint chains, emission order, and the
//! reuse of the inner evaluator's CrossJoinArgs.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::NativeRegistry;
use cubist::olap::{MdxExpr, MdxValue};
use cubist::sql::Dialect;

fn top_count(set: MdxExpr, count: i64) -> MdxExpr {
    MdxExpr::call(
        "TopCount",
        vec![
            set,
            MdxExpr::Literal(MdxValue::Int(count)),
            MdxExpr::MeasureRef("Unit Sales".into()),
        ],
    )
}

#[test]
fn test_order_of_topcount_wraps_constraint() {
    common::init_tracing();
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Order",
        vec![
            top_count(fx.state_set(&["CA", "OR", "WA"]), 5),
            MdxExpr::MeasureRef("Store Sales".into()),
            MdxExpr::Literal(MdxValue::Str("BASC".into())),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    // The outer node wraps the inner constraint and reuses its args.
    assert!(evaluator.constraint().parent().is_some());
    assert_eq!(evaluator.return_args().len(), 1);

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();

    // Child-before-parent: the outer Order's key precedes TopCount's.
    let order_pos = sql
        .find("SUM(\"sales_fact\".\"store_sales\") ASC")
        .expect("outer order key");
    let topcount_pos = sql
        .find("SUM(\"sales_fact\".\"unit_sales\") DESC")
        .expect("inner order key");
    assert!(order_pos < topcount_pos, "{sql}");

    // The inner LIMIT survives composition.
    assert!(sql.contains("LIMIT 5"), "{sql}");

    // Base filters come from the root args.
    assert!(
        sql.contains("\"customer\".\"state_province\" IN ('CA', 'OR', 'WA')"),
        "{sql}"
    );
}

#[test]
fn test_triple_nesting_subset_of_order_of_topcount() {
    let fx = common::sales_cube();
    let mut ctx = fx.context();
    let registry = NativeRegistry::standard();

    let call = MdxExpr::call(
        "Subset",
        vec![
            MdxExpr::call(
                "Order",
                vec![
                    top_count(fx.state_set(&["CA", "OR", "WA"]), 5),
                    MdxExpr::MeasureRef("Store Sales".into()),
                    MdxExpr::Literal(MdxValue::Str("BDESC".into())),
                ],
            ),
            MdxExpr::Literal(MdxValue::Int(1)),
            MdxExpr::Literal(MdxValue::Int(2)),
        ],
    );
    let evaluator = registry.try_native(&call, &mut ctx).unwrap().unwrap();

    // subset -> order -> topcount -> (root args)
    let subset = evaluator.constraint();
    let order = subset.parent().expect("order node");
    let topcount = order.parent().expect("topcount node");
    assert!(topcount.parent().is_none());

    let sql = evaluator.to_sql(&fx.cube, Dialect::DuckDb).unwrap();
    // Subset's offset composes against TopCount's limit: rows [1, 3) of 5.
    assert!(sql.contains("LIMIT 2"), "{sql}");
    assert!(sql.contains("OFFSET 1"), "{sql}");
}

#[test]
fn test_cache_keys_discriminate_across_nesting() {
    let fx = common::sales_cube();
    let registry = NativeRegistry::standard();

    let build = |count: i64| {
        let mut ctx = fx.context();
        let call = MdxExpr::call(
            "Subset",
            vec![
                top_count(fx.state_set(&["CA", "OR"]), count),
                MdxExpr::Literal(MdxValue::Int(1)),
            ],
        );
        registry
            .try_native(&call, &mut ctx)
            .unwrap()
            .unwrap()
            .cache_key()
    };

    // Identical shapes agree; a different inner count disagrees.
    assert_eq!(build(5), build(5));
    assert_ne!(build(5), build(6));
}
