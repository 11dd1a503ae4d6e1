//! Tests for compound predicate compilation: partitioning, cross-product
//! collapse, and satisfiability.

#[path = "../common/mod.rs"]
mod common;

use cubist::native::compile_compound;
use cubist::olap::MemberTuple;
use cubist::sql::Dialect;

#[test]
fn test_partition_covers_every_satisfiable_tuple_once() {
    let fx = common::sales_cube();
    let ca = fx.state_member("CA");

    // Two groups (gender x state, gender x brand) plus one unsatisfiable
    // tuple referencing nothing the star carries.
    let warehouse_level = std::sync::Arc::new(cubist::olap::Level {
        name: "warehouse".into(),
        hierarchy: "[Warehouse]".into(),
        depth: 1,
        column: Some(cubist::olap::ColumnRef::new("warehouse", "warehouse_name")),
        unique_members: true,
        is_all: false,
    });
    let tuples = vec![
        MemberTuple::new(vec![fx.gender_member("M"), ca.clone()]),
        MemberTuple::new(vec![fx.gender_member("F"), ca]),
        MemberTuple::new(vec![fx.gender_member("M"), fx.brand_member("Best")]),
        MemberTuple::from(cubist::olap::Member::new(
            "W1",
            warehouse_level,
            "W1",
            None,
        )),
    ];

    let compiled = compile_compound(&tuples, &fx.cube).unwrap();
    assert!(compiled.satisfiable);
    let grouped: usize = compiled.group_sizes.iter().sum();
    assert_eq!(grouped + compiled.unsatisfiable_count, tuples.len());
    assert_eq!(compiled.unsatisfiable_count, 1);
    assert_eq!(compiled.group_sizes.len(), 2);
}

#[test]
fn test_cross_product_collapse_exact() {
    let fx = common::sales_cube();
    let ca = fx.state_member("CA");

    // {(M, CA), (F, CA)}: 2 genders x 1 state = 2 rows, collapse applies.
    let tuples = vec![
        MemberTuple::new(vec![fx.gender_member("M"), ca.clone()]),
        MemberTuple::new(vec![fx.gender_member("F"), ca]),
    ];

    let compiled = compile_compound(&tuples, &fx.cube).unwrap();
    let sql = compiled.predicate.unwrap().to_sql(Dialect::DuckDb);
    assert_eq!(
        sql,
        "\"customer\".\"gender\" IN ('M', 'F') \
         AND \"customer\".\"state_province\" = 'CA'"
    );

    // Both columns appear in the mask.
    assert_eq!(compiled.column_mask.count(), 2);
}

#[test]
fn test_mixed_masks_collapse_group_by_group() {
    let fx = common::sales_cube();
    let ca = fx.state_member("CA");

    // {(M, CA), (F, CA)} collapses; {(M, Best)} in the gender x brand
    // group stays a trivial AND.
    let tuples = vec![
        MemberTuple::new(vec![fx.gender_member("M"), ca.clone()]),
        MemberTuple::new(vec![fx.gender_member("F"), ca]),
        MemberTuple::new(vec![fx.gender_member("M"), fx.brand_member("Best")]),
    ];

    let compiled = compile_compound(&tuples, &fx.cube).unwrap();
    assert_eq!(compiled.group_sizes, vec![2, 1]);
    let sql = compiled.predicate.unwrap().to_sql(Dialect::DuckDb);
    assert!(sql.contains("IN ('M', 'F')"));
    assert!(sql.contains("\"product\".\"brand_name\" = 'Best'"));
    assert!(sql.contains(" OR "));
    // Three distinct columns across the two groups.
    assert_eq!(compiled.column_mask.count(), 3);
}

#[test]
fn test_all_unsatisfiable() {
    let fx = common::sales_cube();
    let warehouse_level = std::sync::Arc::new(cubist::olap::Level {
        name: "warehouse".into(),
        hierarchy: "[Warehouse]".into(),
        depth: 1,
        column: Some(cubist::olap::ColumnRef::new("warehouse", "warehouse_name")),
        unique_members: true,
        is_all: false,
    });
    let tuples = vec![
        MemberTuple::from(cubist::olap::Member::new("W1", warehouse_level.clone(), "W1", None)),
        MemberTuple::from(cubist::olap::Member::new("W2", warehouse_level, "W2", None)),
    ];

    let compiled = compile_compound(&tuples, &fx.cube).unwrap();
    assert!(!compiled.satisfiable);
    assert!(compiled.predicate.is_none());
    assert_eq!(compiled.unsatisfiable_count, 2);
}

#[test]
fn test_ancestors_stop_at_unique_level() {
    let fx = common::sales_cube();
    let ca = fx.state_member("CA");
    let sf = fx.city_member("San Francisco", &ca);

    // City is not unique, so its state ancestor is constrained too; the
    // state level is unique, so the walk stops there.
    let compiled = compile_compound(&[MemberTuple::from(sf)], &fx.cube).unwrap();
    let sql = compiled.predicate.unwrap().to_sql(Dialect::DuckDb);
    assert!(sql.contains("\"customer\".\"city\" = 'San Francisco'"));
    assert!(sql.contains("\"customer\".\"state_province\" = 'CA'"));
    assert_eq!(compiled.column_mask.count(), 2);
}
