//! Shared test fixture: a small FoodMart-style sales cube.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use cubist::olap::{
    Aggregator, ColumnRef, Cube, Dimension, EvaluatorContext, Hierarchy, Level, MdxExpr, Measure,
    Member, Star, StarTableJoin,
};
use cubist::sql::Dialect;

/// Opt-in diagnostics for debugging test failures:
/// `RUST_LOG=cubist=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// The fixture cube plus the levels tests address directly.
pub struct Fixture {
    pub cube: Arc<Cube>,
    pub gender: Arc<Level>,
    pub state: Arc<Level>,
    pub city: Arc<Level>,
    pub brand: Arc<Level>,
    pub measures_level: Arc<Level>,
}

pub fn sales_cube() -> Fixture {
    let mut star = Star::new("sales_fact");
    star.add_column(ColumnRef::new("customer", "gender"));
    star.add_column(ColumnRef::new("customer", "state_province"));
    star.add_column(ColumnRef::new("customer", "city"));
    star.add_column(ColumnRef::new("product", "brand_name"));
    star.add_column(ColumnRef::new("sales_fact", "unit_sales"));
    star.add_column(ColumnRef::new("sales_fact", "store_sales"));
    star.add_column(ColumnRef::new("sales_fact", "customer_id"));
    star.add_join(StarTableJoin {
        table: "customer".into(),
        fact_fk: "customer_id".into(),
        pk: "customer_id".into(),
    });
    star.add_join(StarTableJoin {
        table: "product".into(),
        fact_fk: "product_id".into(),
        pk: "product_id".into(),
    });

    let gender = Arc::new(Level {
        name: "gender".into(),
        hierarchy: "[Gender]".into(),
        depth: 1,
        column: Some(ColumnRef::new("customer", "gender")),
        unique_members: true,
        is_all: false,
    });
    let state = Arc::new(Level {
        name: "state".into(),
        hierarchy: "[Customer]".into(),
        depth: 1,
        column: Some(ColumnRef::new("customer", "state_province")),
        unique_members: true,
        is_all: false,
    });
    let city = Arc::new(Level {
        name: "city".into(),
        hierarchy: "[Customer]".into(),
        depth: 2,
        column: Some(ColumnRef::new("customer", "city")),
        unique_members: false,
        is_all: false,
    });
    let brand = Arc::new(Level {
        name: "brand".into(),
        hierarchy: "[Product]".into(),
        depth: 1,
        column: Some(ColumnRef::new("product", "brand_name")),
        unique_members: true,
        is_all: false,
    });
    let measures_level = Arc::new(Level {
        name: "MeasuresLevel".into(),
        hierarchy: "[Measures]".into(),
        depth: 1,
        column: None,
        unique_members: true,
        is_all: false,
    });

    let all_of = |hierarchy: &str| {
        Arc::new(Level {
            name: "(All)".into(),
            hierarchy: hierarchy.into(),
            depth: 0,
            column: None,
            unique_members: true,
            is_all: true,
        })
    };

    let mut cube = Cube::new("Sales", star);
    cube.add_dimension(Dimension {
        name: "Gender".into(),
        hierarchies: vec![Hierarchy {
            name: "[Gender]".into(),
            has_all: true,
            levels: vec![all_of("[Gender]"), Arc::clone(&gender)],
        }],
    });
    cube.add_dimension(Dimension {
        name: "Customer".into(),
        hierarchies: vec![Hierarchy {
            name: "[Customer]".into(),
            has_all: true,
            levels: vec![all_of("[Customer]"), Arc::clone(&state), Arc::clone(&city)],
        }],
    });
    cube.add_dimension(Dimension {
        name: "Product".into(),
        hierarchies: vec![Hierarchy {
            name: "[Product]".into(),
            has_all: true,
            levels: vec![all_of("[Product]"), Arc::clone(&brand)],
        }],
    });
    cube.add_measure(Measure::Stored {
        name: "Unit Sales".into(),
        column: ColumnRef::new("sales_fact", "unit_sales"),
        aggregator: Aggregator::Sum,
    });
    cube.add_measure(Measure::Stored {
        name: "Store Sales".into(),
        column: ColumnRef::new("sales_fact", "store_sales"),
        aggregator: Aggregator::Sum,
    });
    cube.add_measure(Measure::Stored {
        name: "Sales Count".into(),
        column: ColumnRef::new("sales_fact", "unit_sales"),
        aggregator: Aggregator::Count,
    });
    cube.add_measure(Measure::Stored {
        name: "Customer Count".into(),
        column: ColumnRef::new("sales_fact", "customer_id"),
        aggregator: Aggregator::DistinctCount,
    });
    cube.add_measure(Measure::Calculated {
        name: "Profit".into(),
        formula: MdxExpr::MeasureRef("Store Sales".into()),
    });

    Fixture {
        cube: Arc::new(cube),
        gender,
        state,
        city,
        brand,
        measures_level,
    }
}

impl Fixture {
    /// Context over the fixture cube, DuckDB dialect.
    pub fn context(&self) -> EvaluatorContext {
        EvaluatorContext::new(Arc::clone(&self.cube), Dialect::DuckDb)
    }

    /// Context with a current measure bound.
    pub fn context_with_measure(&self, measure: &str) -> EvaluatorContext {
        let mut ctx = self.context();
        ctx.set_current_member(Member::new(
            measure,
            Arc::clone(&self.measures_level),
            measure,
            None,
        ));
        ctx
    }

    pub fn gender_member(&self, name: &str) -> Arc<Member> {
        Member::new(name, Arc::clone(&self.gender), name, None)
    }

    pub fn state_member(&self, name: &str) -> Arc<Member> {
        Member::new(name, Arc::clone(&self.state), name, None)
    }

    pub fn city_member(&self, name: &str, state: &Arc<Member>) -> Arc<Member> {
        Member::new(name, Arc::clone(&self.city), name, Some(Arc::clone(state)))
    }

    pub fn brand_member(&self, name: &str) -> Arc<Member> {
        Member::new(name, Arc::clone(&self.brand), name, None)
    }

    /// `{m1, m2, ...}` member set over the gender level.
    pub fn gender_set(&self, names: &[&str]) -> MdxExpr {
        MdxExpr::MemberSet(names.iter().map(|n| self.gender_member(n)).collect())
    }

    /// `{s1, s2, ...}` member set over the state level.
    pub fn state_set(&self, names: &[&str]) -> MdxExpr {
        MdxExpr::MemberSet(names.iter().map(|n| self.state_member(n)).collect())
    }
}
