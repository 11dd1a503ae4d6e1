//! Star schema metadata: cubes, dimensions, levels, measures, and the
//! physical star the SQL is generated against.
//!
//! These are the read-only metadata types the native evaluation core
//! consumes. In the full engine they are loaded from schema definitions;
//! here they are constructed programmatically (see the builder methods and
//! the test fixtures).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::sql::expr::{self, Expr};

// =============================================================================
// Aggregators
// =============================================================================

/// Aggregation function attached to a stored measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Aggregator {
    Sum,
    Count,
    Min,
    Max,
    Avg,
    DistinctCount,
}

impl Aggregator {
    /// Parse a schema aggregator name.
    pub fn from_name(name: &str) -> Option<Aggregator> {
        match name.to_ascii_lowercase().as_str() {
            "sum" => Some(Aggregator::Sum),
            "count" => Some(Aggregator::Count),
            "min" => Some(Aggregator::Min),
            "max" => Some(Aggregator::Max),
            "avg" => Some(Aggregator::Avg),
            "distinct-count" | "distinct count" => Some(Aggregator::DistinctCount),
            _ => None,
        }
    }

    /// Display name used in diagnostics and cache keys.
    pub fn display_name(&self) -> &'static str {
        match self {
            Aggregator::Sum => "sum",
            Aggregator::Count => "count",
            Aggregator::Min => "min",
            Aggregator::Max => "max",
            Aggregator::Avg => "avg",
            Aggregator::DistinctCount => "distinct-count",
        }
    }

    /// The aggregator used when rolling up pre-aggregated cells.
    ///
    /// COUNT rolls up by summing partial counts; everything else rolls up
    /// with itself. DISTINCT COUNT cannot be rolled up from partials at
    /// all, but keeps its identity here and is rejected where rollup is
    /// structurally required.
    pub fn rollup(&self) -> Aggregator {
        match self {
            Aggregator::Count => Aggregator::Sum,
            other => *other,
        }
    }

    /// Whether the aggregate can come back NULL over an empty cell set.
    ///
    /// COUNT and DISTINCT COUNT always produce a number, so ORDER BY on
    /// them needs no explicit null placement.
    pub fn returns_null_on_empty(&self) -> bool {
        !matches!(self, Aggregator::Count | Aggregator::DistinctCount)
    }

    /// Whether this aggregator is in the COUNT/SUM family that the
    /// 1-argument Aggregate rewrite supports.
    pub fn is_sum_family(&self) -> bool {
        matches!(self, Aggregator::Sum | Aggregator::Count)
    }

    /// Apply this aggregator to a SQL expression.
    pub fn apply(&self, arg: Expr) -> Expr {
        match self {
            Aggregator::Sum => expr::sum(arg),
            Aggregator::Count => expr::count(arg),
            Aggregator::Min => expr::min(arg),
            Aggregator::Max => expr::max(arg),
            Aggregator::Avg => expr::avg(arg),
            Aggregator::DistinctCount => expr::count_distinct(arg),
        }
    }
}

// =============================================================================
// Physical star
// =============================================================================

/// Reference to a physical column by table and column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// SQL expression for this column, qualified by table.
    pub fn to_expr(&self) -> Expr {
        expr::table_col(&self.table, &self.column)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// A physical column registered in a star, with its bit position.
#[derive(Debug, Clone, PartialEq)]
pub struct StarColumn {
    pub column: ColumnRef,
    /// Position in every [`ColumnMask`](crate::native::ColumnMask) built
    /// against this star.
    pub bit: usize,
}

/// How a dimension table joins to the fact table.
#[derive(Debug, Clone, PartialEq)]
pub struct StarTableJoin {
    /// Dimension table name.
    pub table: String,
    /// Foreign key column on the fact table.
    pub fact_fk: String,
    /// Primary key column on the dimension table.
    pub pk: String,
}

/// The denormalized fact-and-dimension schema SQL is generated against.
///
/// Columns are registered once, in a stable order; the registration index
/// is the column's bit position.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub fact_table: String,
    pub schema: Option<String>,
    columns: Vec<StarColumn>,
    by_ref: HashMap<ColumnRef, usize>,
    joins: HashMap<String, StarTableJoin>,
}

impl Star {
    pub fn new(fact_table: &str) -> Self {
        Self {
            fact_table: fact_table.into(),
            schema: None,
            columns: Vec::new(),
            by_ref: HashMap::new(),
            joins: HashMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Register a physical column; returns its bit position. Registering
    /// the same column twice returns the existing position.
    pub fn add_column(&mut self, column: ColumnRef) -> usize {
        if let Some(&bit) = self.by_ref.get(&column) {
            return bit;
        }
        let bit = self.columns.len();
        self.by_ref.insert(column.clone(), bit);
        self.columns.push(StarColumn { column, bit });
        bit
    }

    /// Register how a dimension table joins to the fact table.
    pub fn add_join(&mut self, join: StarTableJoin) {
        self.joins.insert(join.table.clone(), join);
    }

    /// Number of registered physical columns - the mask universe size.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Look up a registered column by reference.
    pub fn column(&self, column: &ColumnRef) -> Option<&StarColumn> {
        self.by_ref.get(column).map(|&bit| &self.columns[bit])
    }

    /// Column at a bit position.
    pub fn column_at(&self, bit: usize) -> Option<&StarColumn> {
        self.columns.get(bit)
    }

    /// Join description for a dimension table, if it is part of this star.
    pub fn join_for(&self, table: &str) -> Option<&StarTableJoin> {
        self.joins.get(table)
    }

    /// Whether a table participates in this star (the fact table or a
    /// joined dimension table).
    pub fn contains_table(&self, table: &str) -> bool {
        table == self.fact_table || self.joins.contains_key(table)
    }
}

// =============================================================================
// Levels, hierarchies, dimensions
// =============================================================================

/// One level of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Unqualified level name, e.g. "City".
    pub name: String,
    /// Owning hierarchy's unique name, e.g. "[Customer]".
    pub hierarchy: String,
    /// Distance from the root; the "all" level is depth 0.
    pub depth: usize,
    /// Physical key column, absent for the "all" level.
    pub column: Option<ColumnRef>,
    /// Key values are unique across the whole level, making ancestor
    /// columns redundant in predicates.
    pub unique_members: bool,
    /// The synthetic "all" level at the hierarchy root.
    pub is_all: bool,
}

impl Level {
    /// Qualified name for diagnostics and cache keys.
    pub fn unique_name(&self) -> String {
        format!("{}.[{}]", self.hierarchy, self.name)
    }
}

/// A hierarchy: ordered levels from the optional "all" root downward.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    /// Unique name, e.g. "[Customer]".
    pub name: String,
    pub has_all: bool,
    pub levels: Vec<Arc<Level>>,
}

/// A dimension groups one or more hierarchies.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub hierarchies: Vec<Hierarchy>,
}

// =============================================================================
// Measures
// =============================================================================

/// A measure: either stored (a fact column + aggregator) or calculated
/// (an MDX formula over other measures).
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    Stored {
        name: String,
        column: ColumnRef,
        aggregator: Aggregator,
    },
    Calculated {
        name: String,
        formula: crate::olap::expr::MdxExpr,
    },
}

impl Measure {
    pub fn name(&self) -> &str {
        match self {
            Measure::Stored { name, .. } => name,
            Measure::Calculated { name, .. } => name,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Measure::Stored { .. })
    }
}

// =============================================================================
// Cube
// =============================================================================

/// A cube: a star plus the dimensional metadata resolved against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub name: String,
    pub star: Star,
    pub dimensions: Vec<Dimension>,
    measures: HashMap<String, Measure>,
}

impl Cube {
    pub fn new(name: &str, star: Star) -> Self {
        Self {
            name: name.into(),
            star,
            dimensions: Vec::new(),
            measures: HashMap::new(),
        }
    }

    pub fn add_dimension(&mut self, dimension: Dimension) {
        self.dimensions.push(dimension);
    }

    pub fn add_measure(&mut self, measure: Measure) {
        self.measures.insert(measure.name().to_string(), measure);
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.get(name)
    }

    /// The level directly above `level` in its hierarchy, when the
    /// hierarchy is registered on this cube.
    pub fn parent_level(&self, level: &Level) -> Option<&Arc<Level>> {
        if level.depth == 0 {
            return None;
        }
        self.dimensions
            .iter()
            .flat_map(|d| &d.hierarchies)
            .find(|h| h.name == level.hierarchy)
            .and_then(|h| h.levels.iter().find(|l| l.depth + 1 == level.depth))
    }

    /// Resolve a level to its physical star column.
    ///
    /// `None` when the level has no column (the "all" level) or its table
    /// is not part of this cube's star - the "unsatisfiable" case of
    /// compound predicate compilation.
    pub fn resolve_level(&self, level: &Level) -> Option<&StarColumn> {
        let column = level.column.as_ref()?;
        if !self.star.contains_table(&column.table) {
            return None;
        }
        self.star.column(column)
    }
}
