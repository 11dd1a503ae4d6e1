//! Constraint chain - one node per native function application.
//!
//! A nesting expression like `Order(TopCount(NonEmpty(...)))` compiles to a
//! linked chain: the outermost function is the head, each node holding its
//! own parameters plus an optional `parent` link to the constraint it
//! wraps. SQL emission preserves the chain's asymmetry exactly:
//!
//! - ORDER BY and LIMIT/OFFSET are emitted *child-before-parent*: the head
//!   emits first, so its ordering dominates and its pagination composes
//!   with any pagination the wrapped constraint applies afterwards.
//! - WHERE/JOIN/GROUP BY are emitted *parent-before-self*: the chain
//!   bottoms out at the root node, whose CrossJoinArgs and slicer produce
//!   the base filters, before each decorator appends its own.
//!
//! Nodes are immutable after construction and discarded at the end of the
//! evaluation that created them; only the cache key and the rendered SQL
//! outlive them.

use tracing::debug;

use crate::error::NativeResult;
use crate::native::cache_key::CacheKey;
use crate::native::compound;
use crate::native::crossjoin::CrossJoinArg;
use crate::native::predicate::Predicate;
use crate::olap::member::MemberTuple;
use crate::olap::schema::{Aggregator, ColumnRef, Cube};
use crate::sql::builder::{OrderByExpr, SelectExpr, SqlQueryBuilder, TableRef};
use crate::sql::expr::{Expr, ExprExt, UnaryOperator};

/// A rendered order expression with the metadata emission needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    /// SQL form of the order expression.
    pub expr: Expr,
    /// Stable MDX textual form, used in cache keys.
    pub text: String,
    /// The underlying aggregator can produce NULL over empty cells, so
    /// ORDER BY needs explicit null placement.
    pub nullable: bool,
    /// The expression reaches a stored measure.
    pub needs_fact: bool,
}

/// Function-specific parameters of one constraint node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    /// Chain root carrying only CrossJoinArgs and the slicer.
    Set,

    /// TopCount/BottomCount: `ascending` is true for BottomCount. The
    /// 2-argument form has no order key and sorts on the axis column.
    TopCount {
        count: u64,
        ascending: bool,
        order: Option<OrderKey>,
    },

    /// Order over the flattened set.
    Order { order: OrderKey, ascending: bool },

    /// Subset: pure OFFSET/LIMIT wrapper.
    Subset { start: u64, count: Option<u64> },

    /// Except: excludes a tuple list from the base set.
    Except { exclusions: Vec<MemberTuple> },

    /// Aggregate/Sum collapsed to a single SQL aggregation.
    Aggregate {
        aggregator: Aggregator,
        measure_column: ColumnRef,
        filter: Option<Predicate>,
    },

    /// NonEmpty: restrict to rows where some bound measure has data.
    NonEmpty { measure_columns: Vec<ColumnRef> },
}

impl ConstraintKind {
    fn node_type(&self) -> &'static str {
        match self {
            ConstraintKind::Set => "set",
            ConstraintKind::TopCount { .. } => "topcount",
            ConstraintKind::Order { .. } => "order",
            ConstraintKind::Subset { .. } => "subset",
            ConstraintKind::Except { .. } => "except",
            ConstraintKind::Aggregate { .. } => "aggregate",
            ConstraintKind::NonEmpty { .. } => "nonempty",
        }
    }

    /// Whether this node's own discriminator forces a fact-table join.
    fn requires_fact_join(&self) -> bool {
        match self {
            ConstraintKind::Set => false,
            // The 3-argument form orders on a measure; joining is what
            // drops empty combinations before the LIMIT applies.
            ConstraintKind::TopCount { order, .. } => order.is_some(),
            ConstraintKind::Order { order, .. } => order.needs_fact,
            ConstraintKind::Subset { .. } => false,
            ConstraintKind::Except { .. } => false,
            ConstraintKind::Aggregate { .. } => true,
            ConstraintKind::NonEmpty { .. } => true,
        }
    }
}

/// One node of a constraint chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SetConstraint {
    kind: ConstraintKind,
    /// Constraint args: return args plus auxiliary predicate-only args.
    /// Empty for decorator nodes that wrap a parent.
    args: Vec<CrossJoinArg>,
    /// Slicer snapshot at recognition time.
    slicer: Vec<MemberTuple>,
    non_empty: bool,
    role_restricted: bool,
    parent: Option<Box<SetConstraint>>,
}

impl SetConstraint {
    /// Root constraint over decomposed CrossJoinArgs.
    pub fn root(
        kind: ConstraintKind,
        args: Vec<CrossJoinArg>,
        slicer: Vec<MemberTuple>,
        non_empty: bool,
        role_restricted: bool,
    ) -> Self {
        Self {
            kind,
            args,
            slicer,
            non_empty,
            role_restricted,
            parent: None,
        }
    }

    /// Decorator node wrapping an existing constraint. Carries only its
    /// own parameters; the wrapped chain keeps the CrossJoinArgs.
    pub fn wrapping(
        kind: ConstraintKind,
        slicer: Vec<MemberTuple>,
        non_empty: bool,
        role_restricted: bool,
        parent: SetConstraint,
    ) -> Self {
        Self {
            kind,
            args: Vec::new(),
            slicer,
            non_empty,
            role_restricted,
            parent: Some(Box::new(parent)),
        }
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<&SetConstraint> {
        self.parent.as_deref()
    }

    /// CrossJoinArgs of the chain root - the axis the whole chain selects.
    pub fn base_args(&self) -> &[CrossJoinArg] {
        match &self.parent {
            Some(parent) => parent.base_args(),
            None => &self.args,
        }
    }

    /// Whether evaluating this chain requires joining the fact table.
    ///
    /// True when non-empty mode or role restrictions are in force, or when
    /// any node's own discriminator (order expression, aggregation)
    /// references the fact; monotone in the chain - wrapping can only turn
    /// it on, never off.
    pub fn is_join_required(&self) -> bool {
        self.non_empty
            || self.role_restricted
            || self.kind.requires_fact_join()
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_join_required())
    }

    /// Emit the whole chain into `builder`.
    pub fn apply(&self, builder: &mut SqlQueryBuilder, cube: &Cube) -> NativeResult<()> {
        let join = self.is_join_required();
        self.apply_node(builder, cube, join)
    }

    fn apply_node(
        &self,
        builder: &mut SqlQueryBuilder,
        cube: &Cube,
        join: bool,
    ) -> NativeResult<()> {
        // Own ordering and pagination first (child-before-parent).
        self.apply_order_and_limit(builder, cube);

        // Base WHERE/JOIN/GROUP BY from the chain root (parent-before-self).
        match &self.parent {
            Some(parent) => parent.apply_node(builder, cube, join)?,
            None => self.apply_base(builder, cube, join)?,
        }

        // Own filters after the base.
        self.apply_predicates(builder, cube, join)?;
        Ok(())
    }

    fn apply_order_and_limit(&self, builder: &mut SqlQueryBuilder, cube: &Cube) {
        match &self.kind {
            ConstraintKind::TopCount {
                count,
                ascending,
                order,
            } => {
                match order {
                    Some(order) => {
                        builder.add_order_by(directed(order, *ascending));
                    }
                    None => {
                        // 2-argument form: natural order of the single axis.
                        if let Some(column) = self.axis_column(cube) {
                            builder.add_order_by(OrderByExpr::asc(column));
                        }
                    }
                }
                compose_limit(builder, 0, Some(*count));
            }

            ConstraintKind::Order { order, ascending } => {
                builder.add_order_by(directed(order, *ascending));
            }

            ConstraintKind::Subset { start, count } => {
                compose_limit(builder, *start, *count);
            }

            ConstraintKind::Set
            | ConstraintKind::Except { .. }
            | ConstraintKind::Aggregate { .. }
            | ConstraintKind::NonEmpty { .. } => {}
        }
    }

    fn apply_predicates(
        &self,
        builder: &mut SqlQueryBuilder,
        cube: &Cube,
        join: bool,
    ) -> NativeResult<()> {
        match &self.kind {
            ConstraintKind::Except { exclusions } => {
                let compiled = compound::compile(exclusions, cube)?;
                match compiled.predicate {
                    Some(predicate) => {
                        if join {
                            join_predicate_tables(builder, cube, &predicate);
                        }
                        builder.add_where(Expr::UnaryOp {
                            op: UnaryOperator::Not,
                            expr: Box::new(predicate.to_expr()),
                        });
                    }
                    None => {
                        // Unsatisfiable exclusions exclude nothing.
                        debug!("except exclusions unsatisfiable, predicate omitted");
                    }
                }
            }

            ConstraintKind::NonEmpty { measure_columns } => {
                let non_null = measure_columns
                    .iter()
                    .map(|c| Expr::IsNull {
                        expr: Box::new(c.to_expr()),
                        negated: true,
                    })
                    .reduce(|acc, e| acc.or(e))
                    .map(|e| {
                        if measure_columns.len() > 1 {
                            e.paren()
                        } else {
                            e
                        }
                    });
                if let Some(condition) = non_null {
                    builder.add_where(condition);
                }
            }

            ConstraintKind::Set
            | ConstraintKind::TopCount { .. }
            | ConstraintKind::Order { .. }
            | ConstraintKind::Subset { .. }
            | ConstraintKind::Aggregate { .. } => {}
        }
        Ok(())
    }

    fn apply_base(
        &self,
        builder: &mut SqlQueryBuilder,
        cube: &Cube,
        join: bool,
    ) -> NativeResult<()> {
        let axis_count = self
            .args
            .iter()
            .filter(|a| matches!(a, CrossJoinArg::Level { .. }))
            .count();
        // Multiple dimensions can only be combined through the fact table.
        let join = join || axis_count > 1;

        if join {
            let mut fact = TableRef::new(&cube.star.fact_table);
            if let Some(schema) = &cube.star.schema {
                fact = fact.with_schema(schema);
            }
            builder.from(fact);
        } else {
            builder.distinct();
        }

        for arg in &self.args {
            arg.contribute(builder, cube, join)?;
        }

        // The slicer constrains fact rows; a pure member enumeration (no
        // fact join) is not restricted by it.
        if join && !self.slicer.is_empty() {
            let compiled = compound::compile(&self.slicer, cube)?;
            if let Some(predicate) = compiled.predicate {
                join_predicate_tables(builder, cube, &predicate);
                builder.add_where(predicate.to_expr());
            }
        }

        if let ConstraintKind::Aggregate {
            aggregator,
            measure_column,
            filter,
        } = &self.kind
        {
            builder.add_select(SelectExpr::new(aggregator.apply(measure_column.to_expr())));
            if let Some(filter) = filter {
                join_predicate_tables(builder, cube, filter);
                builder.add_where(filter.to_expr());
            }
        }

        Ok(())
    }

    /// SQL expression of the first axis column, for the 2-argument
    /// TopCount ordering.
    fn axis_column(&self, cube: &Cube) -> Option<Expr> {
        self.base_args().iter().find_map(|arg| {
            let level = arg.level()?;
            cube.resolve_level(level).map(|c| c.column.to_expr())
        })
    }

    /// Structural cache key for this node and, recursively, its parents.
    pub fn cache_key(&self) -> CacheKey {
        let parent_key = self.parent.as_ref().map(|p| p.cache_key());
        let mut key = CacheKey::new(self.kind.node_type())
            .push_list(self.args.iter().map(|a| a.key_form()).collect())
            .push_list(self.slicer.iter().map(|t| t.unique_name()).collect())
            .push_bool(self.non_empty)
            .push_bool(self.role_restricted)
            .push_parent(parent_key.as_ref());

        key = match &self.kind {
            ConstraintKind::Set => key,
            ConstraintKind::TopCount {
                count,
                ascending,
                order,
            } => key
                .push_uint(*count)
                .push_bool(*ascending)
                .push_opt_str(order.as_ref().map(|o| o.text.clone())),
            ConstraintKind::Order { order, ascending } => {
                key.push_str(order.text.clone()).push_bool(*ascending)
            }
            ConstraintKind::Subset { start, count } => {
                let key = key.push_uint(*start);
                match count {
                    Some(count) => key.push_uint(*count),
                    None => key.push(crate::native::cache_key::KeyField::Absent),
                }
            }
            ConstraintKind::Except { exclusions } => {
                key.push_list(exclusions.iter().map(|t| t.unique_name()).collect())
            }
            ConstraintKind::Aggregate {
                aggregator,
                measure_column,
                ..
            } => key
                .push_str(aggregator.display_name())
                .push_str(measure_column.to_string()),
            ConstraintKind::NonEmpty { measure_columns } => {
                key.push_list(measure_columns.iter().map(|c| c.to_string()).collect())
            }
        };

        key
    }
}

/// Join every table a predicate's columns live on into the query.
fn join_predicate_tables(builder: &mut SqlQueryBuilder, cube: &Cube, predicate: &Predicate) {
    let mut columns = Vec::new();
    predicate.collect_columns(&mut columns);
    for column in columns {
        crate::native::crossjoin::attach_table(builder, cube, &column.table, true);
    }
}

/// Build the ORDER BY entry for an order key.
///
/// Null placement: aggregates that can come back NULL over empty cells
/// sort NULLS LAST in both directions, so empty combinations never win a
/// Top/Bottom ranking.
fn directed(order: &OrderKey, ascending: bool) -> OrderByExpr {
    let mut entry = if ascending {
        OrderByExpr::asc(order.expr.clone())
    } else {
        OrderByExpr::desc(order.expr.clone())
    };
    if order.nullable {
        entry = entry.nulls_last();
    }
    entry
}

/// Compose this node's LIMIT/OFFSET with pagination already applied by an
/// enclosing node.
///
/// The builder runs child-before-parent, so any existing limit/offset
/// belongs to an *outer* function that must act on this node's output:
/// `new_offset = own_start + outer_offset` and the remaining row budget is
/// `own_count - outer_offset`, capped by the outer limit. A non-positive
/// budget forces `LIMIT 0` with no OFFSET - the statically-empty result.
fn compose_limit(builder: &mut SqlQueryBuilder, own_start: u64, own_count: Option<u64>) {
    let outer_limit = builder.limit();
    let outer_offset = builder.offset().unwrap_or(0);

    let new_offset = own_start + outer_offset;
    let new_limit: Option<i64> = match (own_count, outer_limit) {
        (Some(count), Some(limit)) => Some((limit as i64).min(count as i64 - outer_offset as i64)),
        (Some(count), None) => Some(count as i64 - outer_offset as i64),
        (None, Some(limit)) => Some(limit as i64),
        (None, None) => None,
    };

    match new_limit {
        Some(limit) if limit <= 0 => {
            builder.set_limit(0);
            builder.clear_offset();
        }
        Some(limit) => {
            builder.set_limit(limit as u64);
            if new_offset > 0 {
                builder.set_offset(new_offset);
            }
        }
        None => {
            if new_offset > 0 {
                builder.set_offset(new_offset);
            }
        }
    }
}
