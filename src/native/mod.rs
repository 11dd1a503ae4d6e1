//! Native evaluation core - rewriting MDX set/aggregate functions to SQL.
//!
//! Control flow: the interpreter hands a function call to
//! [`NativeRegistry::try_native`], which probes one recognizer per function
//! family in a fixed priority order. The first recognizer that accepts
//! builds CrossJoinArgs, a [`SetConstraint`] chain (wrapping a nested
//! native evaluator when argument 0 is itself native), and a cache key,
//! and returns a [`NativeEvaluator`]. A full miss returns `Ok(None)` and
//! the interpreter falls back to in-memory evaluation.
//!
//! Infeasibility is never an error. The only hard failure is an
//! unexpandable calculated member in a position where expansion is
//! structurally required; the registry maps it through the configured
//! severity before it reaches the caller.

pub mod aggregate;
pub mod cache_key;
pub mod compound;
pub mod constraint;
pub mod crossjoin;
pub mod evaluator;
pub mod except;
pub mod mask;
pub mod nonempty;
pub mod order;
pub mod predicate;
pub mod subset;
pub mod topcount;

pub use cache_key::{CacheKey, KeyField};
pub use compound::{compile as compile_compound, CompoundPredicate};
pub use constraint::{ConstraintKind, OrderKey, SetConstraint};
pub use crossjoin::{decompose, CrossJoinArg};
pub use evaluator::{NativeEvaluator, NativeEvaluatorBuilder};
pub use mask::ColumnMask;
pub use predicate::Predicate;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::config::CalcMemberSeverity;
use crate::error::{NativeError, NativeResult};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::olap::member::MemberTuple;
use crate::olap::schema::{Aggregator, Cube, Measure};
use crate::sql::expr::Expr;

/// One recognizer per MDX function family.
pub trait NativeRecognizer: std::fmt::Debug {
    /// Recognizer name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Attempt to build a native evaluator for `call`.
    ///
    /// `Ok(None)` means "not native" - a precondition failed and the
    /// caller falls back. `Err` is reserved for hard failures (see
    /// [`NativeError`]).
    fn try_native(
        &self,
        call: &MdxExpr,
        ctx: &mut EvaluatorContext,
        registry: &NativeRegistry,
    ) -> NativeResult<Option<NativeEvaluator>>;
}

/// Ordered set of recognizers the interpreter probes.
#[derive(Debug)]
pub struct NativeRegistry {
    recognizers: Vec<Box<dyn NativeRecognizer + Send + Sync>>,
}

impl NativeRegistry {
    /// The standard recognizer set, in priority order.
    pub fn standard() -> Self {
        Self {
            recognizers: vec![
                Box::new(topcount::TopCountRecognizer),
                Box::new(order::OrderRecognizer),
                Box::new(subset::SubsetRecognizer),
                Box::new(except::ExceptRecognizer),
                Box::new(aggregate::AggregateRecognizer),
                Box::new(nonempty::NonEmptyRecognizer),
            ],
        }
    }

    /// Probe recognizers in order; the first acceptance wins.
    pub fn try_native(
        &self,
        call: &MdxExpr,
        ctx: &mut EvaluatorContext,
    ) -> NativeResult<Option<NativeEvaluator>> {
        for recognizer in &self.recognizers {
            match recognizer.try_native(call, ctx, self) {
                Ok(Some(evaluator)) => {
                    debug!(recognizer = recognizer.name(), "accepted for native evaluation");
                    return Ok(Some(evaluator));
                }
                Ok(None) => continue,
                Err(err @ NativeError::UnsupportedCalculatedMember { .. }) => {
                    match ctx.config.unsupported_calc_member {
                        CalcMemberSeverity::Silent => {
                            debug!(%err, "degrading unsupported calculated member to non-native");
                            return Ok(None);
                        }
                        CalcMemberSeverity::Warn => {
                            warn!(%err, "native evaluation not supported, falling back");
                            return Ok(None);
                        }
                        CalcMemberSeverity::Error => return Err(err),
                    }
                }
            }
        }
        Ok(None)
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD_REGISTRY: Lazy<NativeRegistry> = Lazy::new(NativeRegistry::standard);

/// Shared instance of the standard registry.
pub fn standard_registry() -> &'static NativeRegistry {
    &STANDARD_REGISTRY
}

// =============================================================================
// Shared recognizer helpers
// =============================================================================

/// Probe the registry when argument 0 is itself a function call - the
/// nesting case. Non-calls are never native evaluators.
pub(crate) fn try_nested(
    arg0: &MdxExpr,
    ctx: &mut EvaluatorContext,
    registry: &NativeRegistry,
) -> NativeResult<Option<NativeEvaluator>> {
    match arg0 {
        MdxExpr::FunCall { .. } => registry.try_native(arg0, ctx),
        _ => Ok(None),
    }
}

/// Resolve an order/filter expression to its SQL form and metadata.
///
/// Only expressions that resolve (possibly through simple calculated
/// measure chains) to a single stored measure are supported; anything else
/// rejects native evaluation.
pub(crate) fn resolve_order_key(expr: &MdxExpr, cube: &Cube) -> Option<constraint::OrderKey> {
    let (sql_expr, aggregator) = resolve_measure_expr(expr, cube, 0)?;
    Some(constraint::OrderKey {
        expr: sql_expr,
        text: expr.to_string(),
        nullable: aggregator.returns_null_on_empty(),
        needs_fact: expr.references_stored_measure(cube),
    })
}

/// The stored measure a scalar expression bottoms out at, if any.
pub(crate) fn resolve_measure_expr(
    expr: &MdxExpr,
    cube: &Cube,
    depth: usize,
) -> Option<(Expr, Aggregator)> {
    // Calculated-measure chains deeper than this are degenerate.
    const MAX_DEPTH: usize = 16;
    if depth > MAX_DEPTH {
        return None;
    }

    match expr {
        MdxExpr::MeasureRef(name) => match cube.measure(name)? {
            Measure::Stored {
                column, aggregator, ..
            } => Some((aggregator.apply(column.to_expr()), *aggregator)),
            Measure::Calculated { formula, .. } => {
                resolve_measure_expr(formula, cube, depth + 1)
            }
        },
        MdxExpr::MemberRef(member) => {
            let formula = member.formula.as_ref()?;
            resolve_measure_expr(formula, cube, depth + 1)
        }
        _ => None,
    }
}

/// Follow an expression to the single stored measure it denotes, through
/// simple calculated-measure chains.
pub(crate) fn resolve_stored_measure(
    expr: &MdxExpr,
    cube: &Cube,
) -> Option<(String, crate::olap::schema::ColumnRef, Aggregator)> {
    const MAX_DEPTH: usize = 16;

    fn resolve_name(
        name: &str,
        cube: &Cube,
        depth: usize,
    ) -> Option<(String, crate::olap::schema::ColumnRef, Aggregator)> {
        if depth > MAX_DEPTH {
            return None;
        }
        match cube.measure(name)? {
            Measure::Stored {
                name,
                column,
                aggregator,
            } => Some((name.clone(), column.clone(), *aggregator)),
            Measure::Calculated { formula, .. } => match formula {
                MdxExpr::MeasureRef(inner) => resolve_name(inner, cube, depth + 1),
                _ => None,
            },
        }
    }

    match expr {
        MdxExpr::MeasureRef(name) => resolve_name(name, cube, 0),
        MdxExpr::MemberRef(member) => match member.formula.as_ref()? {
            MdxExpr::MeasureRef(name) => resolve_name(name, cube, 0),
            _ => None,
        },
        _ => None,
    }
}

/// The stored measure of the ambient measure context, if one is set.
pub(crate) fn ambient_measure(
    ctx: &EvaluatorContext,
) -> Option<(String, crate::olap::schema::ColumnRef, Aggregator)> {
    let member = ctx.current_member("[Measures]")?.clone();
    resolve_stored_measure(&MdxExpr::MeasureRef(member.name.clone()), &ctx.cube)
}

/// Extract an explicit tuple list from a set expression, for predicates
/// over enumerated members (Except exclusions, Aggregate arguments).
pub(crate) fn extract_tuples(expr: &MdxExpr) -> Option<Vec<MemberTuple>> {
    match expr {
        MdxExpr::MemberRef(member) => Some(vec![MemberTuple::from(member.clone())]),
        MdxExpr::MemberSet(members) => {
            if members.is_empty() {
                return None;
            }
            Some(
                members
                    .iter()
                    .map(|m| MemberTuple::from(m.clone()))
                    .collect(),
            )
        }
        MdxExpr::TupleSet(tuples) => {
            if tuples.is_empty() {
                return None;
            }
            Some(tuples.clone())
        }
        _ => None,
    }
}
