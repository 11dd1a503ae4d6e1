//! Aggregate/Sum recognizer.
//!
//! `Aggregate(set)` and `Sum(set [, measure])` collapse to one SQL
//! aggregation over the compound predicate compiled from the set:
//!
//! - `Sum` always aggregates with SUM.
//! - 1-argument `Aggregate` takes the ambient measure's aggregator; only
//!   the COUNT/SUM family is supported, and COUNT degrades to its SUM
//!   rollup.
//! - 2-argument `Aggregate` takes the aggregator configured on the
//!   referenced stored measure; DISTINCT COUNT cannot be rolled up from
//!   partial cells and is rejected.

use tracing::debug;

use crate::error::NativeResult;
use crate::native::compound;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{
    ambient_measure, extract_tuples, resolve_stored_measure, NativeRecognizer, NativeRegistry,
};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::olap::schema::Aggregator;

/// Recognizer for Aggregate and Sum.
#[derive(Debug)]
pub struct AggregateRecognizer;

impl NativeRecognizer for AggregateRecognizer {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn try_native(
        &self,
        call: &MdxExpr,
        ctx: &mut EvaluatorContext,
        _registry: &NativeRegistry,
    ) -> NativeResult<Option<NativeEvaluator>> {
        let Some((name, args)) = call.as_fun_call() else {
            return Ok(None);
        };
        let is_sum = name.eq_ignore_ascii_case("Sum");
        if !is_sum && !name.eq_ignore_ascii_case("Aggregate") {
            return Ok(None);
        }
        if !ctx.config.enable_aggregate {
            debug!("aggregate rewrite disabled");
            return Ok(None);
        }
        if !(1..=2).contains(&args.len()) {
            return Ok(None);
        }

        // Resolve the measure being aggregated: the explicit second
        // argument, or the ambient measure context.
        let resolved = match args.get(1) {
            Some(measure_expr) => resolve_stored_measure(measure_expr, &ctx.cube),
            None => ambient_measure(ctx),
        };
        let Some((measure_name, measure_column, configured)) = resolved else {
            debug!("no stored measure to aggregate");
            return Ok(None);
        };

        let aggregator = if is_sum {
            Aggregator::Sum
        } else if args.len() == 1 {
            // Only COUNT/SUM-family aggregators compose under a bare
            // Aggregate; COUNT degrades to its SUM rollup.
            if !configured.is_sum_family() {
                debug!(aggregator = configured.display_name(), "not a SUM-family aggregator");
                return Ok(None);
            }
            configured.rollup()
        } else {
            if configured == Aggregator::DistinctCount {
                debug!("distinct-count cannot be aggregated natively");
                return Ok(None);
            }
            configured
        };

        let Some(tuples) = extract_tuples(&args[0]) else {
            debug!("aggregate argument is not an explicit tuple list");
            return Ok(None);
        };
        if tuples.len() > ctx.config.max_in_clause_size {
            debug!(count = tuples.len(), "tuple list exceeds the IN-list budget");
            return Ok(None);
        }

        // Hard failures in the tuple list surface here; an unsatisfiable
        // list is benign and simply leaves the aggregation unconstrained
        // by it.
        let compiled = compound::compile(&tuples, &ctx.cube)?;

        let kind = ConstraintKind::Aggregate {
            aggregator,
            measure_column,
            filter: compiled.predicate,
        };
        let constraint = SetConstraint::root(
            kind,
            Vec::new(),
            ctx.slicer.clone(),
            ctx.non_empty,
            ctx.role_restricted,
        );

        Ok(Some(
            NativeEvaluator::builder()
                .constraint(constraint)
                .bound_measure(Some(measure_name))
                .max_rows(1)
                .preserve_empty_rows(!ctx.non_empty)
                .build(),
        ))
    }
}
