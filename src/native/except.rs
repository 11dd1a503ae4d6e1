//! Except recognizer.
//!
//! `Except(set, exclusions)` ANDs a "not in the exclusion tuple list"
//! predicate onto the base set's constraint. The exclusion predicate is
//! compiled by the compound predicate compiler, so ancestor columns and
//! cross-product collapse apply to it exactly as they do to slicers.

use tracing::debug;

use crate::error::NativeResult;
use crate::native::compound;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::crossjoin::{decompose, CrossJoinArg};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{extract_tuples, try_nested, NativeRecognizer, NativeRegistry};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::sql::SqlDialect;

/// Recognizer for Except.
#[derive(Debug)]
pub struct ExceptRecognizer;

impl NativeRecognizer for ExceptRecognizer {
    fn name(&self) -> &'static str {
        "except"
    }

    fn try_native(
        &self,
        call: &MdxExpr,
        ctx: &mut EvaluatorContext,
        registry: &NativeRegistry,
    ) -> NativeResult<Option<NativeEvaluator>> {
        let Some((name, args)) = call.as_fun_call() else {
            return Ok(None);
        };
        if !name.eq_ignore_ascii_case("Except") {
            return Ok(None);
        }
        if !ctx.config.enable_except {
            debug!("except rewrite disabled");
            return Ok(None);
        }
        if args.len() != 2 {
            return Ok(None);
        }
        if !ctx.dialect.supports_multi_value_in() {
            debug!(dialect = ctx.dialect.name(), "no multi-value IN support");
            return Ok(None);
        }

        let Some(exclusions) = extract_tuples(&args[1]) else {
            debug!("exclusion set is not an explicit tuple list");
            return Ok(None);
        };
        if exclusions.len() > ctx.config.max_in_clause_size {
            debug!(
                count = exclusions.len(),
                "exclusion list exceeds the IN-list budget"
            );
            return Ok(None);
        }

        // Validate the exclusions now: an unexpandable calculated member is
        // a hard failure, and it must surface at recognition time rather
        // than when the SQL is rendered.
        compound::compile(&exclusions, &ctx.cube)?;

        let kind = ConstraintKind::Except { exclusions };

        if let Some(inner) = try_nested(&args[0], ctx, registry)? {
            let (return_args, inner_constraint) = inner.into_parts();
            let constraint = SetConstraint::wrapping(
                kind,
                ctx.slicer.clone(),
                ctx.non_empty,
                ctx.role_restricted,
                inner_constraint,
            );
            return Ok(Some(
                NativeEvaluator::builder()
                    .return_args(return_args)
                    .constraint(constraint)
                    .preserve_empty_rows(!ctx.non_empty)
                    .build(),
            ));
        }

        let Some(cj_args) = decompose(&args[0], &ctx.cube, false) else {
            return Ok(None);
        };
        let return_args: Vec<CrossJoinArg> = cj_args
            .iter()
            .filter(|a| matches!(a, CrossJoinArg::Level { .. }))
            .cloned()
            .collect();
        let constraint = SetConstraint::root(
            kind,
            cj_args,
            ctx.slicer.clone(),
            ctx.non_empty,
            ctx.role_restricted,
        );

        Ok(Some(
            NativeEvaluator::builder()
                .return_args(return_args)
                .constraint(constraint)
                .preserve_empty_rows(!ctx.non_empty)
                .build(),
        ))
    }
}
