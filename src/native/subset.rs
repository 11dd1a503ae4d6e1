//! Subset recognizer.
//!
//! `Subset(set, start [, count])` is a pure OFFSET/LIMIT wrapper. When it
//! wraps another native constraint that already carries a LIMIT, the
//! composed limit is recomputed from the remaining row budget and clamps
//! to an always-empty `LIMIT 0` when the budget is exhausted (see
//! `constraint::compose_limit`).

use tracing::debug;

use crate::error::NativeResult;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::crossjoin::{decompose, CrossJoinArg};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{try_nested, NativeRecognizer, NativeRegistry};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::sql::SqlDialect;

/// Recognizer for Subset.
#[derive(Debug)]
pub struct SubsetRecognizer;

impl NativeRecognizer for SubsetRecognizer {
    fn name(&self) -> &'static str {
        "subset"
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
        if !name.eq_ignore_ascii_case("Subset") {
            return Ok(None);
        }
        if !ctx.config.enable_subset {
            debug!("subset rewrite disabled");
            return Ok(None);
        }
        if !(2..=3).contains(&args.len()) {
            return Ok(None);
        }
        if !ctx.dialect.supports_limit_and_offset() {
            debug!(dialect = ctx.dialect.name(), "no LIMIT/OFFSET support");
            return Ok(None);
        }

        let Some(start) = args[1].as_int_literal() else {
            debug!("start argument is not a literal");
            return Ok(None);
        };
        if start < 0 {
            return Ok(None);
        }

        let count = match args.get(2) {
            Some(expr) => match expr.as_int_literal() {
                Some(count) if count >= 0 => Some(count as u64),
                _ => {
                    debug!("count argument is not a non-negative literal");
                    return Ok(None);
                }
            },
            None => None,
        };

        let kind = ConstraintKind::Subset {
            start: start as u64,
            count,
        };

        if let Some(inner) = try_nested(&args[0], ctx, registry)? {
            let (return_args, inner_constraint) = inner.into_parts();
            let constraint = SetConstraint::wrapping(
                kind,
                ctx.slicer.clone(),
                ctx.non_empty,
                ctx.role_restricted,
                inner_constraint,
            );
            let mut builder = NativeEvaluator::builder()
                .return_args(return_args)
                .constraint(constraint)
                .preserve_empty_rows(!ctx.non_empty);
            if let Some(count) = count {
                builder = builder.max_rows(count);
            }
            return Ok(Some(builder.build()));
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

        let mut builder = NativeEvaluator::builder()
            .return_args(return_args)
            .constraint(constraint)
            .preserve_empty_rows(!ctx.non_empty);
        if let Some(count) = count {
            builder = builder.max_rows(count);
        }
        Ok(Some(builder.build()))
    }
}
