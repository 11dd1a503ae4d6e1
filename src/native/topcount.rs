//! TopCount/BottomCount recognizer.
//!
//! `TopCount(set, n, expr)` becomes `ORDER BY expr DESC ... LIMIT n` over
//! the decomposed set; BottomCount sorts ascending. The 3-argument form
//! joins the fact table so the ranking sees real cell values; the
//! 2-argument form ranks on the axis column itself and is only accepted
//! over a single-dimension set - joining several dimensions through the
//! fact table without an explicit order column would silently drop empty
//! combinations.

use std::collections::HashSet;

use tracing::debug;

use crate::error::NativeResult;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::crossjoin::{decompose, CrossJoinArg};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{resolve_order_key, try_nested, NativeRecognizer, NativeRegistry};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::sql::SqlDialect;

/// Recognizer for TopCount and BottomCount.
#[derive(Debug)]
pub struct TopCountRecognizer;

impl NativeRecognizer for TopCountRecognizer {
    fn name(&self) -> &'static str {
        "topcount"
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
        let ascending = if name.eq_ignore_ascii_case("TopCount") {
            false
        } else if name.eq_ignore_ascii_case("BottomCount") {
            true
        } else {
            return Ok(None);
        };

        if !ctx.config.enable_top_count {
            debug!("topcount rewrite disabled");
            return Ok(None);
        }
        if !(2..=3).contains(&args.len()) {
            return Ok(None);
        }
        if !ctx.dialect.supports_limit_and_offset() {
            debug!(dialect = ctx.dialect.name(), "no LIMIT/OFFSET support");
            return Ok(None);
        }

        let Some(count) = args[1].as_int_literal() else {
            debug!("count argument is not a literal");
            return Ok(None);
        };
        if count < 0 {
            return Ok(None);
        }
        let count = count as u64;

        let order = if args.len() == 3 {
            match resolve_order_key(&args[2], &ctx.cube) {
                Some(order) => Some(order),
                None => {
                    debug!("order expression does not resolve to a stored measure");
                    return Ok(None);
                }
            }
        } else {
            None
        };

        let bound_measure = args.get(2).map(|e| first_measure(e, ctx));
        let kind = ConstraintKind::TopCount {
            count,
            ascending,
            order,
        };

        // Nesting: reuse the inner evaluator's CrossJoinArgs and wrap its
        // constraint instead of re-decomposing.
        if let Some(inner) = try_nested(&args[0], ctx, registry)? {
            if matches!(kind, ConstraintKind::TopCount { order: None, .. })
                && inner.return_args().len() != 1
            {
                debug!("2-argument form over a multi-dimension set");
                return Ok(None);
            }
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
                    .bound_measure(bound_measure.flatten())
                    .max_rows(count)
                    .preserve_empty_rows(!ctx.non_empty)
                    .build(),
            ));
        }

        let Some(cj_args) = decompose(&args[0], &ctx.cube, false) else {
            return Ok(None);
        };
        let axis_count = cj_args
            .iter()
            .filter(|a| matches!(a, CrossJoinArg::Level { .. }))
            .count();
        if args.len() == 2 && axis_count != 1 {
            debug!("2-argument form over a multi-dimension set");
            return Ok(None);
        }

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
                .bound_measure(bound_measure.flatten())
                .max_rows(count)
                .preserve_empty_rows(!ctx.non_empty)
                .build(),
        ))
    }
}

/// First measure name an expression references, in name order.
fn first_measure(expr: &MdxExpr, ctx: &EvaluatorContext) -> Option<String> {
    let mut measures = HashSet::new();
    expr.collect_measures(&ctx.cube, &mut measures);
    let mut names: Vec<String> = measures.into_iter().collect();
    names.sort();
    names.into_iter().next()
}
