//! Order recognizer.
//!
//! `Order(set, expr [, ASC|DESC|BASC|BDESC])` becomes an ORDER BY over the
//! decomposed set. The "B"-prefixed flags break the hierarchy and sort the
//! flattened set; the hierarchical flags are only accepted when every axis
//! level sits directly under the hierarchy root, since a deeper parent
//! chain cannot be reproduced by a flat ORDER BY.

use tracing::debug;

use crate::error::NativeResult;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::crossjoin::{decompose, CrossJoinArg};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{resolve_order_key, try_nested, NativeRecognizer, NativeRegistry};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::{MdxExpr, MdxValue};

/// Sort flag of the third argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortFlag {
    ascending: bool,
    hierarchical: bool,
}

fn parse_flag(expr: Option<&MdxExpr>) -> Option<SortFlag> {
    let Some(expr) = expr else {
        // Order defaults to hierarchical ascending.
        return Some(SortFlag {
            ascending: true,
            hierarchical: true,
        });
    };
    let MdxExpr::Literal(MdxValue::Str(flag)) = expr else {
        return None;
    };
    match flag.to_ascii_uppercase().as_str() {
        "ASC" => Some(SortFlag {
            ascending: true,
            hierarchical: true,
        }),
        "DESC" => Some(SortFlag {
            ascending: false,
            hierarchical: true,
        }),
        "BASC" => Some(SortFlag {
            ascending: true,
            hierarchical: false,
        }),
        "BDESC" => Some(SortFlag {
            ascending: false,
            hierarchical: false,
        }),
        _ => None,
    }
}

/// Recognizer for Order.
#[derive(Debug)]
pub struct OrderRecognizer;

impl NativeRecognizer for OrderRecognizer {
    fn name(&self) -> &'static str {
        "order"
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
        if !name.eq_ignore_ascii_case("Order") {
            return Ok(None);
        }
        if !ctx.config.enable_order {
            debug!("order rewrite disabled");
            return Ok(None);
        }
        if !(2..=3).contains(&args.len()) {
            return Ok(None);
        }

        let Some(flag) = parse_flag(args.get(2)) else {
            debug!("sort flag is not a literal");
            return Ok(None);
        };

        let Some(order) = resolve_order_key(&args[1], &ctx.cube) else {
            debug!("order expression does not resolve to a stored measure");
            return Ok(None);
        };

        let kind = ConstraintKind::Order {
            order,
            ascending: flag.ascending,
        };

        if let Some(inner) = try_nested(&args[0], ctx, registry)? {
            if flag.hierarchical && !levels_sit_under_root(inner.return_args(), &ctx.cube) {
                debug!("hierarchical ordering over a deep level");
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
                    .preserve_empty_rows(!ctx.non_empty)
                    .build(),
            ));
        }

        let Some(cj_args) = decompose(&args[0], &ctx.cube, false) else {
            return Ok(None);
        };
        if flag.hierarchical && !levels_sit_under_root(&cj_args, &ctx.cube) {
            debug!("hierarchical ordering over a deep level");
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
                .preserve_empty_rows(!ctx.non_empty)
                .build(),
        ))
    }
}

/// Hierarchical ordering needs every axis level directly under the
/// hierarchy root: any level with a non-"all" parent cannot be ordered
/// natively.
fn levels_sit_under_root(args: &[CrossJoinArg], cube: &crate::olap::schema::Cube) -> bool {
    args.iter().filter_map(|a| a.level()).all(|level| {
        match cube.parent_level(level) {
            Some(parent) => parent.is_all,
            // Hierarchy not registered: fall back to the level's depth.
            None => level.depth <= 1,
        }
    })
}
