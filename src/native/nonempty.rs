//! NonEmpty recognizer.
//!
//! `NonEmpty(set [, measures])` restricts the set to combinations with
//! data: the fact table is joined and rows where every bound measure is
//! NULL are filtered out. Measures are taken from the second argument when
//! present (expanding calculated measures recursively); a second argument
//! that yields no usable measures degrades to the 1-argument form, which
//! binds the ambient measure.
//!
//! A referenced measure must resolve against the base star of the first
//! argument; a measure whose column the star does not carry belongs to an
//! unrelated cube and is safely ignored.

use std::collections::HashSet;

use tracing::debug;

use crate::error::NativeResult;
use crate::native::constraint::{ConstraintKind, SetConstraint};
use crate::native::crossjoin::{decompose, CrossJoinArg};
use crate::native::evaluator::NativeEvaluator;
use crate::native::{ambient_measure, try_nested, NativeRecognizer, NativeRegistry};
use crate::olap::context::EvaluatorContext;
use crate::olap::expr::MdxExpr;
use crate::olap::schema::{ColumnRef, Cube, Measure};

/// Recognizer for NonEmpty.
#[derive(Debug)]
pub struct NonEmptyRecognizer;

impl NativeRecognizer for NonEmptyRecognizer {
    fn name(&self) -> &'static str {
        "nonempty"
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
        if !name.eq_ignore_ascii_case("NonEmpty") {
            return Ok(None);
        }
        if !ctx.config.enable_non_empty {
            debug!("nonempty rewrite disabled");
            return Ok(None);
        }
        if !(1..=2).contains(&args.len()) {
            return Ok(None);
        }

        let measure_columns = match args.get(1) {
            Some(measures_expr) => {
                let columns = bound_measure_columns(measures_expr, &ctx.cube);
                if columns.is_empty() {
                    // Degrade to the 1-argument form.
                    ambient_columns(ctx)
                } else {
                    columns
                }
            }
            None => ambient_columns(ctx),
        };
        if measure_columns.is_empty() {
            debug!("no measure to test for data");
            return Ok(None);
        }

        let kind = ConstraintKind::NonEmpty {
            measure_columns,
        };

        // The wrapped set is probed in non-empty mode; the guard rolls the
        // override back on every exit path.
        let mut ctx = ctx.guard();
        ctx.non_empty = true;

        if let Some(inner) = try_nested(&args[0], &mut ctx, registry)? {
            let (return_args, inner_constraint) = inner.into_parts();
            let constraint = SetConstraint::wrapping(
                kind,
                ctx.slicer.clone(),
                true,
                ctx.role_restricted,
                inner_constraint,
            );
            return Ok(Some(
                NativeEvaluator::builder()
                    .return_args(return_args)
                    .constraint(constraint)
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
            true,
            ctx.role_restricted,
        );

        Ok(Some(
            NativeEvaluator::builder()
                .return_args(return_args)
                .constraint(constraint)
                .build(),
        ))
    }
}

/// Stored-measure columns referenced by the measures argument, expanded
/// through calculated measures, restricted to columns the base star
/// actually carries.
fn bound_measure_columns(expr: &MdxExpr, cube: &Cube) -> Vec<ColumnRef> {
    let mut names = HashSet::new();
    expr.collect_measures(cube, &mut names);

    let mut sorted: Vec<String> = names.into_iter().collect();
    sorted.sort();

    let mut columns = Vec::new();
    for name in sorted {
        match cube.measure(&name) {
            Some(Measure::Stored { column, .. }) => {
                if column.table == cube.star.fact_table {
                    if !columns.contains(column) {
                        columns.push(column.clone());
                    }
                } else {
                    debug!(measure = %name, "measure belongs to an unrelated star, ignored");
                }
            }
            Some(Measure::Calculated { .. }) => {
                // Already expanded by collect_measures.
            }
            None => {
                debug!(measure = %name, "unknown measure, ignored as unrelated");
            }
        }
    }
    columns
}

fn ambient_columns(ctx: &EvaluatorContext) -> Vec<ColumnRef> {
    ambient_measure(ctx)
        .map(|(_, column, _)| vec![column])
        .unwrap_or_default()
}
