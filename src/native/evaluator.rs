//! Native evaluator - the handle a successful recognition returns.
//!
//! The interpreter treats a `NativeEvaluator` as a complete evaluation
//! strategy: it exposes the return CrossJoinArgs, the constraint chain, the
//! row bound, and the padding policy. Evaluators are assembled through
//! [`NativeEvaluatorBuilder`]; when an enclosing recognizer discovers
//! nesting, it takes the inner evaluator apart with [`NativeEvaluator::into_parts`]
//! and finalizes a new one with the wrapped chain, instead of mutating a
//! live evaluator in place.

use crate::error::NativeResult;
use crate::native::cache_key::CacheKey;
use crate::native::constraint::SetConstraint;
use crate::native::crossjoin::CrossJoinArg;
use crate::olap::schema::Cube;
use crate::sql::builder::SqlQueryBuilder;
use crate::sql::Dialect;

/// A bound native evaluation of one MDX set/aggregate function.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvaluator {
    return_args: Vec<CrossJoinArg>,
    constraint: SetConstraint,
    bound_measure: Option<String>,
    max_rows: Option<u64>,
    preserve_empty_rows: bool,
}

impl NativeEvaluator {
    /// Start building an evaluator.
    pub fn builder() -> NativeEvaluatorBuilder {
        NativeEvaluatorBuilder::default()
    }

    /// The axis args that appear in the result set.
    pub fn return_args(&self) -> &[CrossJoinArg] {
        &self.return_args
    }

    pub fn constraint(&self) -> &SetConstraint {
        &self.constraint
    }

    /// Measure bound for ordering or aggregation, if the function has one.
    pub fn bound_measure(&self) -> Option<&str> {
        self.bound_measure.as_deref()
    }

    /// Row bound hint (e.g. TopCount's count).
    pub fn max_rows(&self) -> Option<u64> {
        self.max_rows
    }

    /// When true, the consumer pads missing combinations with empty rows
    /// instead of dropping them (non-empty mode was off at recognition).
    pub fn preserve_empty_rows(&self) -> bool {
        self.preserve_empty_rows
    }

    /// The constraint chain's structural cache key.
    pub fn cache_key(&self) -> CacheKey {
        self.constraint.cache_key()
    }

    /// Render the constrained SQL statement.
    pub fn to_sql(&self, cube: &Cube, dialect: Dialect) -> NativeResult<String> {
        let mut builder = SqlQueryBuilder::new();
        self.constraint.apply(&mut builder, cube)?;
        Ok(builder.to_sql(dialect))
    }

    /// Take the evaluator apart for rewrapping by an enclosing recognizer.
    pub fn into_parts(self) -> (Vec<CrossJoinArg>, SetConstraint) {
        (self.return_args, self.constraint)
    }
}

/// Two-phase builder for [`NativeEvaluator`].
#[derive(Debug, Default)]
pub struct NativeEvaluatorBuilder {
    return_args: Vec<CrossJoinArg>,
    constraint: Option<SetConstraint>,
    bound_measure: Option<String>,
    max_rows: Option<u64>,
    preserve_empty_rows: bool,
}

impl NativeEvaluatorBuilder {
    pub fn return_args(mut self, args: Vec<CrossJoinArg>) -> Self {
        self.return_args = args;
        self
    }

    pub fn constraint(mut self, constraint: SetConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn bound_measure(mut self, measure: Option<String>) -> Self {
        self.bound_measure = measure;
        self
    }

    pub fn max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn preserve_empty_rows(mut self, preserve: bool) -> Self {
        self.preserve_empty_rows = preserve;
        self
    }

    /// Finalize. Panics if no constraint was provided - recognizers always
    /// attach one before building.
    pub fn build(self) -> NativeEvaluator {
        NativeEvaluator {
            return_args: self.return_args,
            constraint: self.constraint.expect("evaluator built without a constraint"),
            bound_measure: self.bound_measure,
            max_rows: self.max_rows,
            preserve_empty_rows: self.preserve_empty_rows,
        }
    }
}
