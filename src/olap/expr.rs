//! MDX expression tree.
//!
//! The resolved form of an MDX set/scalar expression as handed over by the
//! parser. The native core never evaluates these trees in-memory; it only
//! inspects their shape, extracts literals, and expands calculated-member
//! formulas.

use std::collections::HashSet;
use std::sync::Arc;

use super::member::{Member, MemberTuple};
use super::schema::{Cube, Level, Measure};

/// A literal scalar in an MDX expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MdxValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// A resolved MDX expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MdxExpr {
    /// Function call: `TopCount(set, 5, measure)`.
    FunCall { name: String, args: Vec<MdxExpr> },

    /// `CrossJoin(left, right)`.
    CrossJoin(Box<MdxExpr>, Box<MdxExpr>),

    /// Explicit member set: `{[A], [B], [C]}`.
    MemberSet(Vec<Arc<Member>>),

    /// Explicit tuple set: `{([A], [X]), ([B], [Y])}`.
    TupleSet(Vec<MemberTuple>),

    /// `[Hierarchy].[Level].Members`.
    LevelMembers(Arc<Level>),

    /// A single member reference.
    MemberRef(Arc<Member>),

    /// A measure reference by name.
    MeasureRef(String),

    /// A literal scalar.
    Literal(MdxValue),
}

impl MdxExpr {
    /// Function-call constructor.
    pub fn call(name: &str, args: Vec<MdxExpr>) -> MdxExpr {
        MdxExpr::FunCall {
            name: name.into(),
            args,
        }
    }

    /// Literal integer, when this expression is one.
    ///
    /// Recognizers require count/start arguments to be compile-time
    /// literals; anything else rejects native evaluation.
    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            MdxExpr::Literal(MdxValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Literal boolean, when this expression is one.
    pub fn as_bool_literal(&self) -> Option<bool> {
        match self {
            MdxExpr::Literal(MdxValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The function-call view of this expression.
    pub fn as_fun_call(&self) -> Option<(&str, &[MdxExpr])> {
        match self {
            MdxExpr::FunCall { name, args } => Some((name.as_str(), args.as_slice())),
            _ => None,
        }
    }

    /// Collect every measure name referenced anywhere in this expression,
    /// expanding calculated measures and calculated members recursively.
    pub fn collect_measures(&self, cube: &Cube, out: &mut HashSet<String>) {
        self.collect_measures_inner(cube, out, &mut HashSet::new());
    }

    fn collect_measures_inner(
        &self,
        cube: &Cube,
        out: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
    ) {
        match self {
            MdxExpr::MeasureRef(name) => {
                out.insert(name.clone());
                if let Some(Measure::Calculated { formula, .. }) = cube.measure(name) {
                    if visiting.insert(name.clone()) {
                        formula.collect_measures_inner(cube, out, visiting);
                        visiting.remove(name);
                    }
                }
            }
            MdxExpr::MemberRef(member) => {
                if let Some(formula) = &member.formula {
                    formula.collect_measures_inner(cube, out, visiting);
                }
            }
            MdxExpr::FunCall { args, .. } => {
                for arg in args {
                    arg.collect_measures_inner(cube, out, visiting);
                }
            }
            MdxExpr::CrossJoin(left, right) => {
                left.collect_measures_inner(cube, out, visiting);
                right.collect_measures_inner(cube, out, visiting);
            }
            MdxExpr::MemberSet(_)
            | MdxExpr::TupleSet(_)
            | MdxExpr::LevelMembers(_)
            | MdxExpr::Literal(_) => {}
        }
    }

    /// Whether this expression, fully expanded through calculated-member
    /// formulas, reaches a stored measure.
    ///
    /// Drives join necessity: ordering or filtering on a stored measure
    /// requires the fact table.
    pub fn references_stored_measure(&self, cube: &Cube) -> bool {
        let mut measures = HashSet::new();
        self.collect_measures(cube, &mut measures);
        measures
            .iter()
            .any(|name| matches!(cube.measure(name), Some(Measure::Stored { .. })))
    }
}

impl std::fmt::Display for MdxExpr {
    /// Stable textual form.
    ///
    /// Cache keys compare order expressions by this text, so two
    /// structurally identical trees print identically regardless of
    /// instance identity.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MdxExpr::FunCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            MdxExpr::CrossJoin(left, right) => {
                write!(f, "CrossJoin({}, {})", left, right)
            }
            MdxExpr::MemberSet(members) => {
                write!(f, "{{")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", m.unique_name())?;
                }
                write!(f, "}}")
            }
            MdxExpr::TupleSet(tuples) => {
                write!(f, "{{")?;
                for (i, t) in tuples.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t.unique_name())?;
                }
                write!(f, "}}")
            }
            MdxExpr::LevelMembers(level) => {
                write!(f, "{}.Members", level.unique_name())
            }
            MdxExpr::MemberRef(member) => write!(f, "{}", member.unique_name()),
            MdxExpr::MeasureRef(name) => write!(f, "[Measures].[{}]", name),
            MdxExpr::Literal(v) => match v {
                MdxValue::Int(n) => write!(f, "{}", n),
                MdxValue::Float(x) => write!(f, "{}", x),
                MdxValue::Str(s) => write!(f, "\"{}\"", s),
                MdxValue::Bool(b) => write!(f, "{}", b),
            },
        }
    }
}
