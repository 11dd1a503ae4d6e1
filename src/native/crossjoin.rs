//! CrossJoinArg decomposition.
//!
//! Splits an MDX set expression into per-dimension axis arguments, each of
//! which knows how to contribute its own SELECT/WHERE/GROUP BY fragment.
//! Decomposition is a feasibility gate: an unsupported shape returns `None`
//! and the caller falls back to interpreted evaluation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::NativeResult;
use crate::native::compound;
use crate::olap::expr::MdxExpr;
use crate::olap::member::{Member, MemberTuple};
use crate::olap::schema::{Cube, Level};
use crate::sql::builder::{SelectExpr, SqlQueryBuilder, TableRef};

/// One dimension-level axis of a native set.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossJoinArg {
    /// All members of a level, optionally restricted to a fixed list.
    Level {
        level: Arc<Level>,
        members: Option<Vec<Arc<Member>>>,
    },

    /// Predicate-only member list: constrains the query without appearing
    /// in the result set (e.g. a slicer crossjoin contribution).
    MemberList { members: Vec<Arc<Member>> },
}

impl CrossJoinArg {
    /// The axis level, for args that carry one.
    pub fn level(&self) -> Option<&Arc<Level>> {
        match self {
            CrossJoinArg::Level { level, .. } => Some(level),
            CrossJoinArg::MemberList { .. } => None,
        }
    }

    /// Fixed member list, if this arg has one.
    pub fn members(&self) -> Option<&[Arc<Member>]> {
        match self {
            CrossJoinArg::Level { members, .. } => members.as_deref(),
            CrossJoinArg::MemberList { members } => Some(members),
        }
    }

    /// Stable value form for cache keys.
    pub fn key_form(&self) -> String {
        match self {
            CrossJoinArg::Level { level, members } => {
                let mut s = format!("level:{}", level.unique_name());
                if let Some(members) = members {
                    let names: Vec<String> =
                        members.iter().map(|m| m.unique_name()).collect();
                    s.push_str(&format!(":{{{}}}", names.join(",")));
                }
                s
            }
            CrossJoinArg::MemberList { members } => {
                let names: Vec<String> = members.iter().map(|m| m.unique_name()).collect();
                format!("members:{{{}}}", names.join(","))
            }
        }
    }

    /// Emit this arg's SQL contribution.
    ///
    /// `join_to_fact` decides the query shape: with a fact join the axis
    /// table is INNER JOINed and grouped; without one the axis table is
    /// the FROM table of a SELECT DISTINCT.
    pub fn contribute(
        &self,
        builder: &mut SqlQueryBuilder,
        cube: &Cube,
        join_to_fact: bool,
    ) -> NativeResult<()> {
        match self {
            CrossJoinArg::Level { level, members } => {
                let star_column = match cube.resolve_level(level) {
                    Some(c) => c,
                    // Decomposition already validated the level; an
                    // unresolvable one here means the arg is predicate-only
                    // for an unrelated star and contributes nothing.
                    None => return Ok(()),
                };
                let column_expr = star_column.column.to_expr();

                attach_table(builder, cube, &star_column.column.table, join_to_fact);
                builder.add_select(SelectExpr::new(column_expr.clone()));
                if join_to_fact {
                    builder.add_group_by(column_expr.clone());
                }

                if let Some(members) = members {
                    self.add_member_predicate(builder, cube, members)?;
                }
            }
            CrossJoinArg::MemberList { members } => {
                self.add_member_predicate(builder, cube, members)?;
            }
        }
        Ok(())
    }

    fn add_member_predicate(
        &self,
        builder: &mut SqlQueryBuilder,
        cube: &Cube,
        members: &[Arc<Member>],
    ) -> NativeResult<()> {
        let tuples: Vec<MemberTuple> = members
            .iter()
            .map(|m| MemberTuple::from(Arc::clone(m)))
            .collect();
        let compiled = compound::compile(&tuples, cube)?;
        if let Some(predicate) = compiled.predicate {
            builder.add_where(predicate.to_expr());
        }
        Ok(())
    }
}

/// Wire a dimension table into the query: joined to the fact table, or as
/// the FROM table when no fact join is needed.
pub(crate) fn attach_table(
    builder: &mut SqlQueryBuilder,
    cube: &Cube,
    table: &str,
    join_to_fact: bool,
) {
    use crate::sql::expr::{table_col, ExprExt};

    if table == cube.star.fact_table {
        return;
    }

    if join_to_fact {
        if let Some(join) = cube.star.join_for(table) {
            let on = table_col(&cube.star.fact_table, &join.fact_fk)
                .eq(table_col(&join.table, &join.pk));
            builder.add_join(TableRef::new(&join.table), on);
        }
    } else if !builder.has_from() {
        let mut table_ref = TableRef::new(table);
        if let Some(schema) = &cube.star.schema {
            table_ref = table_ref.with_schema(schema);
        }
        builder.from(table_ref);
    }
}

/// Decompose a set expression into CrossJoinArgs.
///
/// Returns `None` for unsupported shapes: empty sets, mixed-level member
/// lists, calculated members (unless tolerated), level references that do
/// not resolve against the cube, and tuple sets that are not full
/// cross-products.
pub fn decompose(
    expr: &MdxExpr,
    cube: &Cube,
    allow_calc_members: bool,
) -> Option<Vec<CrossJoinArg>> {
    let mut args = Vec::new();
    if !decompose_into(expr, cube, allow_calc_members, &mut args) {
        return None;
    }
    if args.is_empty() {
        return None;
    }
    Some(args)
}

fn decompose_into(
    expr: &MdxExpr,
    cube: &Cube,
    allow_calc_members: bool,
    out: &mut Vec<CrossJoinArg>,
) -> bool {
    match expr {
        MdxExpr::CrossJoin(left, right) => {
            decompose_into(left, cube, allow_calc_members, out)
                && decompose_into(right, cube, allow_calc_members, out)
        }

        MdxExpr::LevelMembers(level) => {
            if level.is_all || cube.resolve_level(level).is_none() {
                debug!(level = %level.unique_name(), "level not native-evaluable");
                return false;
            }
            out.push(CrossJoinArg::Level {
                level: Arc::clone(level),
                members: None,
            });
            true
        }

        MdxExpr::MemberRef(member) => {
            member_list_arg(std::slice::from_ref(member), cube, allow_calc_members, out)
        }

        MdxExpr::MemberSet(members) => {
            if members.is_empty() {
                return false;
            }
            member_list_arg(members, cube, allow_calc_members, out)
        }

        MdxExpr::TupleSet(tuples) => decompose_tuple_set(tuples, cube, allow_calc_members, out),

        // Nested function calls are the recognizers' business, and scalars
        // are not sets.
        MdxExpr::FunCall { .. } | MdxExpr::MeasureRef(_) | MdxExpr::Literal(_) => false,
    }
}

/// A homogeneous member list becomes one Level arg with a fixed list.
fn member_list_arg(
    members: &[Arc<Member>],
    cube: &Cube,
    allow_calc_members: bool,
    out: &mut Vec<CrossJoinArg>,
) -> bool {
    let first = match members.first() {
        Some(m) => m,
        None => return false,
    };

    if !allow_calc_members && members.iter().any(|m| m.is_calculated()) {
        debug!("member list contains calculated members");
        return false;
    }
    if members.iter().any(|m| m.level != first.level) {
        debug!("member list spans multiple levels");
        return false;
    }
    if first.is_all() {
        return false;
    }
    if cube.resolve_level(&first.level).is_none() {
        return false;
    }

    out.push(CrossJoinArg::Level {
        level: Arc::clone(&first.level),
        members: Some(members.to_vec()),
    });
    true
}

/// A tuple set decomposes into independent axes only when it forms a full
/// cross-product over its positions; anything else would change the tuple
/// set when the axes are recombined.
fn decompose_tuple_set(
    tuples: &[MemberTuple],
    cube: &Cube,
    allow_calc_members: bool,
    out: &mut Vec<CrossJoinArg>,
) -> bool {
    let first = match tuples.first() {
        Some(t) => t,
        None => return false,
    };
    let arity = first.members().len();
    if tuples.iter().any(|t| t.members().len() != arity) {
        return false;
    }

    // Distinct members per position, insertion-ordered.
    let mut per_position: Vec<Vec<Arc<Member>>> = vec![Vec::new(); arity];
    let mut distinct: BTreeMap<Vec<String>, ()> = BTreeMap::new();
    for tuple in tuples {
        let names: Vec<String> = tuple.members().iter().map(|m| m.unique_name()).collect();
        distinct.insert(names, ());
        for (i, member) in tuple.members().iter().enumerate() {
            if !per_position[i].contains(member) {
                per_position[i].push(Arc::clone(member));
            }
        }
    }

    let product: usize = per_position.iter().map(|p| p.len()).product();
    if product != distinct.len() {
        debug!("tuple set is not a full cross-product");
        return false;
    }

    for members in per_position {
        if !member_list_arg(&members, cube, allow_calc_members, out) {
            return false;
        }
    }
    true
}
