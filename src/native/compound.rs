//! Compound predicate compilation.
//!
//! Turns a list of member tuples (a compound slicer, an Aggregate argument,
//! an Except exclusion set) into a minimal predicate tree plus the column
//! mask it constrains.
//!
//! The algorithm:
//!
//! 1. Walk each member's parent chain, resolving every non-"all" level to
//!    its physical column, stopping once a level with unique members is
//!    reached (ancestor columns are redundant past that point). A level
//!    whose column is missing from the target star makes the whole tuple
//!    unsatisfiable.
//! 2. Group satisfiable tuples by the resulting column mask.
//! 3. Per group, build one AND clause per tuple and OR them together.
//! 4. When a group is a full cross-product over its columns (the product
//!    of per-column distinct value counts equals the group's distinct row
//!    count), collapse the OR-of-ANDs into a single AND of per-column IN
//!    lists. The check is exact, so the collapse never changes the tuple
//!    set.
//! 5. OR all groups together; the union mask is reported for join
//!    necessity and aggregate-table matching.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{NativeError, NativeResult};
use crate::native::mask::ColumnMask;
use crate::native::predicate::Predicate;
use crate::olap::expr::MdxExpr;
use crate::olap::member::{Member, MemberKey, MemberTuple};
use crate::olap::schema::{ColumnRef, Cube};

/// Result of compiling a tuple list against a star.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundPredicate {
    /// The compiled predicate; `None` when nothing is satisfiable.
    pub predicate: Option<Predicate>,
    /// Union of the columns constrained by all groups.
    pub column_mask: ColumnMask,
    /// False when every input tuple failed to resolve against the star.
    /// The caller must not apply the (absent) predicate in that case.
    pub satisfiable: bool,
    /// Tuple count per mask group, in mask order.
    pub group_sizes: Vec<usize>,
    /// Tuples that reference levels absent from the target star.
    pub unsatisfiable_count: usize,
}

/// One column equality produced by the ancestry walk.
#[derive(Debug, Clone, PartialEq)]
struct ColumnEquality {
    bit: usize,
    column: ColumnRef,
    value: MemberKey,
}

/// Compile a tuple list into a compound predicate against `cube`'s star.
///
/// # Errors
/// `UnsupportedCalculatedMember` when a tuple contains a calculated member
/// whose formula is not a simple combination of stored members. This is a
/// hard failure, not an infeasibility: silently degrading here would change
/// result semantics.
pub fn compile(tuples: &[MemberTuple], cube: &Cube) -> NativeResult<CompoundPredicate> {
    // Expand calculated members first; one input tuple may fan out into
    // several base tuples.
    let mut expanded: Vec<MemberTuple> = Vec::new();
    for tuple in tuples {
        expanded.extend(expand_tuple(tuple)?);
    }

    // Walk and group by mask. BTreeMap gives deterministic group order.
    let mut groups: BTreeMap<ColumnMask, Vec<Vec<ColumnEquality>>> = BTreeMap::new();
    let mut unsatisfiable_count = 0usize;

    for tuple in &expanded {
        match walk_tuple(tuple, cube) {
            Some(equalities) => {
                let mask: ColumnMask = equalities.iter().map(|e| e.bit).collect();
                groups.entry(mask).or_default().push(equalities);
            }
            None => {
                debug!(tuple = %tuple.unique_name(), "tuple unsatisfiable against star");
                unsatisfiable_count += 1;
            }
        }
    }

    if groups.is_empty() {
        return Ok(CompoundPredicate {
            predicate: None,
            column_mask: ColumnMask::empty(),
            satisfiable: false,
            group_sizes: Vec::new(),
            unsatisfiable_count,
        });
    }

    // A tuple of nothing but "all" members constrains no column; its group
    // makes the whole disjunction trivially true.
    if groups.contains_key(&ColumnMask::empty()) {
        let group_sizes = groups.values().map(|rows| rows.len()).collect();
        return Ok(CompoundPredicate {
            predicate: None,
            column_mask: ColumnMask::empty(),
            satisfiable: true,
            group_sizes,
            unsatisfiable_count,
        });
    }

    let mut group_predicates = Vec::with_capacity(groups.len());
    let mut group_sizes = Vec::with_capacity(groups.len());
    let mut column_mask = ColumnMask::empty();

    for (mask, rows) in &groups {
        group_sizes.push(rows.len());
        column_mask = column_mask.or(mask);
        group_predicates.push(compile_group(rows));
    }

    Ok(CompoundPredicate {
        predicate: Some(Predicate::or(group_predicates)),
        column_mask,
        satisfiable: true,
        group_sizes,
        unsatisfiable_count,
    })
}

/// Expand calculated members in a tuple to their base members.
///
/// A formula is "simple" when it resolves directly to stored members: a
/// plain member reference, a member set, or an `Aggregate` over one.
/// Anything else cannot be turned into an exact predicate.
fn expand_tuple(tuple: &MemberTuple) -> NativeResult<Vec<MemberTuple>> {
    let mut expansions: Vec<Vec<Arc<Member>>> = vec![Vec::new()];

    for member in tuple.members() {
        let alternatives = if member.is_calculated() {
            expand_calculated(member)?
        } else {
            vec![Arc::clone(member)]
        };

        let mut next = Vec::with_capacity(expansions.len() * alternatives.len());
        for prefix in &expansions {
            for alt in &alternatives {
                let mut row = prefix.clone();
                row.push(Arc::clone(alt));
                next.push(row);
            }
        }
        expansions = next;
    }

    Ok(expansions.into_iter().map(MemberTuple::new).collect())
}

fn expand_calculated(member: &Arc<Member>) -> NativeResult<Vec<Arc<Member>>> {
    let formula = member
        .formula
        .as_ref()
        .expect("expand_calculated on a stored member");
    expand_formula(formula).ok_or_else(|| NativeError::UnsupportedCalculatedMember {
        member: member.unique_name(),
    })
}

fn expand_formula(formula: &MdxExpr) -> Option<Vec<Arc<Member>>> {
    match formula {
        MdxExpr::MemberRef(m) if !m.is_calculated() => Some(vec![Arc::clone(m)]),
        MdxExpr::MemberSet(members) if members.iter().all(|m| !m.is_calculated()) => {
            Some(members.clone())
        }
        MdxExpr::FunCall { name, args }
            if name.eq_ignore_ascii_case("aggregate") && args.len() == 1 =>
        {
            expand_formula(&args[0])
        }
        _ => None,
    }
}

/// Resolve one tuple to its column equalities, or `None` when any level in
/// its ancestry has no physical column in the target star.
fn walk_tuple(tuple: &MemberTuple, cube: &Cube) -> Option<Vec<ColumnEquality>> {
    let mut equalities = Vec::new();

    for member in tuple.members() {
        for ancestor in member.ancestry() {
            if ancestor.is_all() {
                break;
            }
            let star_column = cube.resolve_level(&ancestor.level)?;
            equalities.push(ColumnEquality {
                bit: star_column.bit,
                column: star_column.column.clone(),
                value: ancestor.key.clone(),
            });
            // Ancestors above a unique level are redundant.
            if ancestor.level.unique_members {
                break;
            }
        }
    }

    Some(equalities)
}

/// Compile one mask group into a predicate, collapsing to per-column IN
/// lists when the group provably forms a full cross-product.
fn compile_group(rows: &[Vec<ColumnEquality>]) -> Predicate {
    // Distinct rows, keyed by (bit, value) pairs in bit order.
    let mut distinct_rows: Vec<&Vec<ColumnEquality>> = Vec::new();
    let mut seen: Vec<Vec<(usize, MemberKey)>> = Vec::new();
    for row in rows {
        let mut key: Vec<(usize, MemberKey)> =
            row.iter().map(|e| (e.bit, e.value.clone())).collect();
        key.sort_by_key(|(bit, _)| *bit);
        if !seen.contains(&key) {
            seen.push(key);
            distinct_rows.push(row);
        }
    }

    // Distinct values per column, in first-seen order.
    let mut columns: Vec<(usize, ColumnRef, Vec<MemberKey>)> = Vec::new();
    for row in &distinct_rows {
        for eq in row.iter() {
            match columns.iter_mut().find(|(bit, _, _)| *bit == eq.bit) {
                Some((_, _, values)) => {
                    if !values.contains(&eq.value) {
                        values.push(eq.value.clone());
                    }
                }
                None => columns.push((eq.bit, eq.column.clone(), vec![eq.value.clone()])),
            }
        }
    }
    columns.sort_by_key(|(bit, _, _)| *bit);

    let product: usize = columns.iter().map(|(_, _, values)| values.len()).product();

    if product == distinct_rows.len() {
        // Full cross-product: AND of per-column IN lists is exact.
        let clauses = columns
            .into_iter()
            .map(|(_, column, mut values)| {
                if values.len() == 1 {
                    Predicate::Value {
                        column,
                        value: values.remove(0),
                    }
                } else {
                    Predicate::List { column, values }
                }
            })
            .collect();
        Predicate::and(clauses)
    } else {
        let clauses = distinct_rows
            .iter()
            .map(|row| {
                Predicate::and(
                    row.iter()
                        .map(|eq| Predicate::Value {
                            column: eq.column.clone(),
                            value: eq.value.clone(),
                        })
                        .collect(),
                )
            })
            .collect();
        Predicate::or(clauses)
    }
}
