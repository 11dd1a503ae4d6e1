//! Members and member tuples.
//!
//! A member is one resolved position in a hierarchy, linked to its parent
//! up to the "all" pseudo-member. Tuples combine one member per hierarchy
//! into a single row of a set or slicer.

use std::sync::Arc;

use serde::Serialize;

use super::expr::MdxExpr;
use super::schema::Level;
use crate::sql::expr::{Expr, Literal};

/// Key value of a member in its level's key column.
///
/// Restricted to hashable value types so keys can participate in grouping
/// and cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKey {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl MemberKey {
    /// SQL literal for this key.
    pub fn to_expr(&self) -> Expr {
        match self {
            MemberKey::Int(n) => Expr::Literal(Literal::Int(*n)),
            MemberKey::Str(s) => Expr::Literal(Literal::String(s.clone())),
            MemberKey::Bool(b) => Expr::Literal(Literal::Bool(*b)),
        }
    }
}

impl std::fmt::Display for MemberKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKey::Int(n) => write!(f, "{}", n),
            MemberKey::Str(s) => write!(f, "{}", s),
            MemberKey::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for MemberKey {
    fn from(s: &str) -> Self {
        MemberKey::Str(s.into())
    }
}

impl From<i64> for MemberKey {
    fn from(n: i64) -> Self {
        MemberKey::Int(n)
    }
}

/// One resolved member of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Display name, e.g. "CA".
    pub name: String,
    pub level: Arc<Level>,
    pub key: MemberKey,
    /// Parent chain terminating at the "all" member (or at the root of a
    /// hierarchy without one).
    pub parent: Option<Arc<Member>>,
    /// Present for calculated members; the formula over other members.
    pub formula: Option<MdxExpr>,
}

impl Member {
    /// The hierarchy root "all" member.
    pub fn all(level: Arc<Level>) -> Arc<Member> {
        Arc::new(Member {
            name: format!("All {}", level.hierarchy.trim_matches(['[', ']'])),
            key: MemberKey::Int(0),
            parent: None,
            formula: None,
            level,
        })
    }

    /// A regular stored member.
    pub fn new(
        name: &str,
        level: Arc<Level>,
        key: impl Into<MemberKey>,
        parent: Option<Arc<Member>>,
    ) -> Arc<Member> {
        Arc::new(Member {
            name: name.into(),
            level,
            key: key.into(),
            parent,
            formula: None,
        })
    }

    /// A calculated member with a formula.
    pub fn calculated(name: &str, level: Arc<Level>, formula: MdxExpr) -> Arc<Member> {
        Arc::new(Member {
            name: name.into(),
            key: MemberKey::Str(name.into()),
            parent: None,
            formula: Some(formula),
            level,
        })
    }

    pub fn is_all(&self) -> bool {
        self.level.is_all
    }

    pub fn is_calculated(&self) -> bool {
        self.formula.is_some()
    }

    /// Hierarchy unique name this member belongs to.
    pub fn hierarchy(&self) -> &str {
        &self.level.hierarchy
    }

    /// Qualified unique name, e.g. `[Customer].[CA].[San Francisco]`.
    pub fn unique_name(&self) -> String {
        let mut parts = Vec::new();
        let mut current = Some(self);
        while let Some(m) = current {
            if !m.is_all() {
                parts.push(format!("[{}]", m.name));
            }
            current = m.parent.as_deref();
        }
        parts.reverse();
        if parts.is_empty() {
            format!("{}.[(All)]", self.level.hierarchy)
        } else {
            format!("{}.{}", self.level.hierarchy, parts.join("."))
        }
    }

    /// Iterate this member and its ancestors, root-most last.
    pub fn ancestry(self: &Arc<Member>) -> AncestryIter {
        AncestryIter {
            current: Some(Arc::clone(self)),
        }
    }
}

/// Iterator over a member's parent chain, starting at the member itself.
pub struct AncestryIter {
    current: Option<Arc<Member>>,
}

impl Iterator for AncestryIter {
    type Item = Arc<Member>;

    fn next(&mut self) -> Option<Arc<Member>> {
        let member = self.current.take()?;
        self.current = member.parent.clone();
        Some(member)
    }
}

/// Ordered sequence of members, one per hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberTuple(pub Vec<Arc<Member>>);

impl MemberTuple {
    pub fn new(members: Vec<Arc<Member>>) -> Self {
        Self(members)
    }

    pub fn members(&self) -> &[Arc<Member>] {
        &self.0
    }

    /// Any member of the tuple is calculated.
    pub fn has_calculated_member(&self) -> bool {
        self.0.iter().any(|m| m.is_calculated())
    }

    /// Unique-name form used in cache keys and diagnostics.
    pub fn unique_name(&self) -> String {
        let names: Vec<String> = self.0.iter().map(|m| m.unique_name()).collect();
        format!("({})", names.join(", "))
    }
}

impl From<Arc<Member>> for MemberTuple {
    fn from(member: Arc<Member>) -> Self {
        MemberTuple(vec![member])
    }
}
