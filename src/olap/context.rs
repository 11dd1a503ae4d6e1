//! Evaluator context - the ambient state a recognizer sees.
//!
//! Holds the current member per hierarchy, the slicer snapshot, the
//! non-empty flag, and role restrictions. Recognizers temporarily override
//! current members while probing sub-expressions; every override goes
//! through [`ContextGuard`], which restores the saved state on drop so no
//! exit path (early return, `?`, panic) can leak a mutation.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::config::NativeConfig;
use crate::olap::member::{Member, MemberTuple};
use crate::olap::schema::Cube;
use crate::sql::Dialect;

/// Ambient evaluation state for one native-evaluation attempt.
#[derive(Debug, Clone)]
pub struct EvaluatorContext {
    pub cube: Arc<Cube>,
    pub dialect: Dialect,
    pub config: NativeConfig,
    /// Current member per hierarchy unique name.
    current_members: HashMap<String, Arc<Member>>,
    /// Slicer snapshot: one tuple for a simple slicer, several for a
    /// compound slicer axis.
    pub slicer: Vec<MemberTuple>,
    /// The enclosing evaluation runs in non-empty mode.
    pub non_empty: bool,
    /// Role-based member restrictions are in force for this evaluation.
    pub role_restricted: bool,
}

impl EvaluatorContext {
    pub fn new(cube: Arc<Cube>, dialect: Dialect) -> Self {
        Self {
            cube,
            dialect,
            config: NativeConfig::default(),
            current_members: HashMap::new(),
            slicer: Vec::new(),
            non_empty: false,
            role_restricted: false,
        }
    }

    pub fn with_config(mut self, config: NativeConfig) -> Self {
        self.config = config;
        self
    }

    /// Current member for a hierarchy, if one has been set.
    pub fn current_member(&self, hierarchy: &str) -> Option<&Arc<Member>> {
        self.current_members.get(hierarchy)
    }

    /// Override the current member of the member's own hierarchy.
    pub fn set_current_member(&mut self, member: Arc<Member>) {
        self.current_members
            .insert(member.hierarchy().to_string(), member);
    }

    /// All current members, in hierarchy-name order (deterministic for
    /// cache keys).
    pub fn current_members_sorted(&self) -> Vec<Arc<Member>> {
        let mut entries: Vec<_> = self.current_members.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, m)| Arc::clone(m)).collect()
    }

    /// Begin a scoped override. Mutations made through the guard are
    /// rolled back when it drops.
    pub fn guard(&mut self) -> ContextGuard<'_> {
        let saved_members = self.current_members.clone();
        let saved_non_empty = self.non_empty;
        ContextGuard {
            ctx: self,
            saved_members,
            saved_non_empty,
        }
    }
}

/// RAII restore-point over an [`EvaluatorContext`].
///
/// Dereferences to the context; restores current members and the
/// non-empty flag when dropped.
pub struct ContextGuard<'a> {
    ctx: &'a mut EvaluatorContext,
    saved_members: HashMap<String, Arc<Member>>,
    saved_non_empty: bool,
}

impl Deref for ContextGuard<'_> {
    type Target = EvaluatorContext;

    fn deref(&self) -> &EvaluatorContext {
        self.ctx
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut EvaluatorContext {
        self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.ctx.current_members = std::mem::take(&mut self.saved_members);
        self.ctx.non_empty = self.saved_non_empty;
    }
}
