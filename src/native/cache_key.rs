//! Structural cache keys for native constraints.
//!
//! A constraint's key is an ordered list of typed fields. Two constraints
//! with equal keys are guaranteed to generate identical SQL and results
//! under the same schema, so an external result cache can treat them as
//! duplicates. Every field that can change generated SQL must be included;
//! order-sensitive comparison keeps `Subset(2, 10)` and `Subset(10, 2)`
//! apart.
//!
//! Expressions are keyed by their stable textual form, never by instance
//! identity - two structurally identical trees hash equal.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::mask::ColumnMask;

/// One typed field of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum KeyField {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    StrList(Vec<String>),
    Mask(ColumnMask),
    Nested(Box<CacheKey>),
    /// Placeholder for an optional field that is absent, keeping field
    /// positions aligned across instances.
    Absent,
}

/// Ordered composite key for one constraint node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    node_type: &'static str,
    fields: Vec<KeyField>,
}

impl CacheKey {
    pub fn new(node_type: &'static str) -> Self {
        Self {
            node_type,
            fields: Vec::new(),
        }
    }

    pub fn node_type(&self) -> &'static str {
        self.node_type
    }

    pub fn push(mut self, field: KeyField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push_str(self, s: impl Into<String>) -> Self {
        self.push(KeyField::Str(s.into()))
    }

    pub fn push_uint(self, n: u64) -> Self {
        self.push(KeyField::UInt(n))
    }

    pub fn push_bool(self, b: bool) -> Self {
        self.push(KeyField::Bool(b))
    }

    pub fn push_list(self, items: Vec<String>) -> Self {
        self.push(KeyField::StrList(items))
    }

    pub fn push_opt_str(self, s: Option<String>) -> Self {
        match s {
            Some(s) => self.push(KeyField::Str(s)),
            None => self.push(KeyField::Absent),
        }
    }

    pub fn push_parent(self, parent: Option<&CacheKey>) -> Self {
        match parent {
            Some(key) => self.push(KeyField::Nested(Box::new(key.clone()))),
            None => self.push(KeyField::Absent),
        }
    }

    /// Content fingerprint: SHA256 over the serialized key.
    ///
    /// For external caches keyed by string rather than by value.
    ///
    /// # Errors
    /// Returns an error if the key cannot be serialized to JSON.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
