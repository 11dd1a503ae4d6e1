//! TOML-based configuration for the native evaluation core.
//!
//! Example configuration:
//! ```toml
//! [native]
//! enable_top_count = true
//! enable_order = true
//! enable_subset = true
//! enable_except = true
//! enable_aggregate = true
//! enable_non_empty = true
//! max_in_clause_size = 1000
//! unsupported_calc_member = "error"
//! ```
//!
//! Every field has a default, so an empty document yields a fully enabled
//! configuration.

use serde::{Deserialize, Serialize};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How the engine reacts when a calculated member blocks native evaluation
/// in a position where expansion is structurally required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcMemberSeverity {
    /// Treat as a plain "not native" rejection.
    Silent,
    /// Log a warning, then treat as "not native".
    Warn,
    /// Propagate a typed error to the caller.
    #[default]
    Error,
}

/// Feature flags and limits for native evaluation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Enable the TopCount/BottomCount rewrite.
    pub enable_top_count: bool,
    /// Enable the Order rewrite.
    pub enable_order: bool,
    /// Enable the Subset rewrite.
    pub enable_subset: bool,
    /// Enable the Except rewrite.
    pub enable_except: bool,
    /// Enable the Aggregate/Sum rewrite.
    pub enable_aggregate: bool,
    /// Enable the NonEmpty rewrite.
    pub enable_non_empty: bool,
    /// Upper bound on values in a single generated IN list; larger member
    /// lists reject native evaluation instead of producing oversized SQL.
    pub max_in_clause_size: usize,
    /// Reaction to unexpandable calculated members.
    pub unsupported_calc_member: CalcMemberSeverity,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            enable_top_count: true,
            enable_order: true,
            enable_subset: true,
            enable_except: true,
            enable_aggregate: true,
            enable_non_empty: true,
            max_in_clause_size: 1000,
            unsupported_calc_member: CalcMemberSeverity::default(),
        }
    }
}

/// Wrapper table so the config can live inside a larger engine config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
struct ConfigDocument {
    native: NativeConfig,
}

impl NativeConfig {
    /// Parse from a TOML document with a `[native]` table.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDocument = toml::from_str(s)?;
        Ok(doc.native)
    }

    /// A configuration with every rewrite disabled.
    pub fn all_disabled() -> Self {
        Self {
            enable_top_count: false,
            enable_order: false,
            enable_subset: false,
            enable_except: false,
            enable_aggregate: false,
            enable_non_empty: false,
            ..Self::default()
        }
    }
}
