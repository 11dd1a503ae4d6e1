//! Error types for the native evaluation core.
//!
//! Infeasibility ("this expression cannot go native") is NOT an error: the
//! recognizers return `Ok(None)` and the engine falls back to interpreted
//! evaluation. `NativeError` is reserved for genuine inconsistencies where
//! falling back could change result semantics, not just strategy.

use thiserror::Error;

/// Errors that can occur during native evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// A calculated member appeared where expansion to stored members is
    /// structurally required, and its formula is not a simple combination
    /// of stored members.
    ///
    /// Falling back to interpreted evaluation here could change result
    /// semantics, so the severity of this condition is configurable
    /// (see [`crate::config::CalcMemberSeverity`]).
    #[error("calculated member '{member}' cannot be expanded to stored members")]
    UnsupportedCalculatedMember { member: String },
}

pub type NativeResult<T> = Result<T, NativeError>;
