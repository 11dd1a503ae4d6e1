//! # Cubist
//!
//! Native SQL evaluation of MDX set functions over a star schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           MDX expression tree (olap::expr)               │
//! │    TopCount / BottomCount / Order / Subset / Except /    │
//! │            Aggregate / Sum / NonEmpty                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [native::NativeRegistry]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Recognizers: feasibility analysis + CrossJoinArg       │
//! │   decomposition (reject → interpreted fallback)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [native::SetConstraint chain]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Composable constraint nodes + compound predicates      │
//! │   + structural cache keys                                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::SqlQueryBuilder]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 One SQL statement                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The entry point is [`native::NativeRegistry::try_native`]: the
//! interpreter probes it with a function call and either receives a
//! [`native::NativeEvaluator`] bound to a constraint chain and cache key,
//! or `None` and falls back to in-memory evaluation. Equal cache keys
//! guarantee equal generated SQL, so an external result cache can
//! recognize equivalent query shapes as duplicates.

pub mod config;
pub mod error;
pub mod native;
pub mod olap;
pub mod sql;

// Re-export SQL submodules at crate level for convenient paths
pub use sql::builder;
pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{CalcMemberSeverity, NativeConfig};
    pub use crate::error::{NativeError, NativeResult};
    pub use crate::native::{
        CacheKey, ColumnMask, CompoundPredicate, ConstraintKind, CrossJoinArg, NativeEvaluator,
        NativeRecognizer, NativeRegistry, Predicate, SetConstraint,
    };
    pub use crate::olap::{
        Aggregator, ColumnRef, Cube, Dimension, EvaluatorContext, Hierarchy, Level, MdxExpr,
        MdxValue, Measure, Member, MemberKey, MemberTuple, Star, StarTableJoin,
    };
    pub use crate::sql::{Dialect, SqlDialect, SqlQueryBuilder};
}

// Also export the workhorse types at the crate root
pub use config::NativeConfig;
pub use error::{NativeError, NativeResult};
pub use native::{NativeEvaluator, NativeRegistry};
pub use olap::EvaluatorContext;
pub use sql::Dialect;
