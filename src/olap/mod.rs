//! OLAP boundary types: star metadata, members, MDX expressions, and the
//! evaluator context.
//!
//! These are the collaborator interfaces the native core is written
//! against. In the full engine they are populated by the schema loader and
//! the MDX parser.

pub mod context;
pub mod expr;
pub mod member;
pub mod schema;

pub use context::{ContextGuard, EvaluatorContext};
pub use expr::{MdxExpr, MdxValue};
pub use member::{Member, MemberKey, MemberTuple};
pub use schema::{
    Aggregator, ColumnRef, Cube, Dimension, Hierarchy, Level, Measure, Star, StarColumn,
    StarTableJoin,
};
