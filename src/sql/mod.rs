//! SQL generation module.
//!
//! A type-safe SQL assembly layer shared by all native constraints:
//!
//! - [`builder`] - accumulating SELECT builder constraint nodes write into
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations and capability flags

pub mod builder;
pub mod dialect;
pub mod expr;
pub mod token;

// Re-export commonly used types at the sql module level
pub use builder::{Join, JoinType, NullsOrder, OrderByExpr, SelectExpr, SortDir, SqlQueryBuilder, TableRef};
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, col, count, count_distinct, func, lit_bool, lit_float, lit_int, lit_null, lit_str, max,
    min, sum, table_col, BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use token::{Token, TokenStream};
