//! DuckDB SQL dialect.
//!
//! DuckDB tracks PostgreSQL syntax closely: ANSI quoting, native booleans,
//! LIMIT/OFFSET, NULLS FIRST/LAST, GROUPING SETS, and row-value IN lists.

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    // All capability defaults apply.
}
