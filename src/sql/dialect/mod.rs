//! SQL Dialect definitions and capability flags.
//!
//! This module provides a trait-based abstraction for SQL dialect
//! differences. Each dialect implements `SqlDialect` to handle its specific
//! syntax:
//!
//! - Identifier quoting: `"` (ANSI/PG/DuckDB), `` ` `` (MySQL), `[]` (T-SQL)
//! - Pagination: LIMIT/OFFSET vs OFFSET FETCH
//! - Boolean literals: true/false vs 1/0
//!
//! It also exposes the capability predicates the native recognizers probe
//! before committing to a SQL rewrite:
//!
//! | Capability | DuckDB | PostgreSQL | MySQL | T-SQL |
//! |------------|--------|------------|-------|-------|
//! | LIMIT + OFFSET | ✓ | ✓ | ✓ | ✓ (OFFSET FETCH) |
//! | Multi-value IN | ✓ | ✓ | ✓ | ❌ |
//! | GROUPING SETS | ✓ | ✓ | ❌ | ✓ |
//! | NULLS FIRST/LAST | ✓ | ✓ | ❌ | ❌ |
//!
//! A recognizer that needs a missing capability rejects the expression and
//! the engine falls back to interpreted evaluation.

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use tsql::TSql;

use super::token::{Token, TokenStream};

/// SQL dialect trait - defines how SQL constructs are rendered and which
/// features the target database supports.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Whether the dialect can express both LIMIT and OFFSET in one query.
    ///
    /// TopCount/BottomCount/Subset rewrites require this.
    fn supports_limit_and_offset(&self) -> bool {
        true
    }

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    ///
    /// - ANSI/PostgreSQL/DuckDB/MySQL: `LIMIT n OFFSET m` (default)
    /// - T-SQL: `OFFSET m ROWS FETCH NEXT n ROWS ONLY` (override)
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();

        if let Some(lim) = limit {
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(lim as i64));
        }

        if let Some(off) = offset {
            if limit.is_some() {
                ts.space();
            }
            ts.push(Token::Offset)
                .space()
                .push(Token::LitInt(off as i64));
        }

        ts
    }

    /// Whether this dialect requires ORDER BY for OFFSET/LIMIT.
    ///
    /// T-SQL requires ORDER BY when using OFFSET FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Whether this dialect supports row-value constructors in IN lists:
    /// `(col1, col2) IN ((v1, v2), (v3, v4))`.
    ///
    /// The Except rewrite and multi-column compound predicates need this.
    fn supports_multi_value_in(&self) -> bool {
        true
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    /// Whether this dialect supports GROUPING SETS.
    fn supports_grouping_sets(&self) -> bool {
        true
    }

    // =========================================================================
    // NULLS Ordering
    // =========================================================================

    /// Whether this dialect supports NULLS FIRST/LAST in ORDER BY.
    ///
    /// MySQL and T-SQL don't support it; null placement is silently left to
    /// the database default there.
    fn supports_nulls_ordering(&self) -> bool {
        true
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    DuckDb,
    Postgres,
    MySql,
    TSql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::DuckDb => &DuckDb,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn supports_limit_and_offset(&self) -> bool {
        self.dialect().supports_limit_and_offset()
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn supports_multi_value_in(&self) -> bool {
        self.dialect().supports_multi_value_in()
    }

    fn supports_grouping_sets(&self) -> bool {
        self.dialect().supports_grouping_sets()
    }

    fn supports_nulls_ordering(&self) -> bool {
        self.dialect().supports_nulls_ordering()
    }
}
