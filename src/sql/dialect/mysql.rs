//! MySQL SQL dialect.
//!
//! MySQL differences:
//! - Backtick identifier quoting
//! - 1/0 boolean literals
//! - No NULLS FIRST/LAST in ORDER BY
//! - No GROUPING SETS (only WITH ROLLUP)

use super::helpers;
use super::SqlDialect;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_grouping_sets(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }
}
