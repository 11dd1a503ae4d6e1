//! T-SQL (SQL Server) dialect.
//!
//! T-SQL differences:
//! - Square bracket identifier quoting
//! - 1/0 boolean literals
//! - OFFSET ... ROWS FETCH NEXT ... ROWS ONLY pagination, which requires
//!   an ORDER BY clause
//! - No row-value constructors in IN lists
//! - No NULLS FIRST/LAST in ORDER BY

use super::helpers;
use super::SqlDialect;
use crate::sql::token::{Token, TokenStream};

/// T-SQL (Microsoft SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        let mut ts = TokenStream::new();

        // OFFSET is mandatory in the FETCH syntax, even when zero.
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(offset.unwrap_or(0) as i64))
            .space()
            .push(Token::Rows);

        if let Some(lim) = limit {
            ts.space()
                .push(Token::Fetch)
                .space()
                .push(Token::Next)
                .space()
                .push(Token::LitInt(lim as i64))
                .space()
                .push(Token::Rows)
                .space()
                .push(Token::Only);
        }

        ts
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn supports_multi_value_in(&self) -> bool {
        false
    }

    fn supports_nulls_ordering(&self) -> bool {
        false
    }
}
