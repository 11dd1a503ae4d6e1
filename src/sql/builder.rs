//! SQL query builder - the assembly surface constraint nodes write into.
//!
//! Unlike a fluent one-shot builder, `SqlQueryBuilder` is an accumulator:
//! constraint nodes call `add_where`/`add_order_by`/`set_limit` in chain
//! order, and the builder renders the collected buckets into one SELECT
//! statement at the end. `limit()`/`offset()` are readable so that a nested
//! constraint can compose its LIMIT with one already applied by an
//! enclosing constraint.

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expr, ExprExt};
use super::token::{Token, TokenStream};

// =============================================================================
// Select Expression (column with optional alias)
// =============================================================================

/// A SELECT list item: expression with optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

// =============================================================================
// Table Reference
// =============================================================================

/// A table reference with optional schema and alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.table.clone(),
        });
        if let Some(alias) = &self.alias {
            ts.space()
                .push(Token::As)
                .space()
                .push(Token::Ident(alias.clone()));
        }
        ts
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self.join_type {
            JoinType::Inner => ts.push(Token::Inner),
        };

        ts.space().push(Token::Join).space();
        ts.append(&self.table.to_tokens());
        ts.space().push(Token::On).space();
        ts.append(&self.on.to_tokens_for_dialect(dialect));

        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// NULLS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
    pub nulls: Option<NullsOrder>,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
            nulls: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    /// Convert to tokens for a specific dialect.
    ///
    /// Skips NULLS FIRST/LAST for dialects that don't support it.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);

        ts.space().push(match self.dir {
            SortDir::Asc => Token::Asc,
            SortDir::Desc => Token::Desc,
        });

        if let Some(nulls) = &self.nulls {
            if dialect.supports_nulls_ordering() {
                ts.space().push(match nulls {
                    NullsOrder::First => Token::NullsFirst,
                    NullsOrder::Last => Token::NullsLast,
                });
            }
            // Dialects without NULLS ordering leave placement to the
            // database default.
        }

        ts
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// Accumulating SELECT builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlQueryBuilder {
    select: Vec<SelectExpr>,
    distinct: bool,
    from: Option<TableRef>,
    joins: Vec<Join>,
    where_clauses: Vec<Expr>,
    group_by: Vec<Expr>,
    having_clauses: Vec<Expr>,
    order_by: Vec<OrderByExpr>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SqlQueryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the FROM table.
    pub fn from(&mut self, table: TableRef) -> &mut Self {
        self.from = Some(table);
        self
    }

    /// Whether a FROM table has been set.
    pub fn has_from(&self) -> bool {
        self.from.is_some()
    }

    /// Add SELECT DISTINCT.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Add a SELECT list item. Duplicate expressions are kept once.
    pub fn add_select(&mut self, select: SelectExpr) -> &mut Self {
        if !self.select.iter().any(|s| s.expr == select.expr) {
            self.select.push(select);
        }
        self
    }

    /// Add an INNER JOIN unless the same table (by alias or name) is
    /// already joined.
    pub fn add_join(&mut self, table: TableRef, on: Expr) -> &mut Self {
        let key = |t: &TableRef| t.alias.clone().unwrap_or_else(|| t.table.clone());
        let already = self
            .from
            .as_ref()
            .map(|f| key(f) == key(&table))
            .unwrap_or(false)
            || self.joins.iter().any(|j| key(&j.table) == key(&table));
        if !already {
            self.joins.push(Join {
                join_type: JoinType::Inner,
                table,
                on,
            });
        }
        self
    }

    /// Add a WHERE condition (ANDed with existing conditions).
    pub fn add_where(&mut self, condition: Expr) -> &mut Self {
        if !self.where_clauses.contains(&condition) {
            self.where_clauses.push(condition);
        }
        self
    }

    /// Add a GROUP BY column.
    pub fn add_group_by(&mut self, expr: Expr) -> &mut Self {
        if !self.group_by.contains(&expr) {
            self.group_by.push(expr);
        }
        self
    }

    /// Add a HAVING condition (ANDed with existing conditions).
    pub fn add_having(&mut self, condition: Expr) -> &mut Self {
        if !self.having_clauses.contains(&condition) {
            self.having_clauses.push(condition);
        }
        self
    }

    /// Append an ORDER BY key. Keys are emitted in insertion order, so an
    /// outer constraint that emits first dominates the final ordering.
    pub fn add_order_by(&mut self, order: OrderByExpr) -> &mut Self {
        self.order_by.push(order);
        self
    }

    /// Current LIMIT, if any.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Current OFFSET, if any.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Set (or overwrite) LIMIT.
    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Set (or overwrite) OFFSET.
    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Remove any OFFSET.
    pub fn clear_offset(&mut self) -> &mut Self {
        self.offset = None;
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // SELECT
        ts.push(Token::Select);
        if self.distinct {
            ts.space().push(Token::Distinct);
        }

        for (i, select_expr) in self.select.iter().enumerate() {
            if i == 0 {
                ts.newline().indent(1);
            } else {
                ts.comma().newline().indent(1);
            }
            ts.append(&select_expr.to_tokens_for_dialect(dialect));
        }

        // FROM
        if let Some(from) = &self.from {
            ts.newline().push(Token::From).space();
            ts.append(&from.to_tokens());
        }

        // JOINs
        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens_for_dialect(dialect));
        }

        // WHERE
        if !self.where_clauses.is_empty() {
            ts.newline().push(Token::Where).space();
            for (i, cond) in self.where_clauses.iter().enumerate() {
                if i > 0 {
                    ts.newline().indent(1).push(Token::And).space();
                }
                ts.append(&cond.to_tokens_for_dialect(dialect));
            }
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens_for_dialect(dialect));
            }
        }

        // HAVING
        if !self.having_clauses.is_empty() {
            let combined = self
                .having_clauses
                .iter()
                .cloned()
                .reduce(|acc, c| acc.and(c))
                .expect("non-empty having clauses");
            ts.newline().push(Token::Having).space();
            ts.append(&combined.to_tokens_for_dialect(dialect));
        }

        // ORDER BY
        // T-SQL requires ORDER BY for its OFFSET FETCH syntax; emit a
        // placeholder when pagination is present without an ordering.
        let needs_order_by_placeholder = dialect.requires_order_by_for_offset()
            && self.order_by.is_empty()
            && (self.limit.is_some() || self.offset.is_some());

        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, order_expr) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&order_expr.to_tokens_for_dialect(dialect));
            }
        } else if needs_order_by_placeholder {
            ts.newline()
                .push(Token::OrderBy)
                .space()
                .lparen()
                .push(Token::Select)
                .space()
                .push(Token::Null)
                .rparen();
        }

        // LIMIT / OFFSET
        if self.limit.is_some() || self.offset.is_some() {
            ts.newline();
            ts.append(&dialect.emit_limit_offset(self.limit, self.offset));
        }

        ts
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for SqlQueryBuilder {
    /// Formats the query using the default dialect (DuckDB).
    ///
    /// For dialect-specific SQL, use [`SqlQueryBuilder::to_sql`] instead.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql(Dialect::default()))
    }
}
