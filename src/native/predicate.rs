//! Predicate tree - the closed set of WHERE fragments compound predicate
//! compilation produces.
//!
//! Four variants only; every consumer matches exhaustively, so a new
//! variant cannot be silently ignored anywhere.

use crate::olap::member::MemberKey;
use crate::olap::schema::ColumnRef;
use crate::sql::expr::Expr;
use crate::sql::Dialect;

/// A compiled predicate over physical star columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Value { column: ColumnRef, value: MemberKey },

    /// `column IN (v1, v2, ...)`
    List {
        column: ColumnRef,
        values: Vec<MemberKey>,
    },

    /// Parenthesized conjunction of children, in insertion order.
    And(Vec<Predicate>),

    /// Parenthesized disjunction of children, in insertion order.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Normalizing AND constructor: a single child collapses to itself.
    pub fn and(mut children: Vec<Predicate>) -> Predicate {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Predicate::And(children)
        }
    }

    /// Normalizing OR constructor: a single child collapses to itself.
    pub fn or(mut children: Vec<Predicate>) -> Predicate {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Predicate::Or(children)
        }
    }

    /// Lower to the SQL expression AST.
    pub fn to_expr(&self) -> Expr {
        match self {
            Predicate::Value { column, value } => Expr::BinaryOp {
                left: Box::new(column.to_expr()),
                op: crate::sql::expr::BinaryOperator::Eq,
                right: Box::new(value.to_expr()),
            },

            Predicate::List { column, values } => Expr::In {
                expr: Box::new(column.to_expr()),
                values: values.iter().map(|v| v.to_expr()).collect(),
                negated: false,
            },

            Predicate::And(children) => Self::combine(children, crate::sql::expr::BinaryOperator::And),

            Predicate::Or(children) => Self::combine(children, crate::sql::expr::BinaryOperator::Or),
        }
    }

    // Nested combinations are parenthesized; leaves are not.
    fn combine(children: &[Predicate], op: crate::sql::expr::BinaryOperator) -> Expr {
        children
            .iter()
            .map(|c| {
                let e = c.to_expr();
                match c {
                    Predicate::And(_) | Predicate::Or(_) => Expr::Paren(Box::new(e)),
                    _ => e,
                }
            })
            .reduce(|acc, e| Expr::BinaryOp {
                left: Box::new(acc),
                op,
                right: Box::new(e),
            })
            .expect("predicate combination over empty children")
    }

    /// Render to SQL text for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_expr().to_sql(dialect)
    }

    /// Collect the distinct columns this predicate constrains, in first
    /// appearance order. Callers use this to wire the owning tables into
    /// the query.
    pub fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Predicate::Value { column, .. } | Predicate::List { column, .. } => {
                if !out.contains(&column) {
                    out.push(column);
                }
            }
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
        }
    }
}
