//! Expression AST - the core of SQL expression building.
//!
//! A strongly-typed AST for the SQL expressions this crate generates,
//! with exhaustive pattern matching enforced by the compiler.

use super::dialect::Dialect;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()` - the compiler
/// enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// IN: expr IN (values...)
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// Row-value IN: (e1, e2) IN ((v1, v2), ...)
    ///
    /// Only valid on dialects with `supports_multi_value_in()`.
    InTuples {
        exprs: Vec<Expr>,
        tuples: Vec<Vec<Expr>>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Wildcard: * or table.*
    Star { table: Option<String> },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Raw SQL expression passed directly to output without escaping.
    ///
    /// Only for trusted, static fragments (a pre-rendered order
    /// expression). Never pass user input to this variant.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
}

impl Expr {
    /// Convert to tokens (default dialect).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert to tokens for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                ts.push(Token::QualifiedIdent {
                    schema: table.clone(),
                    name: column.clone(),
                });
            }

            Expr::Literal(lit) => {
                ts.push(lit.to_token());
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space().push(op.to_token()).space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::UnaryOp { op, expr } => {
                match op {
                    UnaryOperator::Not => ts.push(Token::Not),
                };
                ts.space().lparen();
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone())).lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::In {
                expr,
                values,
                negated,
            } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&v.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::InTuples {
                exprs,
                tuples,
                negated,
            } => {
                ts.lparen();
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&e.to_tokens_for_dialect(dialect));
                }
                ts.rparen().space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space().lparen();
                for (i, tuple) in tuples.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.lparen();
                    for (j, v) in tuple.iter().enumerate() {
                        if j > 0 {
                            ts.comma().space();
                        }
                        ts.append(&v.to_tokens_for_dialect(dialect));
                    }
                    ts.rparen();
                }
                ts.rparen();
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone())).push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }

    /// Render this expression to SQL for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl Literal {
    fn to_token(&self) -> Token {
        match self {
            Literal::Int(n) => Token::LitInt(*n),
            Literal::Float(f) => Token::LitFloat(*f),
            Literal::String(s) => Token::LitString(s.clone()),
            Literal::Bool(b) => Token::LitBool(*b),
            Literal::Null => Token::LitNull,
        }
    }
}

impl BinaryOperator {
    fn to_token(self) -> Token {
        match self {
            BinaryOperator::Eq => Token::Eq,
            BinaryOperator::Ne => Token::Ne,
            BinaryOperator::Lt => Token::Lt,
            BinaryOperator::Gt => Token::Gt,
            BinaryOperator::Lte => Token::Lte,
            BinaryOperator::Gte => Token::Gte,
            BinaryOperator::And => Token::And,
            BinaryOperator::Or => Token::Or,
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Unqualified column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Table-qualified column reference.
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// Generic function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

pub fn sum(arg: Expr) -> Expr {
    func("sum", vec![arg])
}

pub fn count(arg: Expr) -> Expr {
    func("count", vec![arg])
}

pub fn count_distinct(arg: Expr) -> Expr {
    Expr::Function {
        name: "count".into(),
        args: vec![arg],
        distinct: true,
    }
}

pub fn min(arg: Expr) -> Expr {
    func("min", vec![arg])
}

pub fn max(arg: Expr) -> Expr {
    func("max", vec![arg])
}

pub fn avg(arg: Expr) -> Expr {
    func("avg", vec![arg])
}

// =============================================================================
// Fluent combinators
// =============================================================================

/// Fluent combinators for building boolean expressions.
pub trait ExprExt: Sized {
    fn binop(self, op: BinaryOperator, rhs: Expr) -> Expr;

    fn eq(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Eq, rhs)
    }
    fn ne(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Ne, rhs)
    }
    fn gt(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Gt, rhs)
    }
    fn gte(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Gte, rhs)
    }
    fn lt(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Lt, rhs)
    }
    fn lte(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Lte, rhs)
    }
    fn and(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::And, rhs)
    }
    fn or(self, rhs: Expr) -> Expr {
        self.binop(BinaryOperator::Or, rhs)
    }
    fn is_null(self) -> Expr;
    fn paren(self) -> Expr;
}

impl ExprExt for Expr {
    fn binop(self, op: BinaryOperator, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(rhs),
        }
    }

    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self))
    }
}
