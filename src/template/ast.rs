//! Syntax tree for compiled templates

use super::value::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// One piece of a template, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text emitted verbatim
    Literal(String),
    /// A `{{= expr }}` interpolation
    Expression {
        /// Expression text between `{{=` and `}}`, trimmed
        source: String,
        expr: Expr,
        /// Span of the whole marker in the template source
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    LooseEq,
    LooseNotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
}

/// Interpolation expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Bare name looked up in the render context
    Variable(String),
    /// `target.name`
    Member { target: Box<Expr>, name: String },
    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}
