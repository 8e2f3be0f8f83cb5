//! Expression evaluation against a render context

use thiserror::Error;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::value::{format_number, Context, Value};

/// Errors raised while rendering a compiled template
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// A bare name that is not a key of the render context
    #[error("{name} is not defined")]
    UndefinedVariable { name: String },

    /// Property read on null or undefined
    #[error("cannot read property '{property}' of {target}")]
    PropertyOfNullish { property: String, target: String },
}

/// Evaluate an expression
pub fn evaluate(expr: &Expr, ctx: &Context) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone() }),
        Expr::Member { target, name } => {
            let target = evaluate(target, ctx)?;
            read_property(&target, name)
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, ctx)?;
            let key = match evaluate(index, ctx)? {
                Value::Number(n) => format_number(n),
                other => other.to_js_string(),
            };
            read_property(&target, &key)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Negate => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary { op, lhs, rhs } => match op {
            // Short-circuit operators return an operand, not a boolean
            BinaryOp::And => {
                let left = evaluate(lhs, ctx)?;
                if left.is_truthy() {
                    evaluate(rhs, ctx)
                } else {
                    Ok(left)
                }
            }
            BinaryOp::Or => {
                let left = evaluate(lhs, ctx)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    evaluate(rhs, ctx)
                }
            }
            _ => {
                let left = evaluate(lhs, ctx)?;
                let right = evaluate(rhs, ctx)?;
                Ok(apply_binary(*op, &left, &right))
            }
        },
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, ctx)?.is_truthy() {
                evaluate(then, ctx)
            } else {
                evaluate(otherwise, ctx)
            }
        }
    }
}

fn read_property(target: &Value, property: &str) -> Result<Value, EvalError> {
    target
        .property(property)
        .ok_or_else(|| EvalError::PropertyOfNullish {
            property: property.to_string(),
            target: target.kind().to_string(),
        })
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if concatenates(left) || concatenates(right) {
                Value::String(left.to_js_string() + &right.to_js_string())
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LessEq => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GreaterEq => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::LooseEq => Value::Bool(left.loose_eq(right)),
        BinaryOp::LooseNotEq => Value::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_eq(right)),
        // Handled with short-circuiting in `evaluate`
        BinaryOp::And | BinaryOp::Or => Value::Undefined,
    }
}

/// Values that turn `+` into string concatenation
fn concatenates(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::List(_) | Value::Map(_))
}

/// Relational comparison: strings compare lexically, everything else
/// numerically. Any comparison involving NaN is false.
fn compare(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    ordering.map(test).unwrap_or(false)
}
