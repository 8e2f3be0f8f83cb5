//! Compiled templates

use crate::error::ParseError;

use super::ast::Segment;
use super::eval::{evaluate, EvalError};
use super::scanner::scan;
use super::value::Context;

/// A template ready to be rendered any number of times
///
/// Rendering is pure: the same context always yields the same text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CompiledTemplate {
    /// Compile template source into segments
    pub fn compile(source: &str) -> Result<Self, Vec<ParseError>> {
        let segments = scan(source)?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Render the template with every context key available as a bare name
    ///
    /// Interpolated values are inserted as-is. Nothing is HTML escaped.
    pub fn render(&self, ctx: &Context) -> Result<String, EvalError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expression { expr, .. } => {
                    out.push_str(&evaluate(expr, ctx)?.render());
                }
            }
        }
        Ok(out)
    }

    /// The source this template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names referenced as bare variables, in first-use order
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for segment in &self.segments {
            if let Segment::Expression { expr, .. } = segment {
                collect_variables(expr, &mut names);
            }
        }
        names
    }
}

fn collect_variables<'a>(expr: &'a super::ast::Expr, names: &mut Vec<&'a str>) {
    use super::ast::Expr;
    match expr {
        Expr::Literal(_) => {}
        Expr::Variable(name) => {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        Expr::Member { target, .. } => collect_variables(target, names),
        Expr::Index { target, index } => {
            collect_variables(target, names);
            collect_variables(index, names);
        }
        Expr::Unary { operand, .. } => collect_variables(operand, names),
        Expr::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, names);
            collect_variables(rhs, names);
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            collect_variables(condition, names);
            collect_variables(then, names);
            collect_variables(otherwise, names);
        }
    }
}
