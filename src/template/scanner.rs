//! Splits template source into literal and interpolation segments

use crate::error::ParseError;

use super::ast::Segment;
use super::grammar::parse_expression;

const OPEN: &str = "{{=";
const CLOSE: &str = "}}";

/// Replace carriage returns, tabs and newlines with spaces
///
/// Every replaced character is one byte wide, so spans into the normalized
/// text are valid spans into the source as written.
pub fn normalize_whitespace(source: &str) -> String {
    source.replace(['\r', '\t', '\n'], " ")
}

/// Scan template source left to right into segments
///
/// Collects every syntax error instead of stopping at the first one.
pub fn scan(source: &str) -> Result<Vec<Segment>, Vec<ParseError>> {
    let text = normalize_whitespace(source);
    let mut segments = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let Some(open) = rest.find(OPEN) else {
            push_literal(&mut segments, &mut errors, rest, pos);
            break;
        };
        push_literal(&mut segments, &mut errors, &rest[..open], pos);

        let marker_start = pos + open;
        let expr_start = marker_start + OPEN.len();
        // The expression holds at least one character, so `{{=}}}` closes
        // on the second pair of braces
        let search_from = text[expr_start..]
            .chars()
            .next()
            .map(|c| expr_start + c.len_utf8());
        let close = search_from.and_then(|from| text[from..].find(CLOSE).map(|i| from + i));

        let Some(expr_end) = close else {
            errors.push(ParseError::syntax(
                marker_start..text.len(),
                "unterminated interpolation: missing '}}'",
            ));
            break;
        };
        let marker_end = expr_end + CLOSE.len();

        let raw = &text[expr_start..expr_end];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.push(ParseError::syntax(
                marker_start..marker_end,
                "empty interpolation: expected an expression after '{{='",
            ));
        } else {
            let leading = raw.len() - raw.trim_start().len();
            match parse_expression(trimmed) {
                Ok(expr) => segments.push(Segment::Expression {
                    source: trimmed.to_string(),
                    expr,
                    span: marker_start..marker_end,
                }),
                Err(errs) => errors.extend(
                    errs.into_iter()
                        .map(|e| e.offset(expr_start + leading)),
                ),
            }
        }
        pos = marker_end;
    }

    if errors.is_empty() {
        Ok(segments)
    } else {
        Err(errors)
    }
}

/// Append literal text, rejecting stray template delimiters
fn push_literal(
    segments: &mut Vec<Segment>,
    errors: &mut Vec<ParseError>,
    literal: &str,
    offset: usize,
) {
    if literal.is_empty() {
        return;
    }
    if let Some(i) = literal.find("{{") {
        errors.push(ParseError::syntax(
            offset + i..offset + i + 2,
            "unsupported block: only '{{= expression }}' interpolation is allowed",
        ));
    }
    if let Some(i) = literal.find(CLOSE) {
        errors.push(ParseError::syntax(
            offset + i..offset + i + 2,
            "unmatched '}}'",
        ));
    }
    segments.push(Segment::Literal(literal.to_string()));
}
