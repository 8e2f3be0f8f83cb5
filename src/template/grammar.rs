//! Expression parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::template::ast::{BinaryOp, Expr, UnaryOp};
use crate::template::lexer::Token;
use crate::template::value::Value;

/// Postfix operations applied left to right after an atom
#[derive(Debug, Clone)]
enum Postfix {
    Member(String),
    Index(Expr),
}

/// Parse the text of one interpolation into an expression tree
///
/// Spans in returned errors are relative to `input`.
pub fn parse_expression(input: &str) -> Result<Expr, Vec<ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::template::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn expression_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Number(n) => Value::Number(n),
            Token::Str(s) => Value::String(s),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            Token::Undefined => Value::Undefined,
        }
        .map(Expr::Literal)
        .labelled("literal");

        let identifier = select! {
            Token::Ident(name) => name,
        }
        .labelled("identifier");

        let atom = choice((
            literal,
            identifier.clone().map(Expr::Variable),
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ));

        // Member and index access: user.name, items[0], a.b["c"]
        let postfix = choice((
            just(Token::Dot).ignore_then(identifier).map(Postfix::Member),
            expr.clone()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
                .map(Postfix::Index),
        ));

        let access = atom.foldl(postfix.repeated(), |target, op| match op {
            Postfix::Member(name) => Expr::Member {
                target: Box::new(target),
                name,
            },
            Postfix::Index(index) => Expr::Index {
                target: Box::new(target),
                index: Box::new(index),
            },
        });

        let unary = choice((
            just(Token::Bang).to(UnaryOp::Not),
            just(Token::Minus).to(UnaryOp::Negate),
            just(Token::Plus).to(UnaryOp::Plus),
        ))
        .repeated()
        .foldr(access, |op, operand| Expr::unary(op, operand))
        .boxed();

        let product = unary.clone().foldl(
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
                just(Token::Percent).to(BinaryOp::Rem),
            ))
            .then(unary)
            .repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let sum = product.clone().foldl(
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            ))
            .then(product)
            .repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let comparison = sum.clone().foldl(
            choice((
                just(Token::LessEq).to(BinaryOp::LessEq),
                just(Token::GreaterEq).to(BinaryOp::GreaterEq),
                just(Token::Less).to(BinaryOp::Less),
                just(Token::Greater).to(BinaryOp::Greater),
            ))
            .then(sum)
            .repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let equality = comparison.clone().foldl(
            choice((
                just(Token::StrictEq).to(BinaryOp::StrictEq),
                just(Token::StrictNotEq).to(BinaryOp::StrictNotEq),
                just(Token::LooseEq).to(BinaryOp::LooseEq),
                just(Token::LooseNotEq).to(BinaryOp::LooseNotEq),
            ))
            .then(comparison)
            .repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let and = equality.clone().foldl(
            just(Token::And).to(BinaryOp::And).then(equality).repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let or = and
            .clone()
            .foldl(
                just(Token::Or).to(BinaryOp::Or).then(and).repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed();

        // Conditional is right-associative: a ? b : c ? d : e
        or.then(
            just(Token::Question)
                .ignore_then(expr.clone())
                .then_ignore(just(Token::Colon))
                .then(expr)
                .or_not(),
        )
        .map(|(condition, branches)| match branches {
            Some((then, otherwise)) => Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            None => condition,
        })
    })
}
