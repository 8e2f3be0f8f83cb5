//! Micro-templating for modules
//!
//! Templates are plain text with `{{= expression }}` markers. Each marker is
//! replaced by the value of its expression, evaluated with every key of the
//! data context available as a bare name.
//!
//! # Example
//!
//! ```text
//! <li class="teaser">{{= title }} ({{= comments.length }} comments)</li>
//! ```
//!
//! Expressions cover literals (numbers, quoted strings with `\n`, `\t`,
//! `\uXXXX` and `\u{...}` escapes, `true`, `false`, `null`, `undefined`),
//! bare names, `.name` and `[index]` access, unary `! - +`, arithmetic,
//! comparison, equality, `&&`, `||` and `?:`. Names are ASCII only:
//! a letter, `_` or `$` followed by letters, digits, `_` or `$`. Non-ASCII
//! text belongs in string literals or the data context.
//!
//! A source made only of word characters (`[A-Za-z0-9_]`) is not template
//! text but the id of an element whose content is the template. Those are
//! compiled once and cached; see [`Templates`].

pub mod ast;
mod cache;
mod compiler;
mod eval;
pub mod grammar;
pub mod lexer;
mod scanner;
pub mod value;

pub use cache::{is_identifier, Rendered, TemplateCache, TemplateError, Templates};
pub use compiler::CompiledTemplate;
pub use eval::{evaluate, EvalError};
pub use scanner::scan;
pub use value::{Context, Value};
