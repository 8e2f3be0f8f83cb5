//! terrific-ext - helpers for front-end modules
//!
//! This library provides micro-templating with an id-keyed template cache,
//! a small HTML element index for template lookup and scoped selection, and
//! module helpers that collect a module's templates and subscribe it to
//! connector channels.
//!
//! # Example
//!
//! ```rust
//! use terrific_ext::{render, Context};
//!
//! let ctx: Context = [("name", "World")].into_iter().collect();
//! let html = render("Hello {{= name }}!", &ctx).unwrap();
//! assert_eq!(html, "Hello World!");
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod module;
pub mod template;

pub use config::{ConfigError, ModuleConfig};
pub use document::{DocumentLookup, ElementRef, MarkupDocument, MemoryDocument, NullDocument};
pub use error::ParseError;
pub use module::{Connector, Module, ModuleError, Registration, Sandbox};
pub use template::{CompiledTemplate, Context, Rendered, TemplateError, Templates, Value};

/// Render literal template text with a data context
///
/// There is no document here, so a source made only of word characters
/// fails with [`TemplateError::ElementNotFound`]. Use [`Templates`] with a
/// [`DocumentLookup`] to render templates by element id.
///
/// # Example
///
/// ```rust
/// use terrific_ext::{render, Context};
///
/// let mut ctx = Context::new();
/// ctx.insert("a", 1);
/// ctx.insert("b", 2);
///
/// assert_eq!(render("{{= a }}-{{= b }}", &ctx).unwrap(), "1-2");
/// ```
pub fn render(source: &str, data: &Context) -> Result<String, TemplateError> {
    Templates::new(NullDocument).render(source, data)
}

/// Compile literal template text for later rendering
///
/// # Example
///
/// ```rust
/// use terrific_ext::{compile, Context};
///
/// let greet = compile("Hi {{= who }}").unwrap();
/// let ctx: Context = [("who", "there")].into_iter().collect();
/// assert_eq!(greet.render(&ctx).unwrap(), "Hi there");
/// ```
pub fn compile(source: &str) -> Result<std::sync::Arc<CompiledTemplate>, TemplateError> {
    Templates::new(NullDocument).compile(source)
}
