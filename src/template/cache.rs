//! Template cache and the compile-or-render entry point

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::document::DocumentLookup;
use crate::error::ParseError;

use super::compiler::CompiledTemplate;
use super::eval::EvalError;
use super::value::Context;

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template source failed to compile
    #[error("template syntax error: {}", format_parse_errors(.errors))]
    Parse {
        template: String,
        errors: Vec<ParseError>,
    },

    /// Rendering failed
    #[error("template render error: {0}")]
    Eval(#[from] EvalError),

    /// No element with the requested id in the document
    #[error("template element not found: #{id}")]
    ElementNotFound { id: String },

    /// Element content names another element that leads back to the first
    #[error("circular template reference detected: {chain}")]
    CircularReference { chain: String },
}

impl TemplateError {
    /// Format parse errors with source context, or fall back to `Display`
    pub fn report(&self, filename: &str) -> String {
        match self {
            TemplateError::Parse { template, errors } => errors
                .iter()
                .map(|e| e.format(template, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether `source` is a pure identifier: ASCII letters, digits and `_` only
///
/// The empty string qualifies, since it contains no non-word character.
pub fn is_identifier(source: &str) -> bool {
    source.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Compiled templates keyed by element id
///
/// Entries are only ever added. The cache grows by one entry per distinct
/// identifier and is never trimmed; it lives as long as its owner.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: HashMap<String, Arc<CompiledTemplate>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<CompiledTemplate>> {
        self.entries.get(key).cloned()
    }

    /// Store a template under `key`, replacing any previous entry
    pub fn insert(&mut self, key: impl Into<String>, template: Arc<CompiledTemplate>) {
        self.entries.insert(key.into(), template);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all cached keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }
}

/// Result of [`Templates::template`]
#[derive(Debug, Clone)]
pub enum Rendered {
    /// No data was given: the reusable template
    Template(Arc<CompiledTemplate>),
    /// Data was given: the rendered text
    Text(String),
}

impl Rendered {
    pub fn into_template(self) -> Option<Arc<CompiledTemplate>> {
        match self {
            Rendered::Template(t) => Some(t),
            Rendered::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Rendered::Text(s) => Some(s),
            Rendered::Template(_) => None,
        }
    }
}

/// Micro-template compiler with an id-keyed cache
///
/// Sources that are pure identifiers name an element in the document; its
/// inner content is compiled once and cached under the identifier. Any
/// other source is template text and is compiled on every call.
#[derive(Debug)]
pub struct Templates<D> {
    document: D,
    cache: TemplateCache,
}

impl<D: DocumentLookup> Templates<D> {
    pub fn new(document: D) -> Self {
        Self {
            document,
            cache: TemplateCache::new(),
        }
    }

    /// Compile `source`, rendering it right away when `data` is given
    pub fn template(
        &mut self,
        source: &str,
        data: Option<&Context>,
    ) -> Result<Rendered, TemplateError> {
        let template = self.compile(source)?;
        match data {
            Some(ctx) => Ok(Rendered::Text(template.render(ctx)?)),
            None => Ok(Rendered::Template(template)),
        }
    }

    /// Compile `source` without rendering
    pub fn compile(&mut self, source: &str) -> Result<Arc<CompiledTemplate>, TemplateError> {
        let mut chain = Vec::new();
        self.compile_inner(source, &mut chain)
    }

    /// Compile `source` and render it with `data`
    pub fn render(&mut self, source: &str, data: &Context) -> Result<String, TemplateError> {
        Ok(self.compile(source)?.render(data)?)
    }

    fn compile_inner(
        &mut self,
        source: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if !is_identifier(source) {
            tracing::trace!(len = source.len(), "compiling inline template");
            return compile_source(source);
        }

        if let Some(cached) = self.cache.get(source) {
            tracing::debug!(id = source, "template cache hit");
            return Ok(cached);
        }

        // Check for circular references
        if chain.iter().any(|id| id == source) {
            return Err(TemplateError::CircularReference {
                chain: format!("{} -> {}", chain.join(" -> "), source),
            });
        }

        tracing::debug!(id = source, "template cache miss");
        let content = self
            .document
            .inner_content(source)
            .ok_or_else(|| TemplateError::ElementNotFound {
                id: source.to_string(),
            })?;

        chain.push(source.to_string());
        let compiled = self.compile_inner(&content, chain);
        chain.pop();
        let compiled = compiled?;

        self.cache.insert(source, Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn document(&self) -> &D {
        &self.document
    }
}

fn compile_source(source: &str) -> Result<Arc<CompiledTemplate>, TemplateError> {
    CompiledTemplate::compile(source)
        .map(Arc::new)
        .map_err(|errors| TemplateError::Parse {
            template: source.to_string(),
            errors,
        })
}
