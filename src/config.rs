//! Module configuration and data-context loading
//!
//! A module config plays the role of the properties a module definition
//! carries in code: its name, selector overrides and a collection of
//! predefined templates.
//!
//! ```toml
//! name = "News"
//!
//! [selectors]
//! template = ".js-template"
//!
//! [templates]
//! teaser = "<h2>{{= title }}</h2>"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::template::{Context, Value};

/// Default selector for inline template elements
pub const DEFAULT_TEMPLATE_SELECTOR: &str = ".js-template";

/// Errors that can occur when loading configuration or data files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Data context must be a table/object at the top level, found {kind}")]
    NotAMap { kind: &'static str },
}

/// Selector overrides for a module
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Selectors {
    /// Selector for inline template elements
    pub template: Option<String>,
}

/// Configuration for a module
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ModuleConfig {
    /// Module name; discovered from markup when absent
    pub name: Option<String>,
    #[serde(default)]
    pub selectors: Selectors,
    /// Predefined templates by name
    pub templates: Option<BTreeMap<String, String>>,
}

impl ModuleConfig {
    /// Load module config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load module config from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Selector for inline templates, falling back to the default
    pub fn template_selector(&self) -> &str {
        self.selectors
            .template
            .as_deref()
            .unwrap_or(DEFAULT_TEMPLATE_SELECTOR)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_template_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.template = Some(selector.into());
        self
    }

    /// Add a predefined template
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), source.into());
        self
    }
}

/// Load a data context from a `.json` or `.toml` file
///
/// Files with any other extension are parsed as JSON.
pub fn load_context(path: &Path) -> Result<Context, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    if is_toml {
        context_from_toml(&content)
    } else {
        context_from_json(&content)
    }
}

/// Parse a data context from a JSON object
pub fn context_from_json(content: &str) -> Result<Context, ConfigError> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    into_context(Value::from(json))
}

/// Parse a data context from a TOML document
pub fn context_from_toml(content: &str) -> Result<Context, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    into_context(Value::from(toml::Value::Table(table)))
}

fn into_context(value: Value) -> Result<Context, ConfigError> {
    let kind = value.kind();
    Context::from_value(value).ok_or(ConfigError::NotAMap { kind })
}
