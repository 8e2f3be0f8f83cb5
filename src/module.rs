//! Helpers every front-end module gets
//!
//! A [`Module`] is a named region of a page. It can query elements inside
//! its own region, subscribe to connector channels, and collect its
//! templates from inline markup and from its configuration.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ModuleConfig;
use crate::document::{DocumentLookup, ElementRef, MarkupDocument, SelectorError};
use crate::template::{CompiledTemplate, TemplateError, Templates};

/// Errors that can occur in module helpers
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Registration mode string not recognised
    #[error("invalid template registration '{value}': expected 'inline', 'all' or 'configured'")]
    InvalidRegistration { value: String },

    /// Configured templates requested but the module defines none
    #[error("module {module} has no templates")]
    NoTemplates { module: String },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("template '{name}' of module {module}: {source}")]
    Template {
        module: String,
        name: String,
        #[source]
        source: TemplateError,
    },
}

/// Where [`Module::register_templates`] collects templates from
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Registration {
    /// Elements in the module matching the template selector
    Inline,
    /// Inline templates, then configured templates
    All,
    /// The module's configured template collection
    #[default]
    Configured,
    /// An explicit collection of named template sources
    Collection(BTreeMap<String, String>),
}

impl FromStr for Registration {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Registration::Inline),
            "all" => Ok(Registration::All),
            "configured" => Ok(Registration::Configured),
            other => Err(ModuleError::InvalidRegistration {
                value: other.to_string(),
            }),
        }
    }
}

/// Pub/sub hub modules subscribe to
pub trait Sandbox {
    /// Subscribe the named module to a channel
    fn subscribe(&mut self, channel: &str, module: &str);
}

/// In-memory [`Sandbox`] that records subscriptions per channel
#[derive(Debug, Clone, Default)]
pub struct Connector {
    channels: HashMap<String, BTreeSet<String>>,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modules subscribed to `channel`, sorted by name
    pub fn subscribers(&self, channel: &str) -> Vec<&str> {
        self.channels
            .get(channel)
            .map(|subs| subs.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(|s| s.as_str())
    }
}

impl Sandbox for Connector {
    fn subscribe(&mut self, channel: &str, module: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(module.to_string());
    }
}

/// A named, scoped page region with helper methods
#[derive(Debug, Clone)]
pub struct Module<'doc> {
    name: String,
    scope: ElementRef<'doc>,
    config: ModuleConfig,
}

impl<'doc> Module<'doc> {
    /// Create a module rooted at `scope`
    pub fn new(name: impl Into<String>, scope: ElementRef<'doc>) -> Self {
        Self {
            name: name.into(),
            scope,
            config: ModuleConfig::default(),
        }
    }

    /// Attach configuration; a name in the config replaces the module's
    pub fn with_config(mut self, config: ModuleConfig) -> Self {
        if let Some(name) = &config.name {
            self.name = name.clone();
        }
        self.config = config;
        self
    }

    /// Find every module in the page
    ///
    /// A module is an element with class `mod` and a `mod-<name>` class;
    /// `mod-news-list` yields the name `NewsList`.
    pub fn discover(doc: &'doc MarkupDocument) -> Vec<Module<'doc>> {
        doc.root()
            .descendants()
            .into_iter()
            .filter(|el| el.has_class("mod"))
            .filter_map(|el| {
                let name = el
                    .classes()
                    .filter_map(|c| c.strip_prefix("mod-"))
                    .find(|rest| !rest.is_empty())
                    .map(module_name)?;
                Some(Module::new(name, el))
            })
            .collect()
    }

    /// The module's name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> ElementRef<'doc> {
        self.scope
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Elements inside the module matching `selector`
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'doc>>, ModuleError> {
        Ok(self.scope.select(selector)?)
    }

    /// Subscribe this module to each channel
    pub fn subscribe<S: Sandbox + ?Sized>(&self, sandbox: &mut S, channels: &[&str]) -> &Self {
        for channel in channels {
            tracing::debug!(module = %self.name, channel, "subscribing");
            sandbox.subscribe(channel, &self.name);
        }
        self
    }

    /// Compile the module's templates into a name → template map
    ///
    /// Later entries replace earlier ones with the same name, so with
    /// [`Registration::All`] a configured template overrides an inline one.
    pub fn register_templates<D: DocumentLookup>(
        &self,
        templates: &mut Templates<D>,
        registration: Registration,
    ) -> Result<BTreeMap<String, Arc<CompiledTemplate>>, ModuleError> {
        let mut registered = BTreeMap::new();

        if matches!(registration, Registration::Inline | Registration::All) {
            let selector = self.config.template_selector();
            for el in self.select(selector)? {
                let Some(name) = el.data("template") else {
                    tracing::warn!(
                        module = %self.name,
                        selector,
                        element = ?el,
                        "skipping inline template without data-template"
                    );
                    continue;
                };
                let compiled = self.compile(templates, name, el.inner_html())?;
                registered.insert(name.to_string(), compiled);
            }
        }

        let collection = match &registration {
            Registration::Inline => None,
            Registration::Collection(map) => Some(map),
            Registration::Configured | Registration::All => {
                Some(self.config.templates.as_ref().ok_or_else(|| {
                    ModuleError::NoTemplates {
                        module: self.name.clone(),
                    }
                })?)
            }
        };
        if let Some(collection) = collection {
            for (name, source) in collection {
                let compiled = self.compile(templates, name, source)?;
                registered.insert(name.clone(), compiled);
            }
        }

        tracing::info!(
            module = %self.name,
            count = registered.len(),
            "registered templates"
        );
        Ok(registered)
    }

    fn compile<D: DocumentLookup>(
        &self,
        templates: &mut Templates<D>,
        name: &str,
        source: &str,
    ) -> Result<Arc<CompiledTemplate>, ModuleError> {
        templates
            .compile(source)
            .map_err(|source| ModuleError::Template {
                module: self.name.clone(),
                name: name.to_string(),
                source,
            })
    }
}

/// `news-list` → `NewsList`
fn module_name(dashed: &str) -> String {
    dashed
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NullDocument;
    use crate::template::Context;

    const PAGE: &str = r#"
<div class="mod mod-news-list" id="news">
  <h2>News</h2>
  <script type="text/x-dot-template" class="js-template" data-template="item"><li>{{= title }}</li></script>
  <script type="text/x-dot-template" class="js-template"><li>nameless</li></script>
</div>
<div class="mod mod-footer">
  <script type="text/x-dot-template" class="js-template" data-template="copyright">&copy; {{= year }}</script>
</div>
<div class="mod">no name</div>"#;

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("news"), "News");
        assert_eq!(module_name("news-list"), "NewsList");
        assert_eq!(module_name("a--b"), "AB");
    }

    #[test]
    fn test_discover() {
        let doc = MarkupDocument::parse(PAGE);
        let modules = Module::discover(&doc);
        let names: Vec<_> = modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["NewsList", "Footer"]);
        assert_eq!(modules[0].scope().id(), Some("news"));
    }

    #[test]
    fn test_registration_from_str() {
        assert_eq!("inline".parse::<Registration>().unwrap(), Registration::Inline);
        assert_eq!("all".parse::<Registration>().unwrap(), Registration::All);
        let err = "everything".parse::<Registration>().unwrap_err();
        assert!(matches!(err, ModuleError::InvalidRegistration { .. }));
    }

    #[test]
    fn test_select_is_scoped() {
        let doc = MarkupDocument::parse(PAGE);
        let modules = Module::discover(&doc);
        assert_eq!(modules[0].select(".js-template").unwrap().len(), 2);
        assert_eq!(modules[1].select(".js-template").unwrap().len(), 1);
        assert!(modules[0].select("[").is_err());
    }

    #[test]
    fn test_subscribe_chains() {
        let doc = MarkupDocument::parse(PAGE);
        let module = Module::new("News", doc.root());
        let mut connector = Connector::new();

        module
            .subscribe(&mut connector, &["updates", "filters"])
            .subscribe(&mut connector, &["updates"]);

        assert_eq!(connector.subscribers("updates"), vec!["News"]);
        assert_eq!(connector.subscribers("filters"), vec!["News"]);
        assert!(connector.subscribers("other").is_empty());
    }

    #[test]
    fn test_register_inline_skips_nameless() {
        let doc = MarkupDocument::parse(PAGE);
        let module = Module::discover(&doc).remove(0);
        let mut templates = Templates::new(NullDocument);

        let registered = module
            .register_templates(&mut templates, Registration::Inline)
            .expect("Should register");
        assert_eq!(registered.keys().collect::<Vec<_>>(), vec!["item"]);

        let ctx: Context = [("title", "Hello")].into_iter().collect();
        assert_eq!(registered["item"].render(&ctx).unwrap(), "<li>Hello</li>");
    }

    #[test]
    fn test_register_configured_requires_templates() {
        let doc = MarkupDocument::parse(PAGE);
        let module = Module::new("Empty", doc.root());
        let mut templates = Templates::new(NullDocument);

        let err = module
            .register_templates(&mut templates, Registration::default())
            .unwrap_err();
        assert!(matches!(err, ModuleError::NoTemplates { ref module } if module == "Empty"));
        assert_eq!(err.to_string(), "module Empty has no templates");
    }

    #[test]
    fn test_register_collection() {
        let doc = MarkupDocument::parse(PAGE);
        let module = Module::new("Nav", doc.root());
        let mut templates = Templates::new(NullDocument);
        let collection = BTreeMap::from([("link".to_string(), "<a>{{= label }}</a>".to_string())]);

        let registered = module
            .register_templates(&mut templates, Registration::Collection(collection))
            .expect("Should register");
        assert_eq!(registered.len(), 1);
    }

    #[test]
    fn test_register_reports_template_name() {
        let doc = MarkupDocument::parse(PAGE);
        let module = Module::new("Nav", doc.root())
            .with_config(ModuleConfig::default().with_template("broken", "{{= }}"));
        let mut templates = Templates::new(NullDocument);

        let err = module
            .register_templates(&mut templates, Registration::Configured)
            .unwrap_err();
        assert!(matches!(err, ModuleError::Template { ref name, .. } if name == "broken"));
    }
}
