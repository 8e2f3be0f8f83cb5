//! Document access for id-referenced templates and scoped selection
//!
//! Templates referenced by id live in the page that hosts the modules. This
//! module provides the lookup seam used by the template cache, plus a small
//! HTML element index that modules query with CSS-like selectors.

mod markup;
mod selector;

pub use markup::{ElementRef, MarkupDocument};
pub use selector::{Selector, SelectorError};

use std::collections::HashMap;

/// Trait for fetching the inner content of an element by id.
///
/// Implementations return `None` when no element has that id.
pub trait DocumentLookup {
    fn inner_content(&self, id: &str) -> Option<String>;
}

impl<T: DocumentLookup + ?Sized> DocumentLookup for &T {
    fn inner_content(&self, id: &str) -> Option<String> {
        (**self).inner_content(id)
    }
}

/// Lookup that never finds anything.
///
/// For callers that only ever pass literal template text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDocument;

impl DocumentLookup for NullDocument {
    fn inner_content(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Lookup backed by an in-memory map of id to content.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: HashMap<String, String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element's content
    pub fn insert(&mut self, id: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.elements.insert(id.into(), content.into());
        self
    }

    /// Create a document with the given elements
    pub fn with_elements(
        elements: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut doc = Self::new();
        for (id, content) in elements {
            doc.insert(id, content);
        }
        doc
    }
}

impl DocumentLookup for MemoryDocument {
    fn inner_content(&self, id: &str) -> Option<String> {
        self.elements.get(id).cloned()
    }
}

impl DocumentLookup for MarkupDocument {
    fn inner_content(&self, id: &str) -> Option<String> {
        self.get_element_by_id(id).map(|el| el.inner_html().to_string())
    }
}
