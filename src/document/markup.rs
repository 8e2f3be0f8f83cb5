//! HTML element index built on html5ever
//!
//! The page is parsed into an `RcDom` and flattened into a vector of
//! elements in document order, each with its attributes, parent and inner
//! markup. The DOM itself is dropped afterwards so a `MarkupDocument` is
//! plain owned data.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use markup5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use super::selector::{Selector, SelectorError};

/// Elements whose content is raw text, not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
    /// Markup between the start and end tag
    inner: String,
}

/// An HTML page indexed by element
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    source: String,
    /// Elements in document order; index 0 is the synthetic `#document` root
    elements: Vec<Element>,
}

impl MarkupDocument {
    /// Parse an HTML string and index its elements
    ///
    /// Parsing follows the HTML5 algorithm, so malformed markup is repaired
    /// the way a browser would repair it: missing `html`/`head`/`body` are
    /// added, unclosed elements are closed and stray end tags are dropped.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut elements = vec![Element {
            tag: "#document".to_string(),
            attributes: Vec::new(),
            parent: None,
            inner: serialize_children(&dom.document),
        }];
        for child in dom.document.children.borrow().iter() {
            collect(child, 0, &mut elements);
        }

        Self {
            source: html.to_string(),
            elements,
        }
    }

    /// Load and index an HTML file
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// The synthetic root element spanning the whole document
    pub fn root(&self) -> ElementRef<'_> {
        ElementRef {
            doc: self,
            index: 0,
        }
    }

    /// First element in document order with the given id
    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.all().find(|el| el.id() == Some(id))
    }

    /// Elements in the whole document matching `selector`
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, SelectorError> {
        self.root().select(selector)
    }

    /// Number of elements, not counting the root
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The HTML the document was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every element except the root, in document order
    fn all(&self) -> impl Iterator<Item = ElementRef<'_>> {
        (1..self.elements.len()).map(move |index| ElementRef { doc: self, index })
    }
}

/// Flatten element nodes below `handle` in document order
fn collect(handle: &Handle, parent: usize, elements: &mut Vec<Element>) {
    let NodeData::Element { name, attrs, .. } = &handle.data else {
        return;
    };

    let tag = name.local.to_string();
    let inner = if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
        text_content(handle)
    } else {
        serialize_children(handle)
    };
    let index = elements.len();
    elements.push(Element {
        attributes: attributes(attrs),
        parent: Some(parent),
        tag,
        inner,
    });

    for child in handle.children.borrow().iter() {
        collect(child, index, elements);
    }
}

fn attributes(attrs: &RefCell<Vec<Attribute>>) -> Vec<(String, String)> {
    attrs
        .borrow()
        .iter()
        .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
        .collect()
}

/// Concatenated text children, as written in the source
fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Serialized children of `handle`
fn serialize_children(handle: &Handle) -> String {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    let node: SerializableHandle = handle.clone().into();
    match serialize(&mut buf, &node, opts) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => String::new(),
    }
}

/// A borrowed handle to one element of a [`MarkupDocument`]
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    doc: &'a MarkupDocument,
    index: usize,
}

impl<'a> ElementRef<'a> {
    fn element(&self) -> &'a Element {
        &self.doc.elements[self.index]
    }

    /// Lowercase tag name (`#document` for the root)
    pub fn tag(&self) -> &'a str {
        &self.element().tag
    }

    pub fn is_root(&self) -> bool {
        self.index == 0
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element()
            .attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&'a str> {
        self.attr("id")
    }

    /// A `data-*` attribute by key, e.g. `data("template")`
    pub fn data(&self, key: &str) -> Option<&'a str> {
        self.attr(&format!("data-{}", key))
    }

    pub fn classes(&self) -> impl Iterator<Item = &'a str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Raw markup between the start and end tag
    pub fn inner_html(&self) -> &'a str {
        &self.element().inner
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.element().parent.map(|index| ElementRef {
            doc: self.doc,
            index,
        })
    }

    /// Parent, grandparent, ... up to and including the root
    pub fn ancestors(&self) -> impl Iterator<Item = ElementRef<'a>> {
        std::iter::successors(self.parent(), |el| el.parent())
    }

    /// Whether `self` is strictly inside `other`
    pub fn is_descendant_of(&self, other: &ElementRef<'_>) -> bool {
        self.ancestors().any(|a| a.index == other.index)
    }

    /// Direct children in document order
    pub fn children(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        let parent = self.index;
        (parent + 1..doc.elements.len())
            .filter(move |&i| doc.elements[i].parent == Some(parent))
            .map(move |index| ElementRef { doc, index })
    }

    /// Every element inside this one, in document order
    pub fn descendants(&self) -> Vec<ElementRef<'a>> {
        let this = *self;
        self.doc
            .all()
            .filter(|el| el.index > this.index && el.is_descendant_of(&this))
            .collect()
    }

    /// Descendants matching a parsed selector
    pub fn find(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.descendants()
            .into_iter()
            .filter(|el| selector.matches(el))
            .collect()
    }

    /// Descendants matching a selector string
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.find(&selector))
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.index == other.index
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ElementRef");
        s.field("tag", &self.tag());
        if let Some(id) = self.id() {
            s.field("id", &id);
        }
        s.field("index", &self.index).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <!-- <div id="commented">ignored</div> -->
  <div class="mod mod-news" id="news">
    <h2 class="title">News</h2>
    <br>
    <img src="a.png"/>
    <script type="text/x-dot-template" id="teaser" class="js-template" data-template="teaser"><li>{{= a < b ? '<b>' : x }}</li></script>
  </div>
</body>
</html>"#;

    #[test]
    fn test_get_element_by_id() {
        let doc = MarkupDocument::parse(PAGE);
        let news = doc.get_element_by_id("news").expect("Should find #news");
        assert_eq!(news.tag(), "div");
        assert!(news.has_class("mod-news"));
        assert!(doc.get_element_by_id("commented").is_none());
    }

    #[test]
    fn test_script_content_is_raw() {
        let doc = MarkupDocument::parse(PAGE);
        let script = doc.get_element_by_id("teaser").expect("Should find #teaser");
        assert_eq!(
            script.inner_html(),
            "<li>{{= a < b ? '<b>' : x }}</li>"
        );
        assert_eq!(script.data("template"), Some("teaser"));
        assert_eq!(script.attr("TYPE"), Some("text/x-dot-template"));
        assert_eq!(script.children().count(), 0);
    }

    #[test]
    fn test_void_and_self_closing_elements() {
        let doc = MarkupDocument::parse(PAGE);
        let news = doc.get_element_by_id("news").unwrap();
        let tags: Vec<_> = news.children().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["h2", "br", "img", "script"]);
    }

    #[test]
    fn test_parent_chain() {
        let doc = MarkupDocument::parse(PAGE);
        let title = doc.select(".title").unwrap()[0];
        let ancestors: Vec<_> = title.ancestors().map(|a| a.tag()).collect();
        assert_eq!(ancestors, vec!["div", "body", "html", "#document"]);
    }

    #[test]
    fn test_unclosed_element_is_closed() {
        let doc = MarkupDocument::parse("<div id=\"a\">open <p>para");
        assert_eq!(doc.get_element_by_id("a").unwrap().inner_html(), "open <p>para</p>");
    }

    #[test]
    fn test_unmatched_end_tag_dropped() {
        let doc = MarkupDocument::parse("<div id=\"a\">x</span>y</div>");
        assert_eq!(doc.get_element_by_id("a").unwrap().inner_html(), "xy");
    }

    #[test]
    fn test_angle_bracket_in_attribute_value() {
        let doc = MarkupDocument::parse(r#"<div title="a>b" id="tpl">{{= x }}</div>"#);
        let el = doc.get_element_by_id("tpl").expect("Should find #tpl");
        assert_eq!(el.attr("title"), Some("a>b"));
        assert_eq!(el.inner_html(), "{{= x }}");
    }

    #[test]
    fn test_element_markup_is_serialized() {
        let doc = MarkupDocument::parse(r#"<div id="d"><b>x</b> &amp; y<br></div>"#);
        assert_eq!(doc.get_element_by_id("d").unwrap().inner_html(), "<b>x</b> &amp; y<br>");
    }

    #[test]
    fn test_script_entities_stay_raw() {
        let doc = MarkupDocument::parse(r#"<script id="s">&copy; {{= year }}</script>"#);
        assert_eq!(doc.get_element_by_id("s").unwrap().inner_html(), "&copy; {{= year }}");
    }

    #[test]
    fn test_attribute_forms() {
        let doc = MarkupDocument::parse(r#"<input id=q disabled value='a b' data-x="1">"#);
        let input = doc.get_element_by_id("q").unwrap();
        assert_eq!(input.attr("disabled"), Some(""));
        assert_eq!(input.attr("value"), Some("a b"));
        assert_eq!(input.data("x"), Some("1"));
        // html, head and body are implied
        assert_eq!(doc.len(), 4);
    }
}
