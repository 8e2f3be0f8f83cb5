//! Behavioural tests for template compilation, caching and rendering

use std::cell::Cell;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use terrific_ext::template::EvalError;
use terrific_ext::{
    render, Context, DocumentLookup, MarkupDocument, MemoryDocument, Rendered, TemplateError,
    Templates, Value,
};

const PAGE: &str = include_str!("fixtures/page.html");

/// Lookup that counts how often the document is consulted
struct CountingDocument {
    inner: MemoryDocument,
    lookups: Cell<usize>,
}

impl CountingDocument {
    fn new(elements: &[(&str, &str)]) -> Self {
        Self {
            inner: MemoryDocument::with_elements(elements.iter().copied()),
            lookups: Cell::new(0),
        }
    }
}

impl DocumentLookup for CountingDocument {
    fn inner_content(&self, id: &str) -> Option<String> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.inner_content(id)
    }
}

fn ctx<const N: usize>(pairs: [(&str, Value); N]) -> Context {
    pairs.into_iter().collect()
}

#[test]
fn test_substitutes_expressions() {
    let data = ctx([("name", Value::from("World"))]);
    assert_eq!(render("Hello {{= name }}!", &data).unwrap(), "Hello World!");
}

#[test]
fn test_adjacent_markers() {
    let data = ctx([("a", Value::from(1)), ("b", Value::from(2))]);
    assert_eq!(render("{{= a }}-{{= b }}", &data).unwrap(), "1-2");
}

#[test]
fn test_literal_quotes_are_preserved() {
    let data = ctx([("x", Value::from("ok"))]);
    assert_eq!(render("It's {{= x }}", &data).unwrap(), "It's ok");
    assert_eq!(render("'{{= x }}'", &data).unwrap(), "'ok'");
    assert_eq!(render("\"{{= x }}\"", &data).unwrap(), "\"ok\"");
}

#[test]
fn test_quotes_inside_expressions_delimit_strings() {
    let empty = Context::new();
    assert_eq!(render("{{= 'a' }}", &empty).unwrap(), "a");
    assert_eq!(render("{{= \"it's\" }}", &empty).unwrap(), "it's");
    assert_eq!(render("[{{= 'a' + \"b\" }}]", &empty).unwrap(), "[ab]");
    assert_eq!(render("{{= 'a'}}", &empty).unwrap(), "a");
    assert_eq!(render("<{{= \"b\"}}>", &empty).unwrap(), "<b>");
}

#[test]
fn test_unicode_escapes_in_strings() {
    let empty = Context::new();
    assert_eq!(render("{{= 'caf\\u00e9' }}", &empty).unwrap(), "café");
    assert_eq!(render("{{= 1. + 1 }}", &empty).unwrap(), "2");
}

#[test]
fn test_whitespace_is_normalized() {
    let data = ctx([("x", Value::from(1))]);
    assert_eq!(render("a\nb\tc\r{{= x }}", &data).unwrap(), "a b c 1");
}

#[test]
fn test_rendering_is_deterministic() {
    let data = ctx([
        ("title", Value::from("News")),
        ("count", Value::from(3)),
    ]);
    let source = "<h1>{{= title }}</h1><p>{{= count === 0 ? 'none' : count + ' items' }}</p>";
    let first = render(source, &data).unwrap();
    let second = render(source, &data).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "<h1>News</h1><p>3 items</p>");
}

#[test]
fn test_identifier_compiled_once() {
    let doc = CountingDocument::new(&[("greeting", "Hi {{= who }}")]);
    let mut templates = Templates::new(&doc);

    let first = templates.compile("greeting").expect("Should compile");
    let second = templates.compile("greeting").expect("Should compile");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(doc.lookups.get(), 1);
    assert_eq!(templates.cache().len(), 1);
}

#[test]
fn test_text_source_not_cached() {
    let doc = CountingDocument::new(&[("x", "unused")]);
    let mut templates = Templates::new(&doc);

    templates.compile(" {{= x }} ").expect("Should compile");
    templates.compile(" {{= x }} ").expect("Should compile");

    assert!(templates.cache().is_empty());
    assert_eq!(doc.lookups.get(), 0);
}

#[test]
fn test_deferred_rendering() {
    let doc = MemoryDocument::with_elements([("row", "<td>{{= n }}</td>")]);
    let mut templates = Templates::new(doc);

    let template = templates
        .template("row", None)
        .expect("Should compile")
        .into_template()
        .expect("Should be a template");

    let rows: Vec<String> = (1..=3)
        .map(|n| template.render(&ctx([("n", Value::from(n))])).unwrap())
        .collect();
    assert_eq!(rows, vec!["<td>1</td>", "<td>2</td>", "<td>3</td>"]);
}

#[test]
fn test_immediate_rendering() {
    let mut templates = Templates::new(MemoryDocument::new());
    let data = ctx([("n", Value::from(7))]);

    let result = templates.template("n = {{= n }}", Some(&data)).unwrap();
    assert!(matches!(result, Rendered::Text(ref s) if s == "n = 7"));
}

#[test]
fn test_undefined_variable_fails_at_render_time() {
    let template = terrific_ext::compile("{{= missing }}").expect("Should compile");
    let err = template.render(&Context::new()).unwrap_err();
    assert_eq!(
        err,
        EvalError::UndefinedVariable {
            name: "missing".to_string()
        }
    );
    assert_eq!(err.to_string(), "missing is not defined");
}

#[test]
fn test_nullish_values_render_empty() {
    let data = ctx([
        ("nothing", Value::Null),
        ("user", Value::from(serde_json::json!({}))),
    ]);
    assert_eq!(render("[{{= nothing }}|{{= user.name }}]", &data).unwrap(), "[|]");
}

#[test]
fn test_syntax_errors_are_reported_at_compile_time() {
    for source in ["{{= name ", "{{= }}", "{{ name }}", "oops }}", "{{= 1 + }}"] {
        let err = terrific_ext::compile(source).unwrap_err();
        assert!(
            matches!(err, TemplateError::Parse { .. }),
            "expected a parse error for {:?}, got {:?}",
            source,
            err
        );
    }
}

#[test]
fn test_parse_error_report_points_at_source() {
    let err = terrific_ext::compile("Hi {{= name + }}").unwrap_err();
    let report = err.report("greeting.html");
    assert!(report.contains("greeting.html"));
    assert!(report.contains("Hi {{= name + }}"));
}

#[test]
fn test_parse_error_report_on_non_ascii_template() {
    let source = "ééééééééé {{= name + }}";
    let err = terrific_ext::compile(source).unwrap_err();
    let report = err.report("t");
    assert!(report.contains(source), "report lost the source line:\n{}", report);
}

#[test]
fn test_lookup_survives_angle_bracket_in_attribute() {
    let page = MarkupDocument::parse(r#"<div title="a>b" id="tpl">{{= x }}</div>"#);
    assert_eq!(page.inner_content("tpl"), Some("{{= x }}".to_string()));

    let mut templates = Templates::new(&page);
    let data = ctx([("x", Value::from("found"))]);
    assert_eq!(templates.render("tpl", &data).unwrap(), "found");
}

#[test]
fn test_markup_page_lookup() {
    let page = MarkupDocument::parse(PAGE);
    let mut templates = Templates::new(&page);
    let data = ctx([
        ("title", Value::from("Rust 2024")),
        (
            "author",
            Value::from(serde_json::json!({ "name": "Ferris" })),
        ),
    ]);

    assert_eq!(
        templates.render("teaser", &data).unwrap(),
        "<h2>Rust 2024</h2>"
    );
    assert_eq!(templates.render("byline", &data).unwrap(), "by Ferris");
}

#[test]
fn test_alias_shares_compiled_template() {
    let page = MarkupDocument::parse(PAGE);
    let mut templates = Templates::new(&page);

    let alias = templates.compile("teaserAlias").expect("Should compile");
    let target = templates.compile("teaser").expect("Should compile");

    assert!(Arc::ptr_eq(&alias, &target));
    let mut keys: Vec<_> = templates.cache().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["teaser", "teaserAlias"]);
}

#[test]
fn test_missing_element() {
    let page = MarkupDocument::parse(PAGE);
    let mut templates = Templates::new(&page);
    let err = templates.compile("nowhere").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"template element not found: #nowhere");
}

#[test]
fn test_circular_reference() {
    let doc = MemoryDocument::with_elements([("a", "b"), ("b", "a")]);
    let mut templates = Templates::new(doc);
    let err = templates.compile("a").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"circular template reference detected: a -> b -> a");
    assert!(templates.cache().is_empty());
}
