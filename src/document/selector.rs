//! CSS-like selectors for scoped element queries
//!
//! Supported: type (`div`), universal (`*`), id (`#news`), class
//! (`.js-template`), attribute presence and equality (`[data-template]`,
//! `[type="text/x-dot-template"]`), compounds of those, the descendant
//! combinator (whitespace) and selector lists (`,`).

use logos::Logos;
use thiserror::Error;

use super::markup::ElementRef;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("invalid selector '{selector}': {message}")]
    Invalid { selector: String, message: String },
}

#[derive(Logos, Debug, Clone, PartialEq)]
enum SelectorToken {
    #[regex(r"[ \t\r\n]+")]
    Space,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("#")]
    Hash,
    #[token(".")]
    Dot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("=")]
    Equals,

    #[regex(r"[a-zA-Z0-9_-]+", |lex| lex.slice().to_string())]
    Name(String),

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    #[regex(r"'[^']*'", |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    Quoted(String),
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

/// One compound selector such as `script.js-template[data-template]`
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
    }

    fn matches(&self, el: &ElementRef<'_>) -> bool {
        if el.is_root() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(el.tag()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|a| match (el.attr(&a.name), &a.value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Each alternative is a descendant chain, outermost compound first
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let invalid = |message: &str| SelectorError::Invalid {
            selector: input.to_string(),
            message: message.to_string(),
        };

        let mut tokens = Vec::new();
        for (token, span) in SelectorToken::lexer(input.trim()).spanned() {
            match token {
                Ok(t) => tokens.push(t),
                Err(()) => {
                    let found = &input.trim()[span];
                    return Err(invalid(&format!("unexpected '{}'", found)));
                }
            }
        }
        if tokens.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut alternatives = Vec::new();
        let mut chain = Vec::new();
        let mut compound = Compound::default();
        let mut iter = tokens.into_iter().peekable();

        while let Some(token) = iter.next() {
            match token {
                SelectorToken::Space => {
                    // Whitespace before a comma is not a combinator
                    if matches!(iter.peek(), Some(SelectorToken::Comma)) {
                        continue;
                    }
                    if compound.is_empty() {
                        // Whitespace after a comma
                        continue;
                    }
                    chain.push(std::mem::take(&mut compound));
                }
                SelectorToken::Comma => {
                    if compound.is_empty() {
                        return Err(invalid("expected a selector before ','"));
                    }
                    chain.push(std::mem::take(&mut compound));
                    alternatives.push(std::mem::take(&mut chain));
                }
                SelectorToken::Star => {
                    if !compound.is_empty() {
                        return Err(invalid("'*' must start a compound selector"));
                    }
                    compound.universal = true;
                }
                SelectorToken::Name(name) => {
                    if !compound.is_empty() {
                        return Err(invalid(&format!(
                            "type selector '{}' must start a compound selector",
                            name
                        )));
                    }
                    compound.tag = Some(name.to_ascii_lowercase());
                }
                SelectorToken::Hash => match iter.next() {
                    Some(SelectorToken::Name(id)) => compound.id = Some(id),
                    _ => return Err(invalid("expected an id after '#'")),
                },
                SelectorToken::Dot => match iter.next() {
                    Some(SelectorToken::Name(class)) => compound.classes.push(class),
                    _ => return Err(invalid("expected a class name after '.'")),
                },
                SelectorToken::BracketOpen => {
                    skip_space(&mut iter);
                    let name = match iter.next() {
                        Some(SelectorToken::Name(name)) => name.to_ascii_lowercase(),
                        _ => return Err(invalid("expected an attribute name after '['")),
                    };
                    skip_space(&mut iter);
                    let value = if iter.peek() == Some(&SelectorToken::Equals) {
                        iter.next();
                        skip_space(&mut iter);
                        match iter.next() {
                            Some(SelectorToken::Name(v)) | Some(SelectorToken::Quoted(v)) => {
                                skip_space(&mut iter);
                                Some(v)
                            }
                            _ => return Err(invalid("expected an attribute value after '='")),
                        }
                    } else {
                        None
                    };
                    if iter.next() != Some(SelectorToken::BracketClose) {
                        return Err(invalid("expected ']'"));
                    }
                    compound.attributes.push(AttributeMatch { name, value });
                }
                SelectorToken::BracketClose | SelectorToken::Equals | SelectorToken::Quoted(_) => {
                    return Err(invalid("unexpected token outside an attribute selector"));
                }
            }
        }

        if compound.is_empty() {
            return Err(invalid("selector ends without a compound"));
        }
        chain.push(compound);
        alternatives.push(chain);

        Ok(Self { alternatives })
    }

    /// Whether `el` matches any alternative
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        self.alternatives.iter().any(|chain| matches_chain(chain, el))
    }
}

fn skip_space(iter: &mut std::iter::Peekable<std::vec::IntoIter<SelectorToken>>) {
    while iter.peek() == Some(&SelectorToken::Space) {
        iter.next();
    }
}

/// Match the last compound against `el` and the rest against its ancestors
fn matches_chain(chain: &[Compound], el: &ElementRef<'_>) -> bool {
    let Some((last, outer)) = chain.split_last() else {
        return false;
    };
    if !last.matches(el) {
        return false;
    }
    let mut ancestors = el.ancestors();
    outer
        .iter()
        .rev()
        .all(|compound| ancestors.any(|a| compound.matches(&a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MarkupDocument;

    const PAGE: &str = r#"
<div class="mod mod-news" id="news">
  <ul class="list">
    <li class="item first" data-id="1">one</li>
    <li class="item" data-id="2">two</li>
  </ul>
  <script class="js-template" data-template="row" type="text/x-dot-template">{{= x }}</script>
</div>
<div class="mod mod-footer" id="footer">
  <li class="item">outside</li>
</div>"#;

    fn ids(els: &[ElementRef<'_>]) -> Vec<String> {
        els.iter()
            .map(|e| e.id().or(e.attr("data-id")).unwrap_or(e.tag()).to_string())
            .collect()
    }

    #[test]
    fn test_class_selector() {
        let doc = MarkupDocument::parse(PAGE);
        let items = doc.select(".item").unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_compound_selector() {
        let doc = MarkupDocument::parse(PAGE);
        let first = doc.select("li.item.first").unwrap();
        assert_eq!(ids(&first), vec!["1"]);
    }

    #[test]
    fn test_attribute_selectors() {
        let doc = MarkupDocument::parse(PAGE);
        assert_eq!(ids(&doc.select("[data-id='2']").unwrap()), vec!["2"]);
        assert_eq!(
            ids(&doc.select("script[ type = \"text/x-dot-template\" ]").unwrap()),
            vec!["script"]
        );
        assert_eq!(doc.select("[data-template]").unwrap().len(), 1);
    }

    #[test]
    fn test_descendant_combinator() {
        let doc = MarkupDocument::parse(PAGE);
        let items = doc.select("#news .item").unwrap();
        assert_eq!(ids(&items), vec!["1", "2"]);
    }

    #[test]
    fn test_selector_list() {
        let doc = MarkupDocument::parse(PAGE);
        let found = doc.select("#footer , .first").unwrap();
        assert_eq!(ids(&found), vec!["1", "footer"]);
    }

    #[test]
    fn test_scoped_find() {
        let doc = MarkupDocument::parse(PAGE);
        let footer = doc.get_element_by_id("footer").unwrap();
        let items = footer.select(".item").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].inner_html(), "outside");
    }

    #[test]
    fn test_scope_excludes_itself() {
        let doc = MarkupDocument::parse(PAGE);
        let news = doc.get_element_by_id("news").unwrap();
        assert!(news.select(".mod").unwrap().is_empty());
    }

    #[test]
    fn test_universal_never_matches_root() {
        let doc = MarkupDocument::parse("<p></p>");
        let tags: Vec<_> = doc.select("*").unwrap().iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec!["html", "head", "body", "p"]);
    }

    #[test]
    fn test_invalid_selectors() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(Selector::parse(".").is_err());
        assert!(Selector::parse("[x").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("div > p").is_err());
    }
}
