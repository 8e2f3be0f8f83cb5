//! Dynamic values and the data context templates are rendered against

use std::collections::BTreeMap;

/// A value produced by a template expression or supplied in a [`Context`].
///
/// The variants and their coercions follow the loose typing template authors
/// expect from a browser scripting environment: `undefined` and `null` are
/// distinct, numbers are always floating point, and everything can be
/// turned into a string.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A missing value (unknown property, missing map key)
    #[default]
    Undefined,
    /// An explicit null
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Truthiness used by `!`, `&&`, `||` and `?:`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Convert to a string the way string concatenation does
    ///
    /// `undefined` and `null` spell themselves out here. Use
    /// [`Value::render`] for interpolation output, where they vanish.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(|v| v.render())
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object Object]".to_string(),
        }
    }

    /// Convert to the text emitted for an interpolation
    ///
    /// - Undefined / Null: empty string
    /// - everything else: same as [`Value::to_js_string`]
    pub fn render(&self) -> String {
        if self.is_nullish() {
            String::new()
        } else {
            self.to_js_string()
        }
    }

    /// Numeric coercion used by arithmetic and relational operators
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::List(_) => parse_number(&self.to_js_string()),
            Value::Map(_) => f64::NAN,
        }
    }

    /// Read a named property
    ///
    /// Returns `None` when the value has no properties at all (null and
    /// undefined), and `Some(Value::Undefined)` when the property is merely
    /// absent.
    pub fn property(&self, name: &str) -> Option<Value> {
        let found = match self {
            Value::Undefined | Value::Null => return None,
            Value::Map(m) => m.get(name).cloned(),
            Value::List(items) => {
                if name == "length" {
                    Some(Value::Number(items.len() as f64))
                } else {
                    name.parse::<usize>().ok().and_then(|i| items.get(i).cloned())
                }
            }
            Value::String(s) => {
                if name == "length" {
                    Some(Value::Number(s.encode_utf16().count() as f64))
                } else {
                    name.parse::<usize>()
                        .ok()
                        .and_then(|i| s.chars().nth(i))
                        .map(|c| Value::String(c.to_string()))
                }
            }
            Value::Bool(_) | Value::Number(_) => None,
        };
        Some(found.unwrap_or(Value::Undefined))
    }

    /// Strict equality (`===`)
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    /// Loose equality (`==`)
    ///
    /// Null and undefined equal each other; mixed primitives compare as
    /// numbers.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Number(_) | Value::String(_) | Value::Bool(_),
                Value::Number(_) | Value::String(_) | Value::Bool(_),
            ) => self.to_number() == other.to_number(),
            _ => self == other,
        }
    }
}

/// Format a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse().unwrap_or(f64::NAN)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i as f64),
            toml::Value::Float(f) => Value::Number(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => {
                Value::Map(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// The data a template is rendered against
///
/// Every key is available to expressions as a bare name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    variables: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Build a context from a value that must be a map
    ///
    /// Returns `None` for any other kind of value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(variables) => Some(Self { variables }),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}
