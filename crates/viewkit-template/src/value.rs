/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template data values.
//!
//! Templates execute against a [`TemplateValue`]. Values are usually built
//! from `serde_json::Value` or from any `Serialize` type via
//! [`TemplateValue::from_serialize`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A value that can be used in template evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TemplateValue {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// An integer.
    Int(i64),

    /// A floating point number.
    Float(f64),

    /// A string value.
    String(String),

    /// A list of values.
    List(Vec<TemplateValue>),

    /// A map of string keys to values, ordered by key.
    Map(BTreeMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Convert any serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::from)
    }

    /// Build a map value from `(key, value)` pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<TemplateValue>,
    {
        TemplateValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Check if this value is "truthy" for `if`, `with` and `range`.
    ///
    /// False, null, zero, and empty strings, lists and maps are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::Bool(b) => *b,
            TemplateValue::Int(i) => *i != 0,
            TemplateValue::Float(f) => *f != 0.0,
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Map(m) => !m.is_empty(),
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["employee", "salary"])` on a Map containing
    /// `{"employee": {"salary": 50000}}` returns the salary value.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&TemplateValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            TemplateValue::Map(m) => m.get(first.as_ref()).and_then(|v| v.get_path(rest)),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            TemplateValue::Null => "nil",
            TemplateValue::Bool(_) => "bool",
            TemplateValue::Int(_) => "int",
            TemplateValue::Float(_) => "float",
            TemplateValue::String(_) => "string",
            TemplateValue::List(_) => "list",
            TemplateValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TemplateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TemplateValue::Int(i) => Some(*i as f64),
            TemplateValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render this value as template output.
    ///
    /// Null renders as the empty string; lists and maps use a bracketed form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Null => Ok(()),
            TemplateValue::Bool(b) => write!(f, "{}", b),
            TemplateValue::Int(i) => write!(f, "{}", i),
            TemplateValue::Float(x) => write!(f, "{}", x),
            TemplateValue::String(s) => f.write_str(s),
            TemplateValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            TemplateValue::Map(m) => {
                f.write_str("map[")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<serde_json::Value> for TemplateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => TemplateValue::Int(i),
                None => TemplateValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => TemplateValue::String(s),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            serde_json::Value::Object(map) => TemplateValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Int(value)
    }
}

impl From<i32> for TemplateValue {
    fn from(value: i32) -> Self {
        TemplateValue::Int(i64::from(value))
    }
}

impl From<usize> for TemplateValue {
    fn from(value: usize) -> Self {
        TemplateValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        TemplateValue::Float(value)
    }
}

impl<T: Into<TemplateValue>> From<Vec<T>> for TemplateValue {
    fn from(value: Vec<T>) -> Self {
        TemplateValue::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(TemplateValue::Bool(true).is_truthy());
        assert!(!TemplateValue::Bool(false).is_truthy());
        assert!(TemplateValue::from("false").is_truthy());
        assert!(!TemplateValue::from("").is_truthy());
        assert!(!TemplateValue::Int(0).is_truthy());
        assert!(TemplateValue::Float(0.5).is_truthy());
        assert!(TemplateValue::List(vec![TemplateValue::Null]).is_truthy());
        assert!(!TemplateValue::List(vec![]).is_truthy());
        assert!(!TemplateValue::Map(BTreeMap::new()).is_truthy());
        assert!(!TemplateValue::Null.is_truthy());
    }

    #[test]
    fn test_from_json() {
        let value = TemplateValue::from(json!({
            "title": "Home",
            "count": 3,
            "ratio": 0.5,
            "tags": ["a", "b"],
            "draft": false,
            "author": null,
        }));
        assert_eq!(value.get_path(&["title"]), Some(&TemplateValue::from("Home")));
        assert_eq!(value.get_path(&["count"]), Some(&TemplateValue::Int(3)));
        assert_eq!(value.get_path(&["ratio"]), Some(&TemplateValue::Float(0.5)));
        assert_eq!(
            value.get_path(&["tags"]),
            Some(&TemplateValue::from(vec!["a", "b"]))
        );
        assert_eq!(value.get_path(&["author"]), Some(&TemplateValue::Null));
    }

    #[test]
    fn test_get_path() {
        let value = TemplateValue::from(json!({"employee": {"salary": "50000"}}));
        assert_eq!(
            value.get_path(&["employee", "salary"]),
            Some(&TemplateValue::from("50000"))
        );
        assert_eq!(value.get_path(&["employee", "name"]), None);
        assert_eq!(value.get_path(&["employee", "salary", "x"]), None);
        assert_eq!(value.get_path::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Page {
            title: String,
            weight: u32,
        }
        let value = TemplateValue::from_serialize(&Page {
            title: "About".to_string(),
            weight: 2,
        })
        .unwrap();
        assert_eq!(
            value,
            TemplateValue::map([
                ("title", TemplateValue::from("About")),
                ("weight", TemplateValue::Int(2)),
            ])
        );
    }

    #[test]
    fn test_render() {
        assert_eq!(TemplateValue::Null.render(), "");
        assert_eq!(TemplateValue::Bool(false).render(), "false");
        assert_eq!(TemplateValue::Float(3.0).render(), "3");
        assert_eq!(TemplateValue::from(vec![1, 2]).render(), "[1 2]");
        assert_eq!(
            TemplateValue::map([("a", 1), ("b", 2)]).render(),
            "map[a:1 b:2]"
        );
    }
}
