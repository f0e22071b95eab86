//! Field identifiers and value-path helpers.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A value snapshot: every field value keyed by identifier. Grouped fields
/// live at nested object paths.
pub type Values = Map<String, Value>;

/// A declared field name: a single key or a path into a grouped value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum NamePath {
    /// Top-level key.
    Key(String),
    /// Nested path, outermost segment first.
    Path(Vec<String>),
}

impl NamePath {
    /// The path segments, outermost first.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Self::Key(k) => vec![k.clone()],
            Self::Path(p) => p.clone(),
        }
    }
}

impl From<&str> for NamePath {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for NamePath {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl<const N: usize> From<[&str; N]> for NamePath {
    fn from(value: [&str; N]) -> Self {
        Self::Path(value.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Stable identifier of a declared field.
///
/// Fields without a name fall back to their declaration index, stored under
/// the index's decimal string in the value snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Value-path segments, outermost first.
    path: Vec<String>,
    /// Whether the key came from the positional fallback.
    positional: bool,
}

impl FieldKey {
    /// Key for a field declared with an explicit name.
    pub fn named(name: &NamePath) -> Self {
        Self {
            path: name.segments(),
            positional: false,
        }
    }

    /// Fallback key for an unnamed field at `index` in the declaration.
    pub fn positional(index: usize) -> Self {
        Self {
            path: vec![index.to_string()],
            positional: true,
        }
    }

    /// Key for a raw path as reported by a value-change event.
    pub fn from_path(path: Vec<String>) -> Self {
        Self {
            path,
            positional: false,
        }
    }

    /// Path segments, outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// True when this key is a positional fallback.
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// True when this key and `other` address the same value slot.
    pub fn same_slot(&self, other: &Self) -> bool {
        self.path == other.path
    }

    /// Whether a name listed in a branching table refers to this field.
    ///
    /// Strings and numbers match single-segment keys; arrays of strings match
    /// grouped paths. Anything else never matches.
    pub fn matches(&self, candidate: &Value) -> bool {
        match candidate {
            Value::String(s) => self.path.len() == 1 && self.path[0] == *s,
            Value::Number(n) => self.path.len() == 1 && self.path[0] == n.to_string(),
            Value::Array(items) => {
                items.len() == self.path.len()
                    && items
                        .iter()
                        .zip(&self.path)
                        .all(|(item, seg)| item.as_str() == Some(seg.as_str()))
            }
            _ => false,
        }
    }

    /// Read this field's value from `values`.
    pub fn lookup<'a>(&self, values: &'a Values) -> Option<&'a Value> {
        lookup_path(values, &self.path)
    }

    /// Write `value` into this field's slot, creating intermediate objects.
    pub fn assign(&self, values: &mut Values, value: Value) {
        assign_path(values, &self.path, value);
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))
    }
}

/// Follow `path` through nested objects in `values`.
pub fn lookup_path<'a>(values: &'a Values, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut cur = values.get(first)?;
    for seg in rest {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

/// Write `value` at `path`, replacing non-object intermediates with objects.
pub fn assign_path(values: &mut Values, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut cur = values;
    for seg in parents {
        let slot = cur
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        cur = next;
    }
    cur.insert(last.clone(), value);
}

/// Deep-merge `patch` into `base`: nested objects merge, everything else replaces.
pub fn merge_values(base: &mut Values, patch: Values) {
    for (k, v) in patch {
        match (base.get_mut(&k), v) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_values(existing, incoming);
            }
            (_, v) => {
                base.insert(k, v);
            }
        }
    }
}

/// JavaScript-style truthiness of an optional value.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(v: Value) -> Values {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn positional_key_uses_index_string() {
        let k = FieldKey::positional(3);
        assert_eq!(k.path(), ["3".to_string()]);
        assert!(k.is_positional());
        assert!(k.matches(&json!(3)));
        assert!(k.matches(&json!("3")));
    }

    #[test]
    fn grouped_key_matches_array_only() {
        let k = FieldKey::named(&NamePath::from(["address", "city"]));
        assert!(k.matches(&json!(["address", "city"])));
        assert!(!k.matches(&json!("city")));
        assert!(!k.matches(&json!(["address"])));
        assert!(!k.matches(&json!({"address": "city"})));
    }

    #[test]
    fn single_segment_path_equals_key() {
        let a = FieldKey::named(&NamePath::from("x"));
        let b = FieldKey::named(&NamePath::Path(vec!["x".into()]));
        assert_eq!(a, b);
    }

    #[test]
    fn assign_and_lookup_nested() {
        let mut values = obj(json!({"address": "flat"}));
        let k = FieldKey::named(&NamePath::from(["address", "city"]));
        k.assign(&mut values, json!("Oslo"));
        assert_eq!(k.lookup(&values), Some(&json!("Oslo")));
        assert_eq!(values, obj(json!({"address": {"city": "Oslo"}})));
    }

    #[test]
    fn merge_keeps_untouched_siblings() {
        let mut base = obj(json!({"a": 1, "g": {"x": 1, "y": 2}}));
        merge_values(&mut base, obj(json!({"g": {"y": 3}, "b": true})));
        assert_eq!(base, obj(json!({"a": 1, "b": true, "g": {"x": 1, "y": 3}})));
    }

    #[test]
    fn truthiness_follows_js() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(null))));
        assert!(truthy(Some(&json!("0"))));
        assert!(truthy(Some(&json!([]))));
        assert!(truthy(Some(&json!(2.5))));
    }
}
