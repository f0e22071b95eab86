//! In-memory host: a value store with touched tracking and rule validation.
//!
//! Understands these keys on each descriptor's `rules` entries:
//! `required`, `pattern` (regex, unanchored) and `min`/`max` (length of
//! strings and lists). `message` overrides the default error text.

use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    sync::Arc,
};

use form_config::{FieldDescriptor, FieldKey, Values};
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::host::{FieldError, FormHost, SharedHost};

/// A rule the in-memory host could not apply.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule entry does not have the expected shape.
    #[error("malformed rule on '{key}': {source}")]
    Malformed {
        /// Field carrying the rule.
        key: String,
        /// Decoder error.
        source: serde_json::Error,
    },
    /// `pattern` is not a valid regular expression.
    #[error("invalid pattern '{pattern}' on '{key}': {source}")]
    Pattern {
        /// Field carrying the rule.
        key: String,
        /// Offending pattern.
        pattern: String,
        /// Compiler error.
        source: regex::Error,
    },
}

/// One validation rule.
#[derive(Debug, Clone, Default, Deserialize)]
struct Rule {
    /// Value must be non-empty.
    #[serde(default)]
    required: bool,
    /// Regex the string value must match.
    #[serde(default)]
    pattern: Option<String>,
    /// Minimum length.
    #[serde(default)]
    min: Option<usize>,
    /// Maximum length.
    #[serde(default)]
    max: Option<usize>,
    /// Message replacing the default text.
    #[serde(default)]
    message: Option<String>,
}

/// Value store backing a form in tests and tools.
#[derive(Debug, Default)]
pub struct MemoryHost {
    /// Authoritative values.
    values: Values,
    /// Paths edited since the last reassert.
    touched: HashSet<Vec<String>>,
    /// Last published active fields.
    active: Vec<FieldKey>,
    /// Last focused field.
    focused: Option<FieldKey>,
    /// Errors from the last validation pass.
    errors: Vec<FieldError>,
    /// Success messages shown so far.
    notifications: Vec<String>,
    /// Compiled `pattern` rules.
    patterns: HashMap<String, Regex>,
}

impl MemoryHost {
    /// A store seeded with `values`.
    pub fn new(values: Values) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Wrap in a shared handle.
    pub fn shared(self) -> SharedHost<Self> {
        Arc::new(Mutex::new(self))
    }

    /// Apply a user edit and return the delta object a value-change event carries.
    ///
    /// Grouped fields produce nested deltas, e.g. `{"plan": {"tier": "pro"}}`.
    pub fn edit(&mut self, key: &FieldKey, value: Value) -> Values {
        key.assign(&mut self.values, value.clone());
        self.touched.insert(key.path().to_vec());
        let mut delta = Map::new();
        key.assign(&mut delta, value);
        delta
    }

    /// Current value of a field.
    pub fn value(&self, key: &FieldKey) -> Option<&Value> {
        key.lookup(&self.values)
    }

    /// Whether the field was edited since the last reassert.
    pub fn is_touched(&self, key: &FieldKey) -> bool {
        self.touched.contains(key.path())
    }

    /// True when any field was edited since the last reassert.
    pub fn any_touched(&self) -> bool {
        !self.touched.is_empty()
    }

    /// Last published active fields.
    pub fn active_fields(&self) -> &[FieldKey] {
        &self.active
    }

    /// Last focused field.
    pub fn focused(&self) -> Option<&FieldKey> {
        self.focused.as_ref()
    }

    /// Errors from the last validation pass.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Success messages shown so far.
    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Check one field against its rules.
    fn check(&mut self, key: &FieldKey, field: &FieldDescriptor) -> Result<Vec<String>, RuleError> {
        let value = key.lookup(&self.values).cloned();
        let mut messages = Vec::new();
        for raw in &field.validation_rules {
            let rule: Rule = serde_json::from_value(raw.clone()).map_err(|source| {
                RuleError::Malformed {
                    key: key.to_string(),
                    source,
                }
            })?;
            if let Some(msg) = self.apply(key, &rule, value.as_ref())? {
                messages.push(msg);
            }
        }
        Ok(messages)
    }

    /// Apply one rule; `Some(message)` on failure.
    fn apply(
        &mut self,
        key: &FieldKey,
        rule: &Rule,
        value: Option<&Value>,
    ) -> Result<Option<String>, RuleError> {
        let fail = |default: String| Some(rule.message.clone().unwrap_or(default));
        let len = value.and_then(length);
        if is_empty(value) {
            return Ok(if rule.required {
                fail(format!("'{key}' is required"))
            } else {
                None
            });
        }
        if let (Some(min), Some(len)) = (rule.min, len)
            && len < min
        {
            return Ok(fail(format!("'{key}' must be at least {min} long")));
        }
        if let (Some(max), Some(len)) = (rule.max, len)
            && len > max
        {
            return Ok(fail(format!("'{key}' must be at most {max} long")));
        }
        if let (Some(pattern), Some(Value::String(s))) = (&rule.pattern, value) {
            let re = self.pattern(key, pattern)?;
            if !re.is_match(s) {
                return Ok(fail(format!("'{key}' does not match the expected format")));
            }
        }
        Ok(None)
    }

    /// Compiled regex for `pattern`, cached.
    fn pattern(&mut self, key: &FieldKey, pattern: &str) -> Result<&Regex, RuleError> {
        match self.patterns.entry(pattern.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let re = Regex::new(pattern).map_err(|source| RuleError::Pattern {
                    key: key.to_string(),
                    pattern: pattern.to_string(),
                    source,
                })?;
                Ok(e.insert(re))
            }
        }
    }
}

/// Whether a value counts as not filled in.
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Length of strings (in chars) and lists.
fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        _ => None,
    }
}

impl FormHost for MemoryHost {
    fn values(&self) -> Values {
        self.values.clone()
    }

    fn set_active_fields(&mut self, keys: &[FieldKey]) {
        self.active = keys.to_vec();
    }

    fn reassert_values(&mut self, values: Values) {
        self.values = values;
        self.touched.clear();
    }

    fn focus_field(&mut self, key: &FieldKey) {
        debug!(target: "form_engine::host", field = %key, "focus");
        self.focused = Some(key.clone());
    }

    fn validate(&mut self, fields: &[(&FieldKey, &FieldDescriptor)]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for (key, field) in fields {
            match self.check(key, field) {
                Ok(messages) if messages.is_empty() => {}
                Ok(messages) => errors.push(FieldError {
                    key: (*key).clone(),
                    messages,
                }),
                Err(e) => warn!(target: "form_engine::host", "{e}; rule skipped"),
            }
        }
        self.errors = errors.clone();
        errors
    }

    fn notify_success(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}
