//! Visibility and disabled predicates.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::key::{FieldKey, NamePath, Values, truthy};

/// Declarative condition over the value snapshot, usable from form files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    /// Field value equals `value`. A missing field compares as `null`.
    Equals {
        /// Field to read.
        field: NamePath,
        /// Expected value.
        value: Value,
    },
    /// Field value differs from `value`.
    NotEquals {
        /// Field to read.
        field: NamePath,
        /// Rejected value.
        value: Value,
    },
    /// Field value is one of `values`.
    OneOf {
        /// Field to read.
        field: NamePath,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Field value is truthy.
    Truthy(NamePath),
    /// Negation.
    Not(Box<Condition>),
    /// Every sub-condition holds; empty is true.
    All(Vec<Condition>),
    /// At least one sub-condition holds; empty is false.
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate against `values`.
    pub fn eval(&self, values: &Values) -> bool {
        match self {
            Self::Equals { field, value } => read(values, field) == value,
            Self::NotEquals { field, value } => read(values, field) != value,
            Self::OneOf { field, values: set } => {
                let v = read(values, field);
                set.iter().any(|c| c == v)
            }
            Self::Truthy(field) => truthy(FieldKey::named(field).lookup(values)),
            Self::Not(inner) => !inner.eval(values),
            Self::All(items) => items.iter().all(|c| c.eval(values)),
            Self::Any(items) => items.iter().any(|c| c.eval(values)),
        }
    }
}

/// Stand-in for missing fields.
static NULL: Value = Value::Null;

/// Read a field, treating a missing slot as `null`.
fn read<'a>(values: &'a Values, field: &NamePath) -> &'a Value {
    FieldKey::named(field).lookup(values).unwrap_or(&NULL)
}

/// Snapshot predicate attached to a field descriptor.
#[derive(Clone)]
pub enum Predicate {
    /// Constant outcome.
    Const(bool),
    /// Declarative condition.
    When(Condition),
    /// Host-supplied closure; must be a pure function of the snapshot.
    Custom(Arc<dyn Fn(&Values) -> bool + Send + Sync>),
}

impl Predicate {
    /// Always true; the default visibility predicate.
    pub fn always() -> Self {
        Self::Const(true)
    }

    /// Always false; the default disabled predicate.
    pub fn never() -> Self {
        Self::Const(false)
    }

    /// Wrap a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Values) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate against the current snapshot.
    pub fn evaluate(&self, values: &Values) -> bool {
        match self {
            Self::Const(b) => *b,
            Self::When(c) => c.eval(values),
            Self::Custom(f) => f(values),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(b) => f.debug_tuple("Const").field(b).finish(),
            Self::When(c) => f.debug_tuple("When").field(c).finish(),
            Self::Custom(_) => f.debug_struct("Custom").finish_non_exhaustive(),
        }
    }
}

impl From<Condition> for Predicate {
    fn from(value: Condition) -> Self {
        Self::When(value)
    }
}

/// Serialized predicate forms: a literal bool or a condition tree.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPredicate {
    /// `true` / `false`.
    Const(bool),
    /// Condition tree.
    When(Condition),
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawPredicate::deserialize(deserializer)? {
            RawPredicate::Const(b) => Self::Const(b),
            RawPredicate::When(c) => Self::When(c),
        })
    }
}
