//! Read-only view over a field's branching table (`extraProps.config`).
//!
//! The table maps a stringified driver value to a branch:
//!
//! ```json
//! { "A": { "visible": ["x"], "hidden": [] } }
//! ```
//!
//! Parsing is lenient: anything malformed yields a pass-through branch and a
//! [`BranchIssue`] the caller may log.

use std::fmt;

use serde_json::{Map, Value};

use crate::field::FieldDescriptor;

/// Key under `extraProps` holding the branching table.
pub const CONFIG_KEY: &str = "config";

/// Something wrong with a branching table. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchIssue {
    /// `extraProps.config` exists but is not an object.
    TableNotObject,
    /// The selected branch is not an object.
    BranchNotObject {
        /// Branch key.
        key: String,
    },
    /// `visible` or `hidden` is present but not an array.
    ListNotArray {
        /// Branch key.
        key: String,
        /// Offending list name.
        list: &'static str,
    },
}

impl fmt::Display for BranchIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableNotObject => write!(f, "branching table is not an object"),
            Self::BranchNotObject { key } => write!(f, "branch '{key}' is not an object"),
            Self::ListNotArray { key, list } => {
                write!(f, "branch '{key}': '{list}' is not an array")
            }
        }
    }
}

/// Borrowed branching table of one field.
#[derive(Debug, Clone, Copy)]
pub struct BranchTable<'a> {
    /// Branch key to raw branch object.
    entries: &'a Map<String, Value>,
}

impl<'a> BranchTable<'a> {
    /// The table on `field`, if it has a non-empty one.
    pub fn of(field: &'a FieldDescriptor) -> Result<Option<Self>, BranchIssue> {
        match field.extra_props.get(CONFIG_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(m)) if m.is_empty() => Ok(None),
            Some(Value::Object(m)) => Ok(Some(Self { entries: m })),
            Some(_) => Err(BranchIssue::TableNotObject),
        }
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no branches.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select the branch for a driver value.
    ///
    /// Absent branches are pass-through. Malformed branches are pass-through
    /// and report why.
    pub fn branch(&self, driver_value: &Value) -> (Branch<'a>, Option<BranchIssue>) {
        let key = branch_key(driver_value);
        let Some(raw) = self.entries.get(&key) else {
            return (Branch::default(), None);
        };
        let Some(obj) = raw.as_object() else {
            return (Branch::default(), Some(BranchIssue::BranchNotObject { key }));
        };
        let visible = match list(obj, "visible") {
            Ok(v) => v,
            Err(list) => return (Branch::default(), Some(BranchIssue::ListNotArray { key, list })),
        };
        let hidden = match list(obj, "hidden") {
            Ok(v) => v,
            Err(list) => return (Branch::default(), Some(BranchIssue::ListNotArray { key, list })),
        };
        (Branch { visible, hidden }, None)
    }
}

/// Read a name list; missing or `null` is empty.
fn list<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a [Value], &'static str> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(name),
    }
}

/// Resolved branch: names to show and names to hide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Branch<'a> {
    /// Fields to keep; when non-empty, only these survive.
    pub visible: &'a [Value],
    /// Fields to drop when `visible` is empty.
    pub hidden: &'a [Value],
}

impl Branch<'_> {
    /// True when the branch leaves every field in place.
    pub fn is_passthrough(&self) -> bool {
        self.visible.is_empty() && self.hidden.is_empty()
    }
}

/// Stringify a driver value the way branching-table keys are written.
///
/// Strings are verbatim, integral numbers drop any fractional part, `null`
/// and booleans use their literal names, arrays join their elements with
/// commas (nulls become empty), and objects become `[object Object]`.
pub fn branch_key(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => branch_key(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
