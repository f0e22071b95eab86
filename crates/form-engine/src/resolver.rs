//! Conditional field-set resolution.
//!
//! Every value-change event may re-derive the set of active fields. The
//! driver is the field named by the event's delta object; if its descriptor
//! carries a branching table, the branch selected by the driver's new value
//! decides which declared fields survive:
//!
//! 1. `visible` non-empty: only fields named in `visible` survive.
//! 2. otherwise `hidden` non-empty: every field not named in `hidden` survives.
//! 3. both empty: every field survives.
//!
//! The active set is always filtered from the full declaration, so the
//! outcome depends only on the current event, never on earlier ones.

use std::fmt;

use form_config::{
    Branch, BranchIssue, BranchTable, FieldDescriptor, FieldKey, FieldList, Values, lookup_path,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Depth limit when descending into grouped delta values.
const MAX_KEY_DEPTH: usize = 32;

/// Driver value used when the delta path does not lead to a value.
static NULL: Value = Value::Null;

/// What happens to the driver when its own branch would exclude it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriverPolicy {
    /// The driver always stays active.
    #[default]
    Retain,
    /// The driver obeys its branch like any other field.
    FollowBranch,
}

/// Declaration indices of the currently active fields, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFieldSet {
    /// Indices into the declared list.
    indices: Vec<usize>,
}

impl ActiveFieldSet {
    /// Every field of a declaration of `len` fields.
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
        }
    }

    /// Declaration indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of active fields.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no field is active.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether the field at declaration index `idx` is active.
    pub fn contains(&self, idx: usize) -> bool {
        self.indices.binary_search(&idx).is_ok()
    }

    /// Active `(index, key, descriptor)` triples in declaration order.
    pub fn iter<'a>(
        &'a self,
        fields: &'a FieldList,
    ) -> impl Iterator<Item = (usize, &'a FieldKey, &'a FieldDescriptor)> + 'a {
        self.indices
            .iter()
            .filter_map(move |&i| Some((i, fields.key(i)?, fields.get(i)?)))
    }

    /// Keys of the active fields in declaration order.
    pub fn keys(&self, fields: &FieldList) -> Vec<FieldKey> {
        self.iter(fields).map(|(_, k, _)| k.clone()).collect()
    }
}

/// Why an event left the active set untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// The delta named no field.
    EmptyDelta,
    /// No declared field matches the driver key.
    UnknownDriver(FieldKey),
    /// The driver has no branching table.
    NoTable(FieldKey),
    /// The driver's `extraProps.config` is unusable.
    Malformed(FieldKey, BranchIssue),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDelta => write!(f, "empty delta"),
            Self::UnknownDriver(k) => write!(f, "no declared field '{k}'"),
            Self::NoTable(k) => write!(f, "field '{k}' has no branching table"),
            Self::Malformed(k, issue) => write!(f, "field '{k}': {issue}"),
        }
    }
}

/// Result of handling one value-change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The active set was recomputed from the declaration.
    Recomputed {
        /// Driver field.
        driver: FieldKey,
        /// Whether the set differs from the previous one.
        changed: bool,
    },
    /// No conditional effect.
    Unchanged(Skip),
}

impl Resolution {
    /// True when a new active set was published.
    pub fn is_recomputed(&self) -> bool {
        matches!(self, Self::Recomputed { .. })
    }
}

/// Extract the driver key from a delta object.
///
/// The delta's keys form the key path. When the delta names exactly one key
/// whose new value is itself an object (a grouped field), the walk descends
/// into it and appends the inner keys. Returns `None` for an empty delta.
pub fn driver_key(delta: &Values) -> Option<FieldKey> {
    let mut path = Vec::new();
    collect_keys(delta, 0, &mut path);
    if path.is_empty() {
        None
    } else {
        Some(FieldKey::from_path(path))
    }
}

/// Append the keys of `obj` to `out`, descending through single-key objects.
fn collect_keys(obj: &Values, depth: usize, out: &mut Vec<String>) {
    out.extend(obj.keys().cloned());
    if depth >= MAX_KEY_DEPTH || obj.len() != 1 {
        return;
    }
    if let Some(Value::Object(inner)) = obj.values().next() {
        collect_keys(inner, depth + 1, out);
    }
}

/// Filter `fields` through `branch`.
///
/// `driver` is the declaration index of the driver, honored per `policy`.
pub fn filter_fields(
    fields: &FieldList,
    branch: &Branch<'_>,
    driver: Option<usize>,
    policy: DriverPolicy,
) -> ActiveFieldSet {
    let indices = fields
        .iter()
        .enumerate()
        .filter(|(idx, (key, _))| {
            if policy == DriverPolicy::Retain && Some(*idx) == driver {
                return true;
            }
            if !branch.visible.is_empty() {
                named(branch.visible, *key)
            } else if !branch.hidden.is_empty() {
                !named(branch.hidden, *key)
            } else {
                true
            }
        })
        .map(|(idx, _)| idx)
        .collect();
    ActiveFieldSet { indices }
}

/// Whether `key` appears in a branch name list.
fn named(list: &[Value], key: &FieldKey) -> bool {
    list.iter().any(|n| key.matches(n))
}

/// Owns the declaration and the current active set.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Full declaration; never filtered in place.
    fields: FieldList,
    /// Currently published active set.
    active: ActiveFieldSet,
    /// Driver self-exclusion policy.
    policy: DriverPolicy,
}

impl Resolver {
    /// A resolver with every declared field active.
    pub fn new(fields: FieldList) -> Self {
        let active = ActiveFieldSet::all(fields.len());
        Self {
            fields,
            active,
            policy: DriverPolicy::default(),
        }
    }

    /// Set the driver policy.
    pub fn with_policy(mut self, policy: DriverPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The full declaration.
    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    /// The current active set.
    pub fn active(&self) -> &ActiveFieldSet {
        &self.active
    }

    /// Swap in a new declaration and make every field active.
    pub fn replace_fields(&mut self, fields: FieldList) {
        self.active = ActiveFieldSet::all(fields.len());
        self.fields = fields;
    }

    /// Handle one value-change event.
    pub fn resolve(&mut self, delta: &Values) -> Resolution {
        let Some(key) = driver_key(delta) else {
            return Resolution::Unchanged(Skip::EmptyDelta);
        };
        let Some(idx) = self.fields.position(&key) else {
            trace!(target: "form_engine::resolver", driver = %key, "change to undeclared key");
            return Resolution::Unchanged(Skip::UnknownDriver(key));
        };
        // Declared key carries the positional flag; the delta's does not.
        let driver = self.fields.key(idx).cloned().unwrap_or(key);
        let Some(descriptor) = self.fields.get(idx) else {
            return Resolution::Unchanged(Skip::UnknownDriver(driver));
        };

        let table = match BranchTable::of(descriptor) {
            Ok(Some(t)) => t,
            Ok(None) => return Resolution::Unchanged(Skip::NoTable(driver)),
            Err(issue) => {
                warn!(target: "form_engine::resolver", driver = %driver, "{issue}; ignoring");
                return Resolution::Unchanged(Skip::Malformed(driver, issue));
            }
        };

        let value = lookup_path(delta, driver.path()).unwrap_or(&NULL);
        let (branch, issue) = table.branch(value);
        if let Some(issue) = issue {
            warn!(target: "form_engine::resolver", driver = %driver, "{issue}; showing all fields");
        }

        let next = filter_fields(&self.fields, &branch, Some(idx), self.policy);
        let changed = next != self.active;
        debug!(
            target: "form_engine::resolver",
            driver = %driver,
            value = %value,
            active = next.len(),
            declared = self.fields.len(),
            changed,
            "recomputed active fields"
        );
        self.active = next;
        Resolution::Recomputed { driver, changed }
    }
}
