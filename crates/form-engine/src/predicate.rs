//! Per-field visibility and disabled evaluation.

use form_config::{FieldDescriptor, Values};

/// Outcome of a field's predicates for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldState {
    /// Whether the control is displayed.
    pub visible: bool,
    /// Whether the control accepts input.
    pub disabled: bool,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            visible: true,
            disabled: false,
        }
    }
}

/// Evaluate both predicates of `field` against `values`.
///
/// Nothing is cached: callers re-evaluate on every snapshot.
pub fn evaluate(field: &FieldDescriptor, values: &Values) -> FieldState {
    FieldState {
        visible: field.visibility.evaluate(values),
        disabled: field.disabled.evaluate(values),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use form_config::{Condition, Predicate};
    use serde_json::json;

    use super::*;

    fn values(v: serde_json::Value) -> Values {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn defaults_are_visible_and_enabled() {
        let f = FieldDescriptor::named("x");
        assert_eq!(evaluate(&f, &Values::new()), FieldState::default());
    }

    #[test]
    fn predicates_track_snapshot() {
        let f = FieldDescriptor::named("detail")
            .visible_when(Condition::Truthy("more".into()))
            .disabled_when(Condition::Equals {
                field: "locked".into(),
                value: json!(true),
            });
        assert_eq!(
            evaluate(&f, &values(json!({"more": false}))),
            FieldState {
                visible: false,
                disabled: false
            }
        );
        assert_eq!(
            evaluate(&f, &values(json!({"more": "yes", "locked": true}))),
            FieldState {
                visible: true,
                disabled: true
            }
        );
    }

    #[test]
    fn predicates_are_invoked_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = FieldDescriptor::named("x").visible_when(Predicate::from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));
        let snap = Values::new();
        evaluate(&f, &snap);
        evaluate(&f, &snap);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
