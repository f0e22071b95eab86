//! Submission lifecycle: idle → submitting → idle.
//!
//! A submit trigger validates, flips the form to [`SubmissionState::Submitting`]
//! and hands the values to the host's [`SubmitHandler`] together with a
//! one-shot [`Completion`]. The handler may resolve the completion at any
//! later time, from any thread. While a submission is in flight further
//! triggers are ignored.
//!
//! Completions only hold weak references to the form, so one that resolves
//! after the form has been dropped does nothing.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use form_config::{FieldDescriptor, FieldKey, Values, merge_values};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::host::{FieldError, FormHost, SharedHost};

/// Whether a submission is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionState {
    /// Ready for a submit trigger.
    #[default]
    Idle,
    /// Waiting for the handler to resolve its completion.
    Submitting,
}

/// What a submit trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler was invoked.
    Started,
    /// A submission was already in flight; nothing happened.
    Ignored,
    /// Validation failed; the first failing field was focused.
    Invalid(Vec<FieldError>),
}

/// Host-supplied submit handler.
pub trait SubmitHandler {
    /// Submit `values`; resolve `completion` once the outcome is known.
    fn submit(&self, values: Values, completion: Completion);
}

impl<F> SubmitHandler for F
where
    F: Fn(Values, Completion),
{
    fn submit(&self, values: Values, completion: Completion) {
        self(values, completion);
    }
}

/// How a submission ended.
enum Settle {
    /// `on_success`, with optional server-echoed values and message.
    Success {
        /// Values to merge over the current store.
        echo: Option<Values>,
        /// Notification text.
        message: Option<String>,
    },
    /// `on_failure`.
    Failure,
    /// Dropped without being resolved.
    Abandoned,
}

/// Boxed settle continuation.
type Finish = Box<dyn FnOnce(Settle) + Send>;

/// One-shot continuation handed to a [`SubmitHandler`].
///
/// Dropping it unresolved counts as a failure.
pub struct Completion {
    /// Pending continuation; taken on resolution.
    finish: Option<Finish>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.finish.is_some())
            .finish()
    }
}

impl Completion {
    /// Continuation bound to a form's state and host.
    fn new<H: FormHost + 'static>(
        state: Weak<Mutex<SubmissionState>>,
        host: Weak<Mutex<H>>,
    ) -> Self {
        Self {
            finish: Some(Box::new(move |outcome| settle(&state, &host, outcome))),
        }
    }

    /// The submission succeeded. Shows `message` when given.
    pub fn on_success(self, message: Option<&str>) {
        self.resolve(Settle::Success {
            echo: None,
            message: message.map(str::to_string),
        });
    }

    /// The submission succeeded and the server echoed `values`, which are
    /// merged over the current store.
    pub fn on_success_with(self, values: Values, message: Option<&str>) {
        self.resolve(Settle::Success {
            echo: Some(values),
            message: message.map(str::to_string),
        });
    }

    /// The submission failed. Field errors are the host's to display.
    pub fn on_failure(self) {
        self.resolve(Settle::Failure);
    }

    /// Run the continuation once.
    fn resolve(mut self, outcome: Settle) {
        if let Some(finish) = self.finish.take() {
            finish(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(finish) = self.finish.take() {
            finish(Settle::Abandoned);
        }
    }
}

/// Apply a submission outcome to a form that may no longer exist.
fn settle<H: FormHost>(
    state: &Weak<Mutex<SubmissionState>>,
    host: &Weak<Mutex<H>>,
    outcome: Settle,
) {
    let (Some(state), Some(host)) = (state.upgrade(), host.upgrade()) else {
        debug!(target: "form_engine::submit", "form torn down; completion ignored");
        return;
    };
    *state.lock() = SubmissionState::Idle;
    match outcome {
        Settle::Success { echo, message } => {
            let mut host = host.lock();
            let mut values = host.values();
            if let Some(echo) = echo {
                merge_values(&mut values, echo);
            }
            host.reassert_values(values);
            if let Some(msg) = message.filter(|m| !m.is_empty()) {
                host.notify_success(&msg);
            }
            debug!(target: "form_engine::submit", "submission succeeded");
        }
        Settle::Failure => debug!(target: "form_engine::submit", "submission failed"),
        Settle::Abandoned => {
            warn!(target: "form_engine::submit", "completion dropped unresolved; treating as failure");
        }
    }
}

/// Drives submissions for one form instance.
pub struct SubmissionController<H> {
    /// Current state; completions hold weak references to it.
    state: Arc<Mutex<SubmissionState>>,
    /// Host the form submits from.
    host: SharedHost<H>,
}

impl<H> fmt::Debug for SubmissionController<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionController")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl<H: FormHost + 'static> SubmissionController<H> {
    /// An idle controller for `host`.
    pub fn new(host: SharedHost<H>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SubmissionState::Idle)),
            host,
        }
    }

    /// Current state.
    pub fn state(&self) -> SubmissionState {
        *self.state.lock()
    }

    /// Whether the submit trigger is enabled.
    pub fn can_submit(&self) -> bool {
        self.state() == SubmissionState::Idle
    }

    /// Handle a user-initiated submit of `fields`.
    ///
    /// Layout-only fields are not validated.
    pub fn submit(
        &self,
        fields: &[(&FieldKey, &FieldDescriptor)],
        handler: &dyn SubmitHandler,
    ) -> SubmitOutcome {
        if !self.can_submit() {
            debug!(target: "form_engine::submit", "submit while submitting; ignored");
            return SubmitOutcome::Ignored;
        }

        let bound: Vec<(&FieldKey, &FieldDescriptor)> =
            fields.iter().copied().filter(|(_, f)| !f.no_style).collect();
        let (values, errors) = {
            let mut host = self.host.lock();
            let errors = host.validate(&bound);
            if let Some(first) = errors.first() {
                host.focus_field(&first.key);
            }
            (host.values(), errors)
        };
        if !errors.is_empty() {
            debug!(
                target: "form_engine::submit",
                invalid = errors.len(),
                first = %errors[0].key,
                "validation failed"
            );
            return SubmitOutcome::Invalid(errors);
        }

        {
            let mut state = self.state.lock();
            if *state == SubmissionState::Submitting {
                return SubmitOutcome::Ignored;
            }
            *state = SubmissionState::Submitting;
        }
        debug!(target: "form_engine::submit", "submitting");
        let completion = Completion::new(Arc::downgrade(&self.state), Arc::downgrade(&self.host));
        handler.submit(values, completion);
        SubmitOutcome::Started
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use form_config::NamePath;
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryHost;

    fn setup() -> (SharedHost<MemoryHost>, SubmissionController<MemoryHost>) {
        let host = MemoryHost::new(json!({"a": 1}).as_object().cloned().unwrap()).shared();
        let ctl = SubmissionController::new(host.clone());
        (host, ctl)
    }

    #[test]
    fn second_trigger_while_submitting_is_ignored() {
        let (_host, ctl) = setup();
        let parked: RefCell<Vec<Completion>> = RefCell::new(Vec::new());
        let calls = RefCell::new(0);
        let handler = |_v: Values, c: Completion| {
            *calls.borrow_mut() += 1;
            parked.borrow_mut().push(c);
        };
        assert_eq!(ctl.submit(&[], &handler), SubmitOutcome::Started);
        assert_eq!(ctl.state(), SubmissionState::Submitting);
        assert_eq!(ctl.submit(&[], &handler), SubmitOutcome::Ignored);
        assert_eq!(*calls.borrow(), 1);

        parked.borrow_mut().pop().unwrap().on_failure();
        assert_eq!(ctl.state(), SubmissionState::Idle);
        assert_eq!(ctl.submit(&[], &handler), SubmitOutcome::Started);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn success_reasserts_and_notifies() {
        let (host, ctl) = setup();
        let k = FieldKey::named(&NamePath::from("b"));
        host.lock().edit(&k, json!("typed"));
        let handler = |_v: Values, c: Completion| {
            c.on_success_with(json!({"id": 7}).as_object().cloned().unwrap(), Some("Saved"));
        };
        assert_eq!(ctl.submit(&[], &handler), SubmitOutcome::Started);
        assert_eq!(ctl.state(), SubmissionState::Idle);

        let h = host.lock();
        assert_eq!(h.values(), json!({"a": 1, "b": "typed", "id": 7}).as_object().cloned().unwrap());
        assert!(!h.any_touched());
        assert_eq!(h.notifications(), ["Saved"]);
    }

    #[test]
    fn failure_only_resets_state() {
        let (host, ctl) = setup();
        let k = FieldKey::named(&NamePath::from("b"));
        host.lock().edit(&k, json!("typed"));
        ctl.submit(&[], &|_v: Values, c: Completion| c.on_failure());
        assert_eq!(ctl.state(), SubmissionState::Idle);
        let h = host.lock();
        assert!(h.is_touched(&k));
        assert!(h.notifications().is_empty());
    }

    #[test]
    fn empty_message_is_not_shown() {
        let (host, ctl) = setup();
        ctl.submit(&[], &|_v: Values, c: Completion| c.on_success(Some("")));
        assert!(host.lock().notifications().is_empty());
    }

    #[test]
    fn dropped_completion_returns_to_idle() {
        let (_host, ctl) = setup();
        ctl.submit(&[], &|_v: Values, _c: Completion| {});
        assert_eq!(ctl.state(), SubmissionState::Idle);
    }

    #[test]
    fn invalid_submit_focuses_first_error_and_skips_handler() {
        let (host, ctl) = setup();
        let first = FieldDescriptor::named("first").with_rule(json!({"required": true}));
        let second = FieldDescriptor::named("second").with_rule(json!({"required": true}));
        let (k1, k2) = (
            FieldKey::named(&NamePath::from("first")),
            FieldKey::named(&NamePath::from("second")),
        );
        let called = RefCell::new(false);
        let out = ctl.submit(&[(&k1, &first), (&k2, &second)], &|_v: Values, _c: Completion| {
            *called.borrow_mut() = true;
        });
        match out {
            SubmitOutcome::Invalid(errs) => assert_eq!(errs.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!*called.borrow());
        assert_eq!(ctl.state(), SubmissionState::Idle);
        assert_eq!(host.lock().focused(), Some(&k1));
    }

    #[test]
    fn layout_only_fields_are_not_validated() {
        let (_host, ctl) = setup();
        let deco = FieldDescriptor::named("deco")
            .with_rule(json!({"required": true}))
            .no_style();
        let k = FieldKey::named(&NamePath::from("deco"));
        let out = ctl.submit(&[(&k, &deco)], &|_v: Values, c: Completion| c.on_failure());
        assert_eq!(out, SubmitOutcome::Started);
    }

    #[test]
    fn completion_after_teardown_is_noop() {
        let (host, ctl) = setup();
        let parked = RefCell::new(None);
        ctl.submit(&[], &|_v: Values, c: Completion| {
            *parked.borrow_mut() = Some(c);
        });
        drop(ctl);
        parked
            .into_inner()
            .unwrap()
            .on_success_with(json!({"late": true}).as_object().cloned().unwrap(), Some("late"));
        let h = host.lock();
        assert!(h.values().get("late").is_none());
        assert!(h.notifications().is_empty());
    }
}
