//! The host form container's contract with the engine.
//!
//! The host owns the authoritative value store. The engine reads snapshots
//! through [`FormHost::values`] and proposes every mutation through the
//! remaining methods; it never keeps its own copy of the values.

use std::sync::Arc;

use form_config::{FieldDescriptor, FieldKey, Values};
use parking_lot::Mutex;
use tracing::info;

/// Shared handle to a host, passed explicitly to the engine.
pub type SharedHost<H> = Arc<Mutex<H>>;

/// Validation failure for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Failing field.
    pub key: FieldKey,
    /// Messages, in rule order.
    pub messages: Vec<String>,
}

/// Host form container.
pub trait FormHost: Send {
    /// Current value snapshot.
    fn values(&self) -> Values;

    /// The engine published a new active field list.
    fn set_active_fields(&mut self, keys: &[FieldKey]);

    /// Write `values` back without marking any field as edited.
    fn reassert_values(&mut self, values: Values);

    /// Scroll to and focus a field.
    fn focus_field(&mut self, key: &FieldKey);

    /// Validate the bound active fields before submission. Errors are
    /// returned in declaration order.
    fn validate(&mut self, fields: &[(&FieldKey, &FieldDescriptor)]) -> Vec<FieldError> {
        let _ = fields;
        Vec::new()
    }

    /// Show a success notification.
    fn notify_success(&mut self, message: &str) {
        info!(target: "form_engine::host", "{message}");
    }
}
