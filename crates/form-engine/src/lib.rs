#![warn(missing_docs)]
//! Conditional field resolution for declarative forms.
//!
//! A [`Form`] mounts a [`form_config::FormSpec`] on a host value store and
//! keeps three things current as the user edits:
//!
//! - the active field set, re-derived from each driver field's branching
//!   table ([`resolver`]);
//! - per-field visibility and disabled state ([`predicate`]);
//! - the submission state machine ([`submit`]).
//!
//! Rendering is delegated through a [`Dispatcher`] keyed by field type.
//! The host is reached only through the [`FormHost`] trait; [`MemoryHost`]
//! is a complete in-memory implementation for tools and tests.

pub mod dispatch;
mod form;
mod host;
mod memory;
pub mod predicate;
pub mod resolver;
pub mod submit;

pub use dispatch::{Dispatcher, FieldRenderer, FieldView};
pub use form::{Form, RenderPlan, RenderedField, SubmitControl};
pub use host::{FieldError, FormHost, SharedHost};
pub use memory::{MemoryHost, RuleError};
pub use predicate::FieldState;
pub use resolver::{ActiveFieldSet, DriverPolicy, Resolution, Resolver, Skip, driver_key};
pub use submit::{
    Completion, SubmissionController, SubmissionState, SubmitHandler, SubmitOutcome,
};
