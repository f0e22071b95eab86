//! Field descriptor model and form declaration loading.
//!
//! A form is declared as an ordered list of [`FieldDescriptor`]s. Each field
//! carries a type tag, opaque props, visibility/disabled [`Predicate`]s and an
//! optional branching table under `extraProps.config`. Declarations are
//! validated into a [`FieldList`], which fixes every field's [`FieldKey`] for
//! the lifetime of the form.
#![warn(missing_docs)]

mod branch;
mod condition;
mod error;
mod field;
mod key;
mod list;
mod loader;

#[cfg(test)]
mod test_parse;

pub use branch::{Branch, BranchIssue, BranchTable, CONFIG_KEY, branch_key};
pub use condition::{Condition, Predicate};
pub use error::{Error, excerpt_at};
pub use field::{FieldDescriptor, FieldType, ValueProp};
pub use key::{FieldKey, NamePath, Values, assign_path, lookup_path, merge_values, truthy};
pub use list::FieldList;
pub use loader::{Format, FormSpec, Layout, fields_from_value, load_from_path, load_from_str};
