//! The declared field list.

use std::{collections::HashSet, slice, sync::Arc};

use crate::{Error, field::FieldDescriptor, key::FieldKey};

/// An immutable, validated declaration of form fields.
///
/// Each field's [`FieldKey`] is computed once from its declaration index, so
/// positional fallbacks never move when the active subset changes. Cloning is
/// cheap.
#[derive(Debug, Clone)]
pub struct FieldList {
    /// Descriptors in declaration order.
    fields: Arc<[FieldDescriptor]>,
    /// Identifier of each descriptor, parallel to `fields`.
    keys: Arc<[FieldKey]>,
}

impl FieldList {
    /// Validate and freeze a declaration. Explicit names must be unique.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, Error> {
        let keys: Vec<FieldKey> = fields
            .iter()
            .enumerate()
            .map(|(idx, f)| match &f.name {
                Some(name) => FieldKey::named(name),
                None => FieldKey::positional(idx),
            })
            .collect();

        let mut seen = HashSet::new();
        for key in &keys {
            if key.path().is_empty() || key.path().iter().any(String::is_empty) {
                return Err(Error::validation(format!(
                    "field name '{key}' has an empty segment"
                )));
            }
            if !seen.insert(key.path()) {
                return Err(Error::validation(format!("duplicate field name '{key}'")));
            }
        }

        Ok(Self {
            fields: fields.into(),
            keys: keys.into(),
        })
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Descriptor at declaration index `idx`.
    pub fn get(&self, idx: usize) -> Option<&FieldDescriptor> {
        self.fields.get(idx)
    }

    /// Identifier of the field at declaration index `idx`.
    pub fn key(&self, idx: usize) -> Option<&FieldKey> {
        self.keys.get(idx)
    }

    /// Declaration index of the field addressed by `key`.
    pub fn position(&self, key: &FieldKey) -> Option<usize> {
        self.keys.iter().position(|k| k.same_slot(key))
    }

    /// Iterate `(key, descriptor)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldDescriptor)> {
        self.keys.iter().zip(self.fields.iter())
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }
}
