//! Field descriptors and the closed set of field types.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{condition::Predicate, key::NamePath};

/// Rendering variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Numeric input.
    Number,
    /// Multi-line text.
    Textarea,
    /// Single-line text; the fallback for unknown tags.
    Text,
    /// Single boolean checkbox.
    Checkbox,
    /// Group of checkboxes producing a list.
    CheckboxGroup,
    /// Composite field with nested children.
    Complex,
    /// Select / dropdown.
    Select,
}

impl FieldType {
    /// Every variant, in tag order.
    pub const ALL: [Self; 7] = [
        Self::Number,
        Self::Textarea,
        Self::Text,
        Self::Checkbox,
        Self::CheckboxGroup,
        Self::Complex,
        Self::Select,
    ];

    /// Parse a known tag.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Resolve an optional tag, falling back to [`FieldType::Text`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.and_then(Self::parse).unwrap_or(Self::Text)
    }

    /// Declaration tag for this variant.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::CheckboxGroup => "checkboxGroup",
            Self::Complex => "complex",
            Self::Select => "select",
        }
    }

    /// Property through which the control binds its value.
    pub fn value_prop(self) -> ValueProp {
        match self {
            Self::Checkbox => ValueProp::Checked,
            _ => ValueProp::Value,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Name of the control property carrying the field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueProp {
    /// `value`
    Value,
    /// `checked`
    Checked,
}

impl ValueProp {
    /// Property name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Checked => "checked",
        }
    }
}

/// One declared form field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDescriptor {
    /// Explicit identifier; unnamed fields fall back to their declaration index.
    #[serde(default)]
    pub name: Option<NamePath>,
    /// Raw type tag; unknown or missing tags render as text.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Opaque props for the rendered control. `config` holds the branching table.
    #[serde(default)]
    pub extra_props: Map<String, Value>,
    /// Opaque props for the field wrapper.
    #[serde(default)]
    pub item_props: Map<String, Value>,
    /// Content rendered before the field.
    #[serde(default)]
    pub prefix_content: Option<Value>,
    /// Content rendered after the field.
    #[serde(default)]
    pub suffix_content: Option<Value>,
    /// Visibility predicate.
    #[serde(default = "Predicate::always", rename = "visibleWhen")]
    pub visibility: Predicate,
    /// Disabled predicate.
    #[serde(default = "Predicate::never", rename = "disabledWhen")]
    pub disabled: Predicate,
    /// Validation rules, interpreted by the host.
    #[serde(default, rename = "rules")]
    pub validation_rules: Vec<Value>,
    /// Layout-only item: rendered without a bound identifier.
    #[serde(default)]
    pub no_style: bool,
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        Self {
            name: None,
            kind: None,
            label: None,
            extra_props: Map::new(),
            item_props: Map::new(),
            prefix_content: None,
            suffix_content: None,
            visibility: Predicate::always(),
            disabled: Predicate::never(),
            validation_rules: Vec::new(),
            no_style: false,
        }
    }
}

impl FieldDescriptor {
    /// An unnamed text field.
    pub fn new() -> Self {
        Self::default()
    }

    /// A field with the given name.
    pub fn named(name: impl Into<NamePath>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Resolved rendering variant.
    pub fn field_type(&self) -> FieldType {
        FieldType::from_tag(self.kind.as_deref())
    }

    /// Set the raw type tag.
    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.kind = Some(tag.into());
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Install a branching table under `extraProps.config`.
    pub fn with_branching(mut self, table: Value) -> Self {
        self.extra_props.insert("config".to_string(), table);
        self
    }

    /// Set an extra prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_props.insert(key.into(), value);
        self
    }

    /// Set the visibility predicate.
    pub fn visible_when(mut self, p: impl Into<Predicate>) -> Self {
        self.visibility = p.into();
        self
    }

    /// Set the disabled predicate.
    pub fn disabled_when(mut self, p: impl Into<Predicate>) -> Self {
        self.disabled = p.into();
        self
    }

    /// Set prefix content.
    pub fn with_prefix(mut self, content: Value) -> Self {
        self.prefix_content = Some(content);
        self
    }

    /// Set suffix content.
    pub fn with_suffix(mut self, content: Value) -> Self {
        self.suffix_content = Some(content);
        self
    }

    /// Append a validation rule.
    pub fn with_rule(mut self, rule: Value) -> Self {
        self.validation_rules.push(rule);
        self
    }

    /// Mark as a layout-only item.
    pub fn no_style(mut self) -> Self {
        self.no_style = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_and_missing_tags_are_text() {
        assert_eq!(FieldType::from_tag(None), FieldType::Text);
        assert_eq!(FieldType::from_tag(Some("date")), FieldType::Text);
        assert_eq!(FieldType::from_tag(Some("Select")), FieldType::Text);
        assert_eq!(FieldType::from_tag(Some("checkboxGroup")), FieldType::CheckboxGroup);
    }

    #[test]
    fn tags_round_trip() {
        for t in FieldType::ALL {
            assert_eq!(FieldType::parse(t.tag()), Some(t));
        }
    }

    #[test]
    fn checkbox_binds_checked() {
        assert_eq!(FieldType::Checkbox.value_prop().as_str(), "checked");
        assert_eq!(FieldType::CheckboxGroup.value_prop().as_str(), "value");
    }

    #[test]
    fn descriptor_defaults() {
        let f: FieldDescriptor = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert_eq!(f.field_type(), FieldType::Text);
        assert!(f.visibility.evaluate(&Default::default()));
        assert!(!f.disabled.evaluate(&Default::default()));
        assert!(f.extra_props.is_empty());
    }

    #[test]
    fn descriptor_rejects_unknown_keys() {
        let r = serde_json::from_value::<FieldDescriptor>(json!({"name": "x", "nmae": 1}));
        assert!(r.is_err());
    }
}
