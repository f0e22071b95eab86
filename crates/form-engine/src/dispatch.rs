//! Type-tag dispatch to field renderers.
//!
//! Rendering a concrete control is the host's business; the engine only
//! decides *which* renderer handles a field. The [`Dispatcher`] is a
//! capability table keyed by [`FieldType`] with the `text` entry doubling as
//! the fallback, so resolution is total.

use std::{collections::HashMap, fmt, sync::Arc};

use form_config::{FieldDescriptor, FieldKey, FieldType, ValueProp};
use serde_json::Value;

/// Everything a renderer needs to draw one control.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    /// Stable identifier of the field.
    pub key: &'a FieldKey,
    /// Bound identifier; `None` for layout-only items.
    pub binding: Option<&'a FieldKey>,
    /// Declared field.
    pub field: &'a FieldDescriptor,
    /// Resolved variant.
    pub field_type: FieldType,
    /// Property the control binds its value through.
    pub value_prop: ValueProp,
    /// Current value from the snapshot.
    pub value: Option<&'a Value>,
    /// Disabled predicate outcome.
    pub disabled: bool,
}

/// Renders one kind of control.
pub trait FieldRenderer<Out>: Send + Sync {
    /// Produce the control for `view`.
    fn render(&self, view: &FieldView<'_>) -> Out;
}

impl<Out, F> FieldRenderer<Out> for F
where
    F: Fn(&FieldView<'_>) -> Out + Send + Sync,
{
    fn render(&self, view: &FieldView<'_>) -> Out {
        self(view)
    }
}

/// Capability table from field type to renderer.
pub struct Dispatcher<Out> {
    /// Registered renderers other than text.
    table: HashMap<FieldType, Arc<dyn FieldRenderer<Out>>>,
    /// Text renderer, also used for every unregistered type.
    text: Arc<dyn FieldRenderer<Out>>,
}

impl<Out> fmt::Debug for Dispatcher<Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<&str> = self.table.keys().map(|t| t.tag()).collect();
        registered.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("registered", &registered)
            .finish_non_exhaustive()
    }
}

impl<Out: 'static> Dispatcher<Out> {
    /// A table with only the text renderer.
    pub fn new(text: impl FieldRenderer<Out> + 'static) -> Self {
        Self {
            table: HashMap::new(),
            text: Arc::new(text),
        }
    }

    /// Use one renderer for every type.
    pub fn uniform(renderer: impl FieldRenderer<Out> + 'static) -> Self {
        let shared: Arc<dyn FieldRenderer<Out>> = Arc::new(renderer);
        let table = FieldType::ALL
            .into_iter()
            .filter(|t| *t != FieldType::Text)
            .map(|t| (t, shared.clone()))
            .collect();
        Self {
            table,
            text: shared,
        }
    }

    /// Register (or replace) the renderer for `ty`.
    pub fn register(&mut self, ty: FieldType, renderer: impl FieldRenderer<Out> + 'static) {
        let renderer: Arc<dyn FieldRenderer<Out>> = Arc::new(renderer);
        if ty == FieldType::Text {
            self.text = renderer;
        } else {
            self.table.insert(ty, renderer);
        }
    }

    /// Builder form of [`Dispatcher::register`].
    pub fn with(mut self, ty: FieldType, renderer: impl FieldRenderer<Out> + 'static) -> Self {
        self.register(ty, renderer);
        self
    }
}

impl<Out> Dispatcher<Out> {
    /// Renderer for a raw tag. Unknown and missing tags get the text renderer.
    pub fn resolve_variant(&self, tag: Option<&str>) -> &dyn FieldRenderer<Out> {
        self.resolve_type(FieldType::from_tag(tag))
    }

    /// Renderer for a resolved type, falling back to text when unregistered.
    pub fn resolve_type(&self, ty: FieldType) -> &dyn FieldRenderer<Out> {
        match self.table.get(&ty) {
            Some(r) => r.as_ref(),
            None => self.text.as_ref(),
        }
    }
}
