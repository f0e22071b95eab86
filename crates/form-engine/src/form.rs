//! A mounted form: resolver, renderer and submission wired to one host.

use form_config::{
    FieldDescriptor, FieldKey, FieldList, FieldType, FormSpec, Layout, ValueProp, Values,
    merge_values,
};
use serde_json::Value;
use tracing::debug;

use crate::{
    dispatch::{Dispatcher, FieldView},
    host::{FormHost, SharedHost},
    predicate::{self, FieldState},
    resolver::{ActiveFieldSet, DriverPolicy, Resolution, Resolver},
    submit::{SubmissionController, SubmissionState, SubmitHandler, SubmitOutcome},
};

/// One entry of a render pass.
#[derive(Debug, Clone)]
pub struct RenderedField<Out> {
    /// Stable identifier.
    pub key: FieldKey,
    /// Bound identifier; `None` for layout-only items.
    pub binding: Option<FieldKey>,
    /// Resolved variant.
    pub field_type: FieldType,
    /// Property the control binds its value through.
    pub value_prop: ValueProp,
    /// Display label.
    pub label: Option<String>,
    /// Predicate outcome.
    pub state: FieldState,
    /// Content before the field, emitted even when the control is hidden.
    pub prefix: Option<Value>,
    /// Content after the field, emitted even when the control is hidden.
    pub suffix: Option<Value>,
    /// Renderer output; `None` while the field is not visible.
    pub control: Option<Out>,
}

/// The submit trigger as it should currently be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    /// Caption.
    pub label: String,
    /// A submission is in flight.
    pub loading: bool,
    /// Whether a click would start a submission.
    pub enabled: bool,
}

/// Output of [`Form::render`].
#[derive(Debug, Clone)]
pub struct RenderPlan<Out> {
    /// Layout hint.
    pub layout: Layout,
    /// Active fields in declaration order.
    pub fields: Vec<RenderedField<Out>>,
    /// Submit trigger; absent when the declaration has no caption.
    pub submit: Option<SubmitControl>,
}

/// A form instance bound to a host.
#[derive(Debug)]
pub struct Form<H> {
    /// Submit caption.
    save_text: Option<String>,
    /// Layout hint.
    layout: Layout,
    /// Active-set resolution.
    resolver: Resolver,
    /// Submission state machine.
    submission: SubmissionController<H>,
    /// Value store.
    host: SharedHost<H>,
}

impl<H: FormHost + 'static> Form<H> {
    /// Mount `spec` on `host`.
    ///
    /// Declared initial values are seeded underneath whatever the host
    /// already holds, and every field starts active.
    pub fn new(spec: FormSpec, host: SharedHost<H>) -> Self {
        let FormSpec {
            save_text,
            layout,
            initial_values,
            fields,
        } = spec;
        let resolver = Resolver::new(fields);
        {
            let mut h = host.lock();
            let mut seeded = initial_values;
            merge_values(&mut seeded, h.values());
            h.reassert_values(seeded);
            h.set_active_fields(&resolver.active().keys(resolver.fields()));
        }
        debug!(
            target: "form_engine::form",
            fields = resolver.fields().len(),
            "form mounted"
        );
        Self {
            save_text,
            layout,
            resolver,
            submission: SubmissionController::new(host.clone()),
            host,
        }
    }

    /// Mount a bare field list.
    pub fn from_fields(fields: FieldList, host: SharedHost<H>) -> Self {
        Self::new(FormSpec::new(fields), host)
    }

    /// Set the driver policy.
    pub fn with_policy(mut self, policy: DriverPolicy) -> Self {
        self.resolver = self.resolver.with_policy(policy);
        self
    }

    /// Shared host handle.
    pub fn host(&self) -> &SharedHost<H> {
        &self.host
    }

    /// Handle a value-change event carrying `delta`.
    pub fn handle_values_change(&mut self, delta: &Values) -> Resolution {
        let resolution = self.resolver.resolve(delta);
        if resolution.is_recomputed() {
            self.publish();
        }
        resolution
    }

    /// Swap the declaration. Every new field starts active.
    pub fn replace_fields(&mut self, fields: FieldList) {
        self.resolver.replace_fields(fields);
        self.publish();
    }

    /// The full declaration.
    pub fn fields(&self) -> &FieldList {
        self.resolver.fields()
    }

    /// Current active set.
    pub fn active_fields(&self) -> &ActiveFieldSet {
        self.resolver.active()
    }

    /// Keys of the active fields in declaration order.
    pub fn active_keys(&self) -> Vec<FieldKey> {
        self.resolver.active().keys(self.resolver.fields())
    }

    /// Render the active fields against the host's current values.
    pub fn render<Out>(&self, dispatcher: &Dispatcher<Out>) -> RenderPlan<Out> {
        let values = self.host.lock().values();
        let fields = self
            .resolver
            .active()
            .iter(self.resolver.fields())
            .map(|(_, key, field)| render_field(dispatcher, key, field, &values))
            .collect();
        RenderPlan {
            layout: self.layout,
            fields,
            submit: self.submit_control(),
        }
    }

    /// The submit trigger, when the declaration has a caption.
    pub fn submit_control(&self) -> Option<SubmitControl> {
        let label = self.save_text.clone()?;
        let loading = self.submission.state() == SubmissionState::Submitting;
        Some(SubmitControl {
            label,
            loading,
            enabled: !loading,
        })
    }

    /// Current submission state.
    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    /// User-initiated submit of the active fields.
    pub fn submit(&self, handler: &dyn SubmitHandler) -> SubmitOutcome {
        let active: Vec<(&FieldKey, &FieldDescriptor)> = self
            .resolver
            .active()
            .iter(self.resolver.fields())
            .map(|(_, k, f)| (k, f))
            .collect();
        self.submission.submit(&active, handler)
    }

    /// Tell the host about the current active set.
    fn publish(&self) {
        let keys = self.active_keys();
        self.host.lock().set_active_fields(&keys);
    }
}

/// Evaluate and render one active field.
fn render_field<Out>(
    dispatcher: &Dispatcher<Out>,
    key: &FieldKey,
    field: &FieldDescriptor,
    values: &Values,
) -> RenderedField<Out> {
    let state = predicate::evaluate(field, values);
    let field_type = field.field_type();
    let binding = (!field.no_style).then_some(key);
    let control = state.visible.then(|| {
        let view = FieldView {
            key,
            binding,
            field,
            field_type,
            value_prop: field_type.value_prop(),
            value: binding.and_then(|k| k.lookup(values)),
            disabled: state.disabled,
        };
        dispatcher.resolve_type(field_type).render(&view)
    });
    RenderedField {
        key: key.clone(),
        binding: binding.cloned(),
        field_type,
        value_prop: field_type.value_prop(),
        label: field.label.clone(),
        state,
        prefix: field.prefix_content.clone(),
        suffix: field.suffix_content.clone(),
        control,
    }
}

#[cfg(test)]
mod tests {
    use form_config::Condition;
    use serde_json::json;

    use super::*;
    use crate::{memory::MemoryHost, submit::Completion};

    fn values(v: Value) -> Values {
        v.as_object().cloned().unwrap()
    }

    fn dispatcher() -> Dispatcher<String> {
        Dispatcher::uniform(|v: &FieldView<'_>| {
            format!("{}:{}", v.field_type.tag(), v.value.map(Value::to_string).unwrap_or_default())
        })
    }

    #[test]
    fn initial_values_sit_under_host_values() {
        let host = MemoryHost::new(values(json!({"a": "host"}))).shared();
        let mut spec = FormSpec::new(
            FieldList::new(vec![FieldDescriptor::named("a"), FieldDescriptor::named("b")]).unwrap(),
        );
        spec.initial_values = values(json!({"a": "declared", "b": "declared"}));
        let form = Form::new(spec, host.clone());

        let h = host.lock();
        assert_eq!(h.values(), values(json!({"a": "host", "b": "declared"})));
        assert!(!h.any_touched());
        assert_eq!(h.active_fields(), form.active_keys().as_slice());
    }

    #[test]
    fn hidden_field_keeps_prefix_and_suffix() {
        let field = FieldDescriptor::named("detail")
            .visible_when(Condition::Truthy("more".into()))
            .with_prefix(json!("before"))
            .with_suffix(json!("after"));
        let host = MemoryHost::default().shared();
        let form = Form::from_fields(FieldList::new(vec![field]).unwrap(), host);

        let plan = form.render(&dispatcher());
        let f = &plan.fields[0];
        assert!(!f.state.visible);
        assert!(f.control.is_none());
        assert_eq!(f.prefix, Some(json!("before")));
        assert_eq!(f.suffix, Some(json!("after")));
    }

    #[test]
    fn layout_only_items_have_no_binding() {
        let host = MemoryHost::new(values(json!({"note": "x"}))).shared();
        let form = Form::from_fields(
            FieldList::new(vec![FieldDescriptor::named("note").no_style()]).unwrap(),
            host,
        );
        let plan = form.render(&dispatcher());
        assert!(plan.fields[0].binding.is_none());
        assert_eq!(plan.fields[0].control.as_deref(), Some("text:"));
    }

    #[test]
    fn checkbox_binds_through_checked() {
        let host = MemoryHost::new(values(json!({"agree": true}))).shared();
        let form = Form::from_fields(
            FieldList::new(vec![FieldDescriptor::named("agree").with_type("checkbox")]).unwrap(),
            host,
        );
        let plan = form.render(&dispatcher());
        assert_eq!(plan.fields[0].value_prop, ValueProp::Checked);
        assert_eq!(plan.fields[0].control.as_deref(), Some("checkbox:true"));
    }

    #[test]
    fn submit_control_follows_state() {
        let host = MemoryHost::default().shared();
        let mut spec = FormSpec::new(FieldList::new(vec![FieldDescriptor::named("a")]).unwrap());
        assert!(Form::new(spec.clone(), host.clone()).submit_control().is_none());

        spec.save_text = Some("Save".into());
        let form = Form::new(spec, host);
        let parked = std::cell::RefCell::new(None);
        form.submit(&|_v: Values, c: Completion| {
            *parked.borrow_mut() = Some(c);
        });
        assert_eq!(
            form.submit_control(),
            Some(SubmitControl {
                label: "Save".into(),
                loading: true,
                enabled: false
            })
        );
        parked.into_inner().unwrap().on_failure();
        assert_eq!(form.submit_control().map(|c| c.enabled), Some(true));
    }
}
