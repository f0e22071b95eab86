//! Script loading and step execution.

use std::{fs, io::Write, path::Path};

use form_config::{FieldKey, FieldType, FormSpec, Values};
use form_engine::{
    Completion, Dispatcher, FieldView, Form, MemoryHost, Resolution, SubmitOutcome,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub enum Step {
    /// Edit values; the object is the change event's delta.
    Edit(Values),
    /// Press the submit trigger; the handler answers with `reply`.
    Submit(Reply),
}

/// How the scripted submit handler resolves its completion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    /// `"success"` or `"failure"`.
    Plain(Verdict),
    /// `{"success": "message"}`.
    Message {
        /// Success notification text.
        success: String,
    },
}

/// Bare submit verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Resolve with `on_success` and no message.
    Success,
    /// Resolve with `on_failure`.
    Failure,
}

/// Read and parse a session script.
pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let text = fs::read_to_string(path).map_err(|source| Error::ReadScript {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::ParseScript {
        path: path.to_path_buf(),
        source,
    })
}

/// Mount `spec` on a fresh in-memory host and replay `steps`, writing a
/// transcript to `out`.
pub fn run(spec: FormSpec, steps: &[Step], out: &mut impl Write) -> Result<()> {
    let host = MemoryHost::default().shared();
    let mut form = Form::new(spec, host.clone());
    let dispatcher = dispatcher();

    writeln!(out, "== initial")?;
    print_plan(&form, &dispatcher, out)?;
    for (n, step) in steps.iter().enumerate() {
        debug!(target: "form_replay", step = n + 1, "{step:?}");
        match step {
            Step::Edit(delta) => {
                {
                    let mut h = host.lock();
                    for (key, value) in leaves(delta) {
                        h.edit(&key, value);
                    }
                }
                let resolution = form.handle_values_change(delta);
                writeln!(
                    out,
                    "== {}: edit {} ({})",
                    n + 1,
                    Value::Object(delta.clone()),
                    describe(&resolution)
                )?;
            }
            Step::Submit(reply) => {
                let outcome = form.submit(&|_values: Values, c: Completion| match reply {
                    Reply::Plain(Verdict::Success) => c.on_success(None),
                    Reply::Plain(Verdict::Failure) => c.on_failure(),
                    Reply::Message { success } => c.on_success(Some(success.as_str())),
                });
                writeln!(out, "== {}: submit ({})", n + 1, describe_submit(&outcome))?;
                let h = host.lock();
                for msg in h.notifications() {
                    writeln!(out, "   notice: {msg}")?;
                }
            }
        }
        print_plan(&form, &dispatcher, out)?;
    }
    Ok(())
}

/// Leaf `(key, value)` pairs of a delta. Empty objects count as leaves.
fn leaves(delta: &Values) -> Vec<(FieldKey, Value)> {
    /// Depth-first walk collecting leaves under `prefix`.
    fn walk(obj: &Values, prefix: &mut Vec<String>, out: &mut Vec<(FieldKey, Value)>) {
        for (k, v) in obj {
            prefix.push(k.clone());
            match v {
                Value::Object(inner) if !inner.is_empty() => walk(inner, prefix, out),
                _ => out.push((FieldKey::from_path(prefix.clone()), v.clone())),
            }
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    walk(delta, &mut Vec::new(), &mut out);
    out
}

/// One-line summary of a resolution.
fn describe(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Recomputed { driver, changed } => {
            format!("driver {driver}, {}", if *changed { "changed" } else { "same" })
        }
        Resolution::Unchanged(skip) => format!("unchanged: {skip}"),
    }
}

/// One-line summary of a submit outcome.
fn describe_submit(outcome: &SubmitOutcome) -> String {
    match outcome {
        SubmitOutcome::Started => "started".to_string(),
        SubmitOutcome::Ignored => "ignored".to_string(),
        SubmitOutcome::Invalid(errors) => {
            let parts: Vec<String> = errors
                .iter()
                .map(|e| format!("{}: {}", e.key, e.messages.join("; ")))
                .collect();
            format!("invalid: {}", parts.join(", "))
        }
    }
}

/// Text renderers for the transcript.
fn dispatcher() -> Dispatcher<String> {
    Dispatcher::new(|v: &FieldView<'_>| format!("[{}]", show(v.value)))
        .with(FieldType::Checkbox, |v: &FieldView<'_>| {
            let on = v.value.and_then(Value::as_bool).unwrap_or(false);
            (if on { "[x]" } else { "[ ]" }).to_string()
        })
        .with(FieldType::Select, |v: &FieldView<'_>| format!("<{}>", show(v.value)))
        .with(FieldType::Textarea, |v: &FieldView<'_>| format!("[[{}]]", show(v.value)))
}

/// Compact display of an optional value.
fn show(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write the current render plan.
fn print_plan(
    form: &Form<MemoryHost>,
    dispatcher: &Dispatcher<String>,
    out: &mut impl Write,
) -> Result<()> {
    let plan = form.render(dispatcher);
    for field in &plan.fields {
        let label = field.label.as_deref().unwrap_or("");
        let control = field.control.as_deref().unwrap_or("(hidden)");
        let flag = if field.state.disabled { " disabled" } else { "" };
        writeln!(
            out,
            "   {:<16} {:<13} {label} {control}{flag}",
            field.key.to_string(),
            field.field_type.tag()
        )?;
    }
    if let Some(submit) = plan.submit {
        let state = if submit.loading { " (submitting)" } else { "" };
        writeln!(out, "   ({}){state}", submit.label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use form_config::{Format, load_from_str};
    use serde_json::json;

    use super::*;

    const FORM: &str = r#"{
        "saveText": "Send",
        "fields": [
            {"name": "contact", "type": "select", "extraProps": {"config": {
                "phone": {"visible": ["contact", "phone"], "hidden": []},
                "email": {"visible": [], "hidden": ["phone"]}
            }}},
            {"name": "email", "rules": [{"required": true}]},
            {"name": "phone"},
            {"name": "subscribe", "type": "checkbox"}
        ]
    }"#;

    fn transcript(steps: &str) -> String {
        let spec = load_from_str(FORM, Format::Json).unwrap();
        let steps: Vec<Step> = serde_json::from_str(steps).unwrap();
        let mut out = Vec::new();
        run(spec, &steps, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_every_step_shape() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[{"edit": {"a": 1}}, {"submit": "success"}, {"submit": "failure"},
                {"submit": {"success": "ok"}}]"#,
        )
        .unwrap();
        assert_eq!(
            steps[1..],
            [
                Step::Submit(Reply::Plain(Verdict::Success)),
                Step::Submit(Reply::Plain(Verdict::Failure)),
                Step::Submit(Reply::Message {
                    success: "ok".into()
                }),
            ]
        );
        assert!(serde_json::from_str::<Vec<Step>>(r#"[{"click": {}}]"#).is_err());
    }

    #[test]
    fn nested_deltas_split_into_leaves() {
        let delta = json!({"plan": {"tier": "pro", "seats": 3}, "extra": {}});
        let got: Vec<String> = leaves(delta.as_object().unwrap())
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        assert_eq!(got, ["plan.tier=\"pro\"", "plan.seats=3", "extra={}"]);
    }

    #[test]
    fn edit_switches_branch() {
        let t = transcript(r#"[{"edit": {"contact": "phone"}}]"#);
        assert!(t.contains("== 1: edit {\"contact\":\"phone\"} (driver contact, changed)"));
        let after = t.split("== 1:").nth(1).unwrap();
        assert!(after.contains("phone"));
        assert!(!after.contains("subscribe"));
    }

    #[test]
    fn invalid_then_successful_submit() {
        let t = transcript(
            r#"[{"submit": "success"},
                {"edit": {"email": "a@b.c"}},
                {"submit": {"success": "Thanks"}}]"#,
        );
        assert!(t.contains("== 1: submit (invalid: email: 'email' is required)"));
        assert!(t.contains("== 3: submit (started)"));
        assert!(t.contains("notice: Thanks"));
        assert!(t.contains("[a@b.c]"));
    }

    #[test]
    fn checkbox_renders_checked_state() {
        let t = transcript(r#"[{"edit": {"subscribe": true}}]"#);
        assert!(t.contains("[x]"));
    }
}
