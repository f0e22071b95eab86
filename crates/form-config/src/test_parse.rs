#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, process};

    use serde_json::json;

    use crate::*;

    #[test]
    fn json_declaration_parses() {
        let src = r#"{
            "saveText": "Save",
            "layout": "inline",
            "initialValues": {"kind": "A"},
            "fields": [
                {
                    "name": "kind",
                    "type": "select",
                    "label": "Kind",
                    "extraProps": {
                        "options": ["A", "B"],
                        "config": {"A": {"visible": ["kind", "x"]}, "B": {"hidden": ["x"]}}
                    }
                },
                {"name": "x", "type": "number", "disabledWhen": {"equals": {"field": "kind", "value": "B"}}},
                {"type": "checkbox", "prefixContent": "icon", "rules": [{"required": true}]}
            ]
        }"#;
        let spec = load_from_str(src, Format::Json).unwrap();
        assert_eq!(spec.save_text.as_deref(), Some("Save"));
        assert_eq!(spec.layout, Layout::Inline);
        assert_eq!(spec.initial_values.get("kind"), Some(&json!("A")));
        assert_eq!(spec.fields.len(), 3);

        let kind = spec.fields.get(0).unwrap();
        assert_eq!(kind.field_type(), FieldType::Select);
        assert_eq!(BranchTable::of(kind).unwrap().unwrap().len(), 2);

        let x = spec.fields.get(1).unwrap();
        let values = json!({"kind": "B"}).as_object().cloned().unwrap();
        assert!(x.disabled.evaluate(&values));

        assert_eq!(spec.fields.key(2), Some(&FieldKey::positional(2)));
        assert_eq!(spec.fields.get(2).unwrap().validation_rules.len(), 1);
    }

    #[test]
    fn json_parse_error_has_location() {
        let src = "{\n  \"fields\": [\n    {\"name\": }\n  ]\n}";
        let err = load_from_str(src, Format::Json).unwrap_err();
        match err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(line, 3);
                assert!(excerpt.contains('^'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ron_declaration_parses() {
        let src = r#"(
            saveText: Some("Go"),
            fields: [
                (name: Some("kind"), type: Some("select"), extraProps: {"config": {"A": {"visible": ["kind"]}}}),
                (name: Some("x")),
            ],
        )"#;
        let spec = load_from_str(src, Format::Ron).unwrap();
        assert_eq!(spec.save_text.as_deref(), Some("Go"));
        assert_eq!(spec.fields.len(), 2);
        let table = BranchTable::of(spec.fields.get(0).unwrap()).unwrap().unwrap();
        let (branch, issue) = table.branch(&json!("A"));
        assert!(issue.is_none());
        assert_eq!(branch.visible, [json!("kind")]);
    }

    #[test]
    fn duplicate_names_fail_validation() {
        let src = r#"{"fields": [{"name": "a"}, {"name": "a"}]}"#;
        let err = load_from_str(src, Format::Json).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.pretty().starts_with("Form validation error"));
    }

    #[test]
    fn load_from_path_checks_extension_and_attaches_path() {
        let err = load_from_path(&PathBuf::from("form.yaml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));

        let dir = env::temp_dir().join(format!("form-config-test-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        fs::write(&path, r#"{"fields": [{"name": "a"}, {"name": "a"}]}"#).unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.path(), Some(path.as_path()));

        let good = dir.join("good.json");
        fs::write(&good, r#"{"fields": [{"name": "a"}]}"#).unwrap();
        assert_eq!(load_from_path(&good).unwrap().fields.len(), 1);
        let _ignored = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bare_field_array() {
        let list = fields_from_value(json!([{"name": "x"}, {"type": "mystery"}])).unwrap();
        assert_eq!(list.get(1).unwrap().field_type(), FieldType::Text);
        assert!(fields_from_value(json!({"name": "x"})).is_err());
    }
}
