//! Parse and load form declarations.

use std::{ffi::OsStr, fs, path::Path};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{Error, error::excerpt_at, field::FieldDescriptor, key::Values, list::FieldList};

/// Form-level layout hint passed through to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    /// Label beside control.
    #[default]
    Horizontal,
    /// Label above control.
    Vertical,
    /// All fields on one line.
    Inline,
}

/// Raw on-disk shape of a form declaration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawFormSpec {
    /// Submit button caption.
    #[serde(default)]
    save_text: Option<String>,
    /// Layout hint.
    #[serde(default)]
    layout: Layout,
    /// Values seeded into the store on mount.
    #[serde(default)]
    initial_values: Values,
    /// Declared fields.
    fields: Vec<FieldDescriptor>,
}

/// A validated form declaration.
#[derive(Debug, Clone)]
pub struct FormSpec {
    /// Submit button caption; no submit control is rendered without one.
    pub save_text: Option<String>,
    /// Layout hint.
    pub layout: Layout,
    /// Values seeded into the store on mount.
    pub initial_values: Values,
    /// Declared fields.
    pub fields: FieldList,
}

impl FormSpec {
    /// A declaration with only fields.
    pub fn new(fields: FieldList) -> Self {
        Self {
            save_text: None,
            layout: Layout::default(),
            initial_values: Values::new(),
            fields,
        }
    }
}

impl TryFrom<RawFormSpec> for FormSpec {
    type Error = Error;

    fn try_from(raw: RawFormSpec) -> Result<Self, Self::Error> {
        Ok(Self {
            save_text: raw.save_text,
            layout: raw.layout,
            initial_values: raw.initial_values,
            fields: FieldList::new(raw.fields)?,
        })
    }
}

/// Source syntax of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON.
    Json,
    /// Rusty Object Notation.
    Ron,
}

impl Format {
    /// Detect from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("json") => Some(Self::Json),
            Some("ron") => Some(Self::Ron),
            _ => None,
        }
    }
}

/// Load a form declaration from disk; the format follows the extension.
pub fn load_from_path(path: &Path) -> Result<FormSpec, Error> {
    let Some(format) = Format::from_path(path) else {
        return Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported form format (expected a .json or .ron file)".to_string(),
        });
    };
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), ?format, "loading form declaration");
    load_from_str(&source, format).map_err(|e| e.with_path(path))
}

/// Parse a declaration from source text.
pub fn load_from_str(source: &str, format: Format) -> Result<FormSpec, Error> {
    let raw: RawFormSpec = match format {
        Format::Json => serde_json::from_str(source).map_err(|e| {
            let (line, col) = (e.line().max(1), e.column().max(1));
            Error::Parse {
                path: None,
                line,
                col,
                message: e.to_string(),
                excerpt: excerpt_at(source, line, col),
            }
        })?,
        Format::Ron => ron::from_str(source).map_err(|e| {
            let (line, col) = (e.span.start.line.max(1), e.span.start.col.max(1));
            Error::Parse {
                path: None,
                line,
                col,
                message: e.code.to_string(),
                excerpt: excerpt_at(source, line, col),
            }
        })?,
    };
    FormSpec::try_from(raw)
}

/// Parse a bare JSON array of field descriptors.
pub fn fields_from_value(value: Value) -> Result<FieldList, Error> {
    let fields: Vec<FieldDescriptor> =
        serde_json::from_value(value).map_err(|e| Error::validation(e.to_string()))?;
    FieldList::new(fields)
}
