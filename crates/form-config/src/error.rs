//! Error types for form declaration loading and validation.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone)]
/// Errors produced while loading, parsing, or validating a form declaration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// Parse error with a concrete line/column location and excerpt.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("{message}")]
    /// The declaration parsed but describes an invalid field list.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Build a validation error without a source path.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            message: message.into(),
        }
    }

    /// Attach `path` to this error, keeping any path already present.
    pub(crate) fn with_path(self, p: &Path) -> Self {
        match self {
            Self::Read { path, message } => Self::Read {
                path: path.or_else(|| Some(p.to_path_buf())),
                message,
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => Self::Parse {
                path: path.or_else(|| Some(p.to_path_buf())),
                line,
                col,
                message,
                excerpt,
            },
            Self::Validation { path, message } => Self::Validation {
                path: path.or_else(|| Some(p.to_path_buf())),
                message,
            },
        }
    }

    /// Render a human-friendly error message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => match path {
                Some(p) => format!(
                    "Form parse error at {}:{}:{}\n{}\n{}",
                    p.display(),
                    line,
                    col,
                    message,
                    excerpt
                ),
                None => format!(
                    "Form parse error at line {}, column {}\n{}\n{}",
                    line, col, message, excerpt
                ),
            },
            Self::Validation { path, message } => match path {
                Some(p) => format!("Form validation error at {}\n{}", p.display(), message),
                None => format!("Form validation error\n{}", message),
            },
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

/// Build a small 2-3 line excerpt with a caret at `(line_no, col_no)`.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_marks_column() {
        let src = "a\nbcd\ne";
        let ex = excerpt_at(src, 2, 3);
        assert!(ex.contains("    2 | bcd"));
        let caret_line = ex.lines().find(|l| l.trim_end().ends_with('^')).unwrap();
        // 8-char gutter plus two columns of offset.
        assert_eq!(caret_line.find('^').unwrap(), 10);
    }

    #[test]
    fn with_path_keeps_existing() {
        let err = Error::Read {
            path: Some(PathBuf::from("first.json")),
            message: "nope".into(),
        }
        .with_path(Path::new("second.json"));
        assert_eq!(err.path(), Some(Path::new("first.json")));
        assert!(err.pretty().starts_with("Read error at first.json"));
    }
}
