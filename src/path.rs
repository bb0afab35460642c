//! Raw and canonical path representations.
//!
//! A raw path is the position of an annotation marker within the document
//! tree, before any schema information is applied: just field names and
//! sequence indices. The path resolver turns raw paths into canonical
//! [`PathElement`] sequences, which is the form the downstream test runner
//! understands. This module also implements the standalone textual grammar
//! for path elements used by the `before`/`after` sub-keys of diagnostic
//! instructions.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One segment of a raw (pre-schema) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A field name in a mapping.
    Key(String),
    /// A position in a sequence.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(name) => write!(f, "{}", name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Renders a raw path as a dotted string for error messages.
pub fn display_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// One element of a canonical, schema-aware path.
///
/// The serialized form is externally tagged, matching what the test runner
/// deserializes: `{"Field": {"field": ...}}` and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathElement {
    /// A scalar or message field access.
    Field { field: String },
    /// An access into a repeated field at the given position.
    Repeated { field: String, index: usize },
    /// An access into one arm of a oneof group, naming both the group and
    /// the chosen arm.
    Oneof { field: String, variant: String },
    /// A bare position in an already-repeated context, used once the path
    /// has fallen off the schema.
    Index { index: usize },
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Field { field } => write!(f, "{}", field),
            PathElement::Repeated { field, index } => write!(f, "{}[{}]", field, index),
            PathElement::Oneof { field, variant } => write!(f, "{}<{}>", field, variant),
            PathElement::Index { index } => write!(f, "[{}]", index),
        }
    }
}

/// Converts a potentially quoted identifier to its plain string form.
fn destringify_ident(s: &str) -> String {
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        s[1..s.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        s.to_string()
    }
}

const IDENT: &str = r#"([a-zA-Z_][a-zA-Z0-9_]*|"(?:[^"\\]|\\.)*")"#;
const INDEX: &str = r"\[(0|[1-9][0-9]*)\]";

/// Parses the textual path element syntax: a bare or quoted identifier, an
/// identifier with a `<variant>` suffix for oneofs, an identifier with a
/// `[index]` suffix for repeated fields, or a bare `[index]`.
pub fn parse_element(s: &str) -> Result<PathElement> {
    let field_re = Regex::new(&format!("^{IDENT}$")).expect("Invalid regex");
    if let Some(caps) = field_re.captures(s) {
        return Ok(PathElement::Field {
            field: destringify_ident(&caps[1]),
        });
    }
    let oneof_re = Regex::new(&format!("^{IDENT}<{IDENT}>$")).expect("Invalid regex");
    if let Some(caps) = oneof_re.captures(s) {
        return Ok(PathElement::Oneof {
            field: destringify_ident(&caps[1]),
            variant: destringify_ident(&caps[2]),
        });
    }
    let repeated_re = Regex::new(&format!("^{IDENT}{INDEX}$")).expect("Invalid regex");
    if let Some(caps) = repeated_re.captures(s) {
        let index = caps[2]
            .parse()
            .map_err(|_| Error::PathElementSyntax(s.to_string()))?;
        return Ok(PathElement::Repeated {
            field: destringify_ident(&caps[1]),
            index,
        });
    }
    let index_re = Regex::new(&format!("^{INDEX}$")).expect("Invalid regex");
    if let Some(caps) = index_re.captures(s) {
        let index = caps[1]
            .parse()
            .map_err(|_| Error::PathElementSyntax(s.to_string()))?;
        return Ok(PathElement::Index { index });
    }
    Err(Error::PathElementSyntax(s.to_string()))
}
