//! Data structures for compiled test units.
//!
//! These types define the wire format of the compiled artifact: the test
//! runner deserializes exactly what this module serializes.

use crate::error::{Error, Result};
use crate::path::PathElement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a diagnostic, ordered info < warning < error.
///
/// Serializes as a single letter; input parsing also accepts the full word.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[serde(rename = "i")]
    Info,
    #[serde(rename = "w")]
    Warning,
    #[serde(rename = "e")]
    Error,
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "i" | "info" => Ok(Severity::Info),
            "w" | "warning" => Ok(Severity::Warning),
            "e" | "error" => Ok(Severity::Error),
            _ => Err(Error::InvalidSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single assertion for the test runner, always tied to the canonical
/// path it applies to. Multiple instructions may target the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Asserts that the diagnostic severity observed at `path` is one of
    /// the allowed set.
    Level {
        path: Vec<PathElement>,
        allowed_severities: Vec<Severity>,
    },

    /// Asserts that a diagnostic matching the given predicates exists at
    /// `path`, optionally ordered relative to a sibling path element.
    /// `msg` holds a glob pattern produced by the pattern translator.
    Diag {
        path: Vec<PathElement>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<Severity>,
        #[serde(skip_serializing_if = "Option::is_none")]
        original_level: Option<Severity>,
        #[serde(skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        before: Option<PathElement>,
        #[serde(skip_serializing_if = "Option::is_none")]
        after: Option<PathElement>,
    },

    /// Asserts the resolved data type string at `path`.
    DataType {
        path: Vec<PathElement>,
        data_type: String,
    },

    /// Asserts the comment string attached at `path`.
    Comment { path: Vec<PathElement>, msg: String },
}

/// A global rule narrowing the severities a diagnostic code may manifest as.
/// Not path-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagOverride {
    pub code: i64,
    pub min: Severity,
    pub max: Severity,
}

/// The fully compiled artifact for one test description, written as JSON
/// and consumed by the downstream test runner. A unit is written once and
/// regenerated from scratch by recompilation, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestUnit {
    pub name: String,
    pub plan: Vec<u8>,
    pub diag_overrides: Vec<DiagOverride>,
    pub instructions: Vec<Instruction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("i".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("x".parse::<Severity>().is_err());
        assert!("E".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"e\"");
    }

    #[test]
    fn test_level_instruction_serialization() {
        let insn = Instruction::Level {
            path: vec![PathElement::Field {
                field: "version".to_string(),
            }],
            allowed_severities: vec![Severity::Info, Severity::Error],
        };
        assert_eq!(
            serde_json::to_string(&insn).unwrap(),
            r#"{"Level":{"path":[{"Field":{"field":"version"}}],"allowed_severities":["i","e"]}}"#
        );
    }

    #[test]
    fn test_diag_instruction_omits_absent_keys() {
        let insn = Instruction::Diag {
            path: vec![],
            code: Some(1001),
            level: None,
            original_level: None,
            msg: None,
            before: None,
            after: None,
        };
        assert_eq!(
            serde_json::to_string(&insn).unwrap(),
            r#"{"Diag":{"path":[],"code":1001}}"#
        );
    }
}
