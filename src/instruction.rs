//! Parsing of annotation payloads into test-runner instructions.
//!
//! An annotation payload is a sequence of mappings, each holding some of
//! the known sub-keys (`level`, `diag`, `type`, `comment`). Every known
//! sub-key contributes at most one instruction targeting the annotation's
//! canonical path; anything left over after the known keys are consumed is
//! a hard error naming the offending keys. The document-level `diags` key
//! parses separately into global diagnostic overrides.

use crate::error::{Error, Result};
use crate::glob;
use crate::path::{self, PathElement};
use crate::unit::{DiagOverride, Instruction, Severity};
use serde_yaml::{Mapping, Value};

pub(crate) fn take(map: &mut Mapping, key: &str) -> Option<Value> {
    map.remove(&Value::String(key.to_string()))
}

fn leftover_keys(map: &Mapping) -> String {
    map.keys()
        .map(|key| match key.as_str() {
            Some(key) => key.to_string(),
            None => format!("{key:?}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn expect_string(value: Value, context: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(Error::WrongType {
            context: context.to_string(),
            expected: "a string",
        }),
    }
}

fn expect_severity(value: Value, context: &str) -> Result<Severity> {
    expect_string(value, context)?.parse()
}

fn expect_int(value: Value, context: &str) -> Result<i64> {
    value.as_i64().ok_or_else(|| Error::WrongType {
        context: context.to_string(),
        expected: "an integer",
    })
}

/// Parses one annotation payload into instructions for the given canonical
/// path. The payload is a sequence of instruction mappings; absence of a
/// known sub-key simply yields no instruction of that kind.
pub fn parse_annotation(payload: Value, path: &[PathElement]) -> Result<Vec<Instruction>> {
    let entries = match payload {
        Value::Sequence(entries) => entries,
        _ => {
            return Err(Error::WrongType {
                context: "__test payload".to_string(),
                expected: "a list of instruction mappings",
            })
        }
    };
    let mut instructions = Vec::new();
    for entry in entries {
        let mut entry = match entry {
            Value::Mapping(entry) => entry,
            _ => {
                return Err(Error::WrongType {
                    context: "__test[]".to_string(),
                    expected: "a mapping",
                })
            }
        };
        if let Some(value) = take(&mut entry, "level") {
            instructions.push(parse_level(value, path)?);
        }
        if let Some(value) = take(&mut entry, "diag") {
            instructions.push(parse_diag(value, path)?);
        }
        if let Some(value) = take(&mut entry, "type") {
            instructions.push(Instruction::DataType {
                path: path.to_vec(),
                data_type: expect_string(value, "__test.type")?,
            });
        }
        if let Some(value) = take(&mut entry, "comment") {
            instructions.push(Instruction::Comment {
                path: path.to_vec(),
                msg: expect_string(value, "__test.comment")?,
            });
        }
        if !entry.is_empty() {
            return Err(Error::UnknownKeys {
                context: "__test".to_string(),
                keys: leftover_keys(&entry),
            });
        }
    }
    Ok(instructions)
}

/// Parses the `level` sub-key: a single severity string, or a list of them.
fn parse_level(value: Value, path: &[PathElement]) -> Result<Instruction> {
    let allowed_severities = match value {
        Value::String(s) => vec![s.parse()?],
        Value::Sequence(entries) => entries
            .into_iter()
            .map(|entry| expect_severity(entry, "__test.level[]"))
            .collect::<Result<Vec<_>>>()?,
        _ => {
            return Err(Error::WrongType {
                context: "__test.level".to_string(),
                expected: "a severity string or a list of severity strings",
            })
        }
    };
    Ok(Instruction::Level {
        path: path.to_vec(),
        allowed_severities,
    })
}

/// Parses the `diag` sub-key into a diagnostic-matching instruction. The
/// `msg` pattern is translated to a glob, and `before`/`after` use the
/// standalone path-element grammar since no schema applies to them.
fn parse_diag(value: Value, path: &[PathElement]) -> Result<Instruction> {
    let mut map = match value {
        Value::Mapping(map) => map,
        _ => {
            return Err(Error::WrongType {
                context: "__test.diag".to_string(),
                expected: "a mapping",
            })
        }
    };
    let code = take(&mut map, "code")
        .map(|value| expect_int(value, "__test.diag.code"))
        .transpose()?;
    let level = take(&mut map, "level")
        .map(|value| expect_severity(value, "__test.diag.level"))
        .transpose()?;
    let original_level = take(&mut map, "original_level")
        .map(|value| expect_severity(value, "__test.diag.original_level"))
        .transpose()?;
    let msg = take(&mut map, "msg")
        .map(|value| expect_string(value, "__test.diag.msg"))
        .transpose()?
        .map(|pattern| glob::translate(&pattern));
    let before = take(&mut map, "before")
        .map(|value| expect_string(value, "__test.diag.before"))
        .transpose()?
        .map(|text| path::parse_element(&text))
        .transpose()?;
    let after = take(&mut map, "after")
        .map(|value| expect_string(value, "__test.diag.after"))
        .transpose()?
        .map(|text| path::parse_element(&text))
        .transpose()?;
    if !map.is_empty() {
        return Err(Error::UnknownKeys {
            context: "__test.diag".to_string(),
            keys: leftover_keys(&map),
        });
    }
    Ok(Instruction::Diag {
        path: path.to_vec(),
        code,
        level,
        original_level,
        msg,
        before,
        after,
    })
}

/// Parses the document-level `diags` key into global diagnostic overrides.
/// Each entry requires an integer `code`; `min` and `max` default to info
/// and error respectively.
pub fn parse_diag_overrides(value: Value) -> Result<Vec<DiagOverride>> {
    let entries = match value {
        Value::Sequence(entries) => entries,
        _ => {
            return Err(Error::WrongType {
                context: "diags".to_string(),
                expected: "a list",
            })
        }
    };
    let mut overrides = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut map = match entry {
            Value::Mapping(map) => map,
            _ => {
                return Err(Error::WrongType {
                    context: "diags[]".to_string(),
                    expected: "a mapping",
                })
            }
        };
        let code = match take(&mut map, "code") {
            Some(value) => expect_int(value, "diags[].code")?,
            None => {
                return Err(Error::WrongType {
                    context: "diags[].code".to_string(),
                    expected: "an integer",
                })
            }
        };
        let min = take(&mut map, "min")
            .map(|value| expect_severity(value, "diags[].min"))
            .transpose()?
            .unwrap_or(Severity::Info);
        let max = take(&mut map, "max")
            .map(|value| expect_severity(value, "diags[].max"))
            .transpose()?
            .unwrap_or(Severity::Error);
        if !map.is_empty() {
            return Err(Error::UnknownKeys {
                context: "diags[]".to_string(),
                keys: leftover_keys(&map),
            });
        }
        overrides.push(DiagOverride { code, min, max });
    }
    Ok(overrides)
}
