//! Schema and serializer capability interfaces.
//!
//! The path resolver only needs a handful of reflection queries against the
//! message type it is walking, so schemas are modeled as the [`MessageNode`]
//! trait rather than any particular reflection mechanism. [`MessageSchema`]
//! is a concrete implementation deserialized from a YAML schema description,
//! which is how the CLI supplies the descriptor graph. The stripped plan is
//! turned into bytes through the [`PlanSerializer`] trait; [`JsonPlanSerializer`]
//! is the built-in implementation producing canonical JSON.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::path::Path;

/// Reflection data for one field of a message type.
pub struct FieldInfo<'a> {
    /// Native (snake_case) field name.
    pub name: &'a str,
    /// Whether the field is repeated.
    pub repeated: bool,
    /// Name of the oneof group this field belongs to, if any.
    pub oneof: Option<&'a str>,
    /// The message type the field recurses into, or `None` for scalars.
    pub message: Option<&'a dyn MessageNode>,
}

/// Reflection interface the path resolver needs from a message descriptor.
pub trait MessageNode {
    /// Fully qualified type name, used in error messages.
    fn type_name(&self) -> &str;

    /// Looks up a field by its external (camelCase) name.
    fn field_by_json_name(&self, name: &str) -> Option<FieldInfo<'_>>;

    /// Looks up a field by its native name.
    fn field_by_name(&self, name: &str) -> Option<FieldInfo<'_>>;
}

/// Derives the external camelCase name from a native snake_case name, the
/// way protobuf JSON names are derived: underscores are dropped and the
/// following character is uppercased.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// An in-memory message descriptor, deserializable from a YAML schema
/// description file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// One field declaration within a [`MessageSchema`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    pub name: String,
    /// External name override; derived from `name` when absent.
    #[serde(default)]
    pub json_name: Option<String>,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub oneof: Option<String>,
    #[serde(default)]
    pub message: Option<Box<MessageSchema>>,
}

impl FieldSchema {
    fn info(&self) -> FieldInfo<'_> {
        FieldInfo {
            name: &self.name,
            repeated: self.repeated,
            oneof: self.oneof.as_deref(),
            message: self
                .message
                .as_deref()
                .map(|m| m as &dyn MessageNode),
        }
    }
}

impl MessageSchema {
    /// Reads a schema description from a YAML file.
    pub fn from_file(path: &Path) -> Result<MessageSchema> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl MessageNode for MessageSchema {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn field_by_json_name(&self, name: &str) -> Option<FieldInfo<'_>> {
        self.fields
            .iter()
            .find(|f| match &f.json_name {
                Some(json_name) => json_name == name,
                None => to_camel_case(&f.name) == name,
            })
            .map(FieldSchema::info)
    }

    fn field_by_name(&self, name: &str) -> Option<FieldInfo<'_>> {
        self.fields.iter().find(|f| f.name == name).map(FieldSchema::info)
    }
}

/// Serializes a fully-stripped plan into the byte payload embedded in the
/// compiled test unit.
pub trait PlanSerializer {
    fn serialize(&self, plan: &Yaml) -> Result<Vec<u8>>;
}

/// Serializes the stripped plan as canonical JSON bytes.
pub struct JsonPlanSerializer;

impl PlanSerializer for JsonPlanSerializer {
    fn serialize(&self, plan: &Yaml) -> Result<Vec<u8>> {
        let json = yaml_to_json(plan, "plan")?;
        Ok(serde_json::to_vec(&json)?)
    }
}

/// Converts a YAML tree into its JSON equivalent. Mapping keys must be
/// strings; YAML tags and non-finite floats are rejected.
pub fn yaml_to_json(value: &Yaml, context: &str) -> Result<serde_json::Value> {
    use serde_json::Value as Json;
    match value {
        Yaml::Null => Ok(Json::Null),
        Yaml::Bool(b) => Ok(Json::Bool(*b)),
        Yaml::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Json::Number(u.into()))
            } else if let Some(i) = n.as_i64() {
                Ok(Json::Number(i.into()))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Json::Number)
                    .ok_or_else(|| Error::WrongType {
                        context: context.to_string(),
                        expected: "a finite number",
                    })
            }
        }
        Yaml::String(s) => Ok(Json::String(s.clone())),
        Yaml::Sequence(seq) => Ok(Json::Array(
            seq.iter()
                .enumerate()
                .map(|(i, v)| yaml_to_json(v, &format!("{context}.{i}")))
                .collect::<Result<Vec<_>>>()?,
        )),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let key = key.as_str().ok_or_else(|| Error::NonStringKey {
                    path: context.to_string(),
                })?;
                let value = yaml_to_json(value, &format!("{context}.{key}"))?;
                object.insert(key.to_string(), value);
            }
            Ok(Json::Object(object))
        }
        Yaml::Tagged(_) => Err(Error::WrongType {
            context: context.to_string(),
            expected: "a plain YAML value",
        }),
    }
}

/// Schema shaped like a small slice of a plan message graph, shared by the
/// resolver and compiler tests.
#[cfg(test)]
pub(crate) fn plan_schema() -> MessageSchema {
    serde_yaml::from_str(
        r#"
        name: test.Plan
        fields:
          - name: version
            message:
              name: test.Version
              fields:
                - name: major_number
                - name: minor_number
          - name: relations
            repeated: true
            message:
              name: test.PlanRel
              fields:
                - name: rel
                  oneof: rel_type
                  message:
                    name: test.Rel
                    fields:
                      - name: common
                - name: root
                  oneof: rel_type
          - name: expected_type_urls
            repeated: true
        "#,
    )
    .expect("Invalid schema literal")
}
