//! Resolution of raw paths against a message schema.
//!
//! Raw paths address nodes by external field name and sequence index; the
//! downstream runner wants canonical path elements carrying native field
//! names, repeated-field pairing, and oneof group membership. Resolution
//! walks the schema one segment at a time. Once the schema runs out (a
//! scalar field, or no schema to begin with) it stays out: remaining
//! segments become bare `Field`/`Index` elements.

use crate::error::{Error, Result};
use crate::path::{PathElement, PathSegment};
use crate::schema::MessageNode;

/// Converts a raw path into canonical path elements, starting resolution
/// at the given schema node. `None` means unconstrained: every segment
/// passes through as a bare field or index. Purely functional; neither the
/// schema nor the input path is modified.
pub fn resolve_path(
    segments: &[PathSegment],
    root: Option<&dyn MessageNode>,
) -> Result<Vec<PathElement>> {
    let mut elements = Vec::new();
    let mut node = root;
    let mut iter = segments.iter();
    while let Some(segment) = iter.next() {
        match (segment, node) {
            (PathSegment::Index(index), None) => {
                elements.push(PathElement::Index { index: *index });
            }
            (PathSegment::Key(name), None) => {
                elements.push(PathElement::Field {
                    field: name.clone(),
                });
            }
            (PathSegment::Index(_), Some(desc)) => {
                // Repeated-field indices must be paired with their field
                // name; a bare index means the path description is wrong.
                return Err(Error::UnexpectedIndex {
                    message: desc.type_name().to_string(),
                });
            }
            (PathSegment::Key(name), Some(desc)) => {
                let field = desc
                    .field_by_json_name(name)
                    .or_else(|| desc.field_by_name(name))
                    .ok_or_else(|| Error::UnknownField {
                        field: name.clone(),
                        message: desc.type_name().to_string(),
                    })?;
                if field.repeated {
                    match iter.next() {
                        Some(PathSegment::Index(index)) => {
                            elements.push(PathElement::Repeated {
                                field: field.name.to_string(),
                                index: *index,
                            });
                        }
                        Some(PathSegment::Key(_)) => {
                            return Err(Error::NonIndexElement {
                                field: field.name.to_string(),
                                message: desc.type_name().to_string(),
                            });
                        }
                        None => {
                            return Err(Error::MissingIndex {
                                field: field.name.to_string(),
                                message: desc.type_name().to_string(),
                            });
                        }
                    }
                } else if let Some(group) = field.oneof {
                    elements.push(PathElement::Oneof {
                        field: group.to_string(),
                        variant: field.name.to_string(),
                    });
                } else {
                    elements.push(PathElement::Field {
                        field: field.name.to_string(),
                    });
                }
                node = field.message;
            }
        }
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{plan_schema, MessageSchema};

    fn resolve(segments: &[PathSegment], schema: &MessageSchema) -> Result<Vec<PathElement>> {
        resolve_path(segments, Some(schema as &dyn MessageNode))
    }

    fn key(name: &str) -> PathSegment {
        PathSegment::Key(name.to_string())
    }

    #[test]
    fn test_resolves_repeated_oneof_and_field() {
        let schema = plan_schema();
        let elements = resolve(
            &[
                key("relations"),
                PathSegment::Index(0),
                key("rel"),
                key("common"),
            ],
            &schema,
        )
        .unwrap();
        assert_eq!(
            elements,
            vec![
                PathElement::Repeated {
                    field: "relations".to_string(),
                    index: 0
                },
                PathElement::Oneof {
                    field: "rel_type".to_string(),
                    variant: "rel".to_string()
                },
                PathElement::Field {
                    field: "common".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_camel_case_lookup_yields_native_name() {
        let schema = plan_schema();
        let elements = resolve(&[key("expectedTypeUrls"), PathSegment::Index(2)], &schema).unwrap();
        assert_eq!(
            elements,
            vec![PathElement::Repeated {
                field: "expected_type_urls".to_string(),
                index: 2
            }]
        );
    }

    #[test]
    fn test_schema_loss_is_monotonic() {
        let schema = plan_schema();
        // major_number is a scalar, so everything after it falls off the
        // schema and must resolve to bare fields and indices.
        let elements = resolve(
            &[
                key("version"),
                key("majorNumber"),
                key("anything"),
                PathSegment::Index(7),
            ],
            &schema,
        )
        .unwrap();
        assert_eq!(
            elements[2],
            PathElement::Field {
                field: "anything".to_string()
            }
        );
        assert_eq!(elements[3], PathElement::Index { index: 7 });
    }

    #[test]
    fn test_no_schema_passthrough() {
        let elements =
            resolve_path(&[key("free"), PathSegment::Index(1)], None).unwrap();
        assert_eq!(
            elements,
            vec![
                PathElement::Field {
                    field: "free".to_string()
                },
                PathElement::Index { index: 1 },
            ]
        );
    }

    #[test]
    fn test_unknown_field() {
        let schema = plan_schema();
        assert!(matches!(
            resolve(&[key("bogus")], &schema),
            Err(Error::UnknownField { field, message })
                if field == "bogus" && message == "test.Plan"
        ));
    }

    #[test]
    fn test_bare_index_with_schema_present() {
        let schema = plan_schema();
        assert!(matches!(
            resolve(&[PathSegment::Index(0)], &schema),
            Err(Error::UnexpectedIndex { .. })
        ));
    }

    #[test]
    fn test_repeated_field_requires_following_index() {
        let schema = plan_schema();
        assert!(matches!(
            resolve(&[key("relations")], &schema),
            Err(Error::MissingIndex { .. })
        ));
        assert!(matches!(
            resolve(&[key("relations"), key("rel")], &schema),
            Err(Error::NonIndexElement { .. })
        ));
    }

    #[test]
    fn test_repeated_pair_counts_as_one_element() {
        let schema = plan_schema();
        let segments = [
            key("relations"),
            PathSegment::Index(3),
            key("rel"),
        ];
        let elements = resolve(&segments, &schema).unwrap();
        assert_eq!(elements.len(), segments.len() - 1);
    }
}
