//! Marker extraction from test-description documents.
//!
//! Test descriptions are plain structured documents enriched with two kinds
//! of specially-suffixed mapping keys: `<sub_path>__test` keys carrying an
//! annotation payload for the node at (current position + sub_path), and
//! `<name>__yaml` keys whose value is an embedded document that must be
//! compiled separately. Stripping removes both, replacing embedded documents
//! with a `test:<N>.yaml` reference string, and reports everything it
//! extracted as an ordered event list.
//!
//! Events are emitted post-order: an embedded document's own events come
//! before the embed event that externalizes it, and a container's children
//! contribute their events before the container's own annotations. The
//! compiler driver reverses the combined list to get the root-first order
//! in which annotations must be resolved against the schema.

use crate::error::{Error, Result};
use crate::path::{display_path, PathSegment};
use serde_yaml::{Mapping, Value};

/// Key suffix marking an annotation payload.
pub const TEST_SUFFIX: &str = "__test";

/// Key suffix marking an embedded document.
pub const YAML_SUFFIX: &str = "__yaml";

/// One extraction event produced while stripping a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An annotation payload applying to the node at `path`.
    Annotation {
        path: Vec<PathSegment>,
        payload: Value,
    },
    /// An embedded document externalized under the given index. The
    /// document has already been stripped itself.
    Embed { index: usize, document: Value },
}

/// Strips all markers from a document, returning the cleaned tree and the
/// extraction events in emission order. The embed counter is scoped to this
/// call, so independent documents compile independently.
pub fn strip_document(document: Value) -> Result<(Value, Vec<Event>)> {
    let mut events = Vec::new();
    let mut counter = 0;
    let stripped = strip_node(document, &[], &mut counter, &mut events)?;
    Ok((stripped, events))
}

fn strip_node(
    value: Value,
    path: &[PathSegment],
    counter: &mut usize,
    events: &mut Vec<Event>,
) -> Result<Value> {
    match value {
        Value::Mapping(map) => strip_mapping(map, path, counter, events),
        Value::Sequence(seq) => {
            let mut stripped = Vec::with_capacity(seq.len());
            for (index, element) in seq.into_iter().enumerate() {
                let mut child_path = path.to_vec();
                child_path.push(PathSegment::Index(index));
                stripped.push(strip_node(element, &child_path, counter, events)?);
            }
            Ok(Value::Sequence(stripped))
        }
        scalar => Ok(scalar),
    }
}

/// A mapping entry classified by its marker kind. Classification happens
/// over the whole mapping before any entry is processed, so the marker scan
/// never observes its own edits.
enum MarkedEntry {
    Annotation { sub_path: Vec<PathSegment>, payload: Value },
    Embed { name: String, document: Value },
    Plain { key: String, value: Value },
}

fn strip_mapping(
    map: Mapping,
    path: &[PathSegment],
    counter: &mut usize,
    events: &mut Vec<Event>,
) -> Result<Value> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key = match key.as_str() {
            Some(key) => key.to_string(),
            None => {
                return Err(Error::NonStringKey {
                    path: display_path(path),
                })
            }
        };
        entries.push(if let Some(prefix) = key.strip_suffix(TEST_SUFFIX) {
            MarkedEntry::Annotation {
                sub_path: parse_sub_path(prefix),
                payload: value,
            }
        } else if let Some(name) = key.strip_suffix(YAML_SUFFIX) {
            MarkedEntry::Embed {
                name: name.to_string(),
                document: value,
            }
        } else {
            MarkedEntry::Plain { key, value }
        });
    }

    let mut annotations = Vec::new();
    let mut embeds = Vec::new();
    let mut plains = Vec::new();
    for entry in entries {
        match entry {
            MarkedEntry::Annotation { sub_path, payload } => {
                let mut full_path = path.to_vec();
                full_path.extend(sub_path);
                annotations.push((full_path, payload));
            }
            MarkedEntry::Embed { name, document } => embeds.push((name, document)),
            MarkedEntry::Plain { key, value } => plains.push((key, value)),
        }
    }

    // Embedded documents are numbered before descending into the plain
    // children, so a node's own embeds always precede embeds nested deeper.
    // Replacement entries land at the end of the rebuilt mapping, mirroring
    // a pop-and-reinsert.
    let mut replacements = Vec::new();
    for (name, document) in embeds {
        let index = *counter;
        *counter += 1;
        let mut embed_path = path.to_vec();
        embed_path.push(PathSegment::Key(name.clone()));
        embed_path.push(PathSegment::Key("data".to_string()));
        let document = strip_node(document, &embed_path, counter, events)?;
        events.push(Event::Embed { index, document });
        replacements.push((name, Value::String(format!("test:{index}.yaml"))));
    }

    let mut stripped = Mapping::new();
    for (key, value) in plains {
        let mut child_path = path.to_vec();
        child_path.push(PathSegment::Key(key.clone()));
        let value = strip_node(value, &child_path, counter, events)?;
        stripped.insert(Value::String(key), value);
    }
    for (path, payload) in annotations {
        events.push(Event::Annotation { path, payload });
    }
    for (name, reference) in replacements {
        stripped.insert(Value::String(name), reference);
    }
    Ok(Value::Mapping(stripped))
}

/// Splits the text before a `__test` suffix into raw path segments. An
/// empty sub-path means the annotation applies to the current node itself;
/// all-digit segments address sequence positions.
fn parse_sub_path(prefix: &str) -> Vec<PathSegment> {
    if prefix.is_empty() {
        return Vec::new();
    }
    prefix
        .split('.')
        .map(|segment| match segment.parse::<usize>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(segment.to_string()),
        })
        .collect()
}
