//! Path resolution over a schema-typed document tree.
//!
//! [`resolve`] walks every segment but the last, discriminating on the live
//! container at each step and materializing missing intermediates from the
//! schema's default values. The final segment is returned unresolved as a
//! [`Slot`] so the calling operation decides whether to create, overwrite,
//! or remove it.
//!
//! [`read`] is the non-materializing counterpart used by `copy`, `move`,
//! and `test` to observe a value without mutating the document.

use serde_json::Value;

use record_patch_pointer::{format_pointer, format_prefix, Path, Step};

use crate::schema::SchemaIndex;
use crate::types::PatchError;

/// The slot within a parent container that a path's final segment denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The empty path: the whole document.
    Root,
    /// A named field of an object container.
    Key(String),
    /// A zero-based position in an array container.
    Index(usize),
    /// One past the current end of an array container.
    Append,
}

/// Result of resolving a path: the container that directly holds the
/// target, the slot within it, and the pointer strings of every sub-record
/// boundary crossed on the way (the root `""` always included).
#[derive(Debug)]
pub struct Resolved<'a> {
    pub parent: &'a mut Value,
    pub slot: Slot,
    pub records: Vec<String>,
}

fn invalid(path: &Path, reason: String) -> PatchError {
    PatchError::InvalidPath {
        path: format_pointer(path),
        reason,
    }
}

fn no_schema(path: &Path, depth: usize) -> PatchError {
    invalid(
        path,
        format!(
            "no schema entry for \"{}\"",
            format_prefix(path, depth + 1)
        ),
    )
}

/// Resolve `path` against `document`, materializing missing intermediate
/// containers from `schema` defaults.
///
/// Only containers strictly before the final segment are ever created; the
/// final segment itself is left to the caller. An intermediate array index
/// equal to the array's length appends the element's default (this is how
/// `-` segments in the middle of a path behave); an index past the end is
/// an error.
pub fn resolve<'a>(
    document: &'a mut Value,
    schema: &SchemaIndex,
    path: &Path,
) -> Result<Resolved<'a>, PatchError> {
    let mut records = vec![String::new()];
    if path.is_empty() {
        return Ok(Resolved {
            parent: document,
            slot: Slot::Root,
            records,
        });
    }

    let last = path.len() - 1;
    let mut parent: &mut Value = document;
    let mut cursor: Option<&SchemaIndex> = Some(schema);

    for (depth, step) in path[..last].iter().enumerate() {
        parent = match parent {
            Value::Array(arr) => {
                let index = match step {
                    Step::Append => arr.len(),
                    Step::Index(n) => *n,
                    Step::Key(key) => {
                        return Err(invalid(path, format!("invalid index on array: {key}")))
                    }
                };
                if index > arr.len() {
                    return Err(PatchError::IndexOutOfRange {
                        path: format_prefix(path, depth + 1),
                        index,
                    });
                }
                let element = cursor.and_then(SchemaIndex::element);
                if index == arr.len() {
                    let element = element.ok_or_else(|| no_schema(path, depth))?;
                    arr.push(element.materialize());
                }
                cursor = element;
                if cursor.is_some_and(SchemaIndex::is_record) {
                    records.push(format_prefix(path, depth + 1));
                }
                &mut arr[index]
            }
            Value::Object(map) => {
                let key = match step {
                    Step::Key(key) => key.clone(),
                    other => {
                        return Err(invalid(
                            path,
                            format!("array segment \"{other}\" against object"),
                        ))
                    }
                };
                let child = cursor.and_then(|s| s.child(&key));
                let absent = map.get(&key).map(Value::is_null).unwrap_or(true);
                if absent {
                    let child = child.ok_or_else(|| no_schema(path, depth))?;
                    map.insert(key.clone(), child.materialize());
                }
                cursor = child;
                if cursor.is_some_and(SchemaIndex::is_record) {
                    records.push(format_prefix(path, depth + 1));
                }
                map.get_mut(&key)
                    .ok_or_else(|| no_schema(path, depth))?
            }
            _ => {
                return Err(invalid(
                    path,
                    format!(
                        "cannot descend into scalar at \"{}\"",
                        format_prefix(path, depth)
                    ),
                ))
            }
        };
    }

    let slot = match (&*parent, &path[last]) {
        (Value::Array(_), Step::Append) => Slot::Append,
        (Value::Array(_), Step::Index(n)) => Slot::Index(*n),
        (Value::Array(_), Step::Key(key)) => {
            return Err(invalid(path, format!("invalid index on array: {key}")))
        }
        (Value::Object(_), Step::Key(key)) => Slot::Key(key.clone()),
        (Value::Object(_), other) => {
            return Err(invalid(
                path,
                format!("array segment \"{other}\" against object"),
            ))
        }
        _ => {
            return Err(invalid(
                path,
                format!(
                    "cannot index into scalar at \"{}\"",
                    format_prefix(path, last)
                ),
            ))
        }
    };

    Ok(Resolved {
        parent,
        slot,
        records,
    })
}

/// Read the value at `path` without materializing anything.
///
/// Returns `None` for any path that does not currently exist, including
/// `-` segments (one past the end never holds a value).
pub fn read<'a>(document: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = document;
    for step in path {
        current = match (current, step) {
            (Value::Array(arr), Step::Index(n)) => arr.get(*n)?,
            (Value::Object(map), Step::Key(key)) => map.get(key)?,
            _ => return None,
        };
    }
    Some(current)
}
