//! Per-operation execution.
//!
//! Each handler resolves its own path independently (no batching or path
//! merging across operations) and mutates the document through the resolved
//! parent container. `replace` is remove-then-add at the same location, and
//! `copy`/`move` route their writes through `add`, so a target landing on
//! an array slot gets insert-and-shift semantics rather than overwrite.
//!
//! Every successful mutating operation extends the session's [`TouchedSet`]
//! with the sub-record boundaries its resolution crossed.

use serde_json::{Map, Value};

use record_patch_pointer::{format_pointer, is_child, Path};

use crate::resolve::{read, resolve, Resolved, Slot};
use crate::schema::SchemaIndex;
use crate::types::{Op, PatchError, TouchedSet};

/// Apply one operation to the document.
///
/// Returns `Some(passed)` for `test` operations and `None` for mutations.
/// A failed `test` is not an error; failure handling is the caller's
/// policy.
pub fn apply_op(
    document: &mut Value,
    schema: &SchemaIndex,
    op: &Op,
    touched: &mut TouchedSet,
) -> Result<Option<bool>, PatchError> {
    match op {
        Op::Add { path, value } => {
            apply_add(document, schema, path, value.clone(), touched)?;
            Ok(None)
        }
        Op::Remove { path } => {
            apply_remove(document, schema, path, touched)?;
            Ok(None)
        }
        Op::Replace { path, value } => {
            apply_replace(document, schema, path, value.clone(), touched)?;
            Ok(None)
        }
        Op::Copy { path, from } => {
            apply_copy(document, schema, path, from, touched)?;
            Ok(None)
        }
        Op::Move { path, from } => {
            apply_move(document, schema, path, from, touched)?;
            Ok(None)
        }
        Op::Test { path, value } => Ok(Some(apply_test(document, path, value))),
    }
}

fn apply_add(
    document: &mut Value,
    schema: &SchemaIndex,
    path: &Path,
    value: Value,
    touched: &mut TouchedSet,
) -> Result<(), PatchError> {
    let Resolved {
        parent,
        slot,
        records,
    } = resolve(document, schema, path)?;
    match (parent, slot) {
        (root, Slot::Root) => *root = value,
        (Value::Array(arr), Slot::Append) => arr.push(value),
        (Value::Array(arr), Slot::Index(index)) => {
            if index > arr.len() {
                return Err(PatchError::IndexOutOfRange {
                    path: format_pointer(path),
                    index,
                });
            }
            arr.insert(index, value);
        }
        (Value::Object(map), Slot::Key(key)) => {
            map.insert(key, value);
        }
        (_, slot) => {
            return Err(PatchError::InvalidPath {
                path: format_pointer(path),
                reason: format!("slot {slot:?} does not match container shape"),
            })
        }
    }
    touched.extend(records);
    Ok(())
}

fn apply_remove(
    document: &mut Value,
    schema: &SchemaIndex,
    path: &Path,
    touched: &mut TouchedSet,
) -> Result<(), PatchError> {
    let Resolved {
        parent,
        slot,
        records,
    } = resolve(document, schema, path)?;
    match (parent, slot) {
        (root, Slot::Root) => *root = Value::Object(Map::new()),
        (Value::Array(arr), Slot::Index(index)) => {
            // Past-the-end targets are already logically absent.
            if index < arr.len() {
                arr.remove(index);
            }
        }
        (Value::Array(_), Slot::Append) => {}
        (Value::Object(map), Slot::Key(key)) => {
            map.remove(&key);
        }
        (_, slot) => {
            return Err(PatchError::InvalidPath {
                path: format_pointer(path),
                reason: format!("slot {slot:?} does not match container shape"),
            })
        }
    }
    touched.extend(records);
    Ok(())
}

/// Remove then add at the same location. The previous occupant is discarded
/// unconditionally; precondition checks are `test`'s job.
fn apply_replace(
    document: &mut Value,
    schema: &SchemaIndex,
    path: &Path,
    value: Value,
    touched: &mut TouchedSet,
) -> Result<(), PatchError> {
    apply_remove(document, schema, path, touched)?;
    apply_add(document, schema, path, value, touched)
}

fn apply_copy(
    document: &mut Value,
    schema: &SchemaIndex,
    path: &Path,
    from: &Path,
    touched: &mut TouchedSet,
) -> Result<(), PatchError> {
    let value = read(document, from).cloned().unwrap_or(Value::Null);
    apply_add(document, schema, path, value, touched)
}

fn apply_move(
    document: &mut Value,
    schema: &SchemaIndex,
    path: &Path,
    from: &Path,
    touched: &mut TouchedSet,
) -> Result<(), PatchError> {
    if is_child(from, path) {
        return Err(PatchError::InvalidPath {
            path: format_pointer(path),
            reason: "cannot move into own children".to_string(),
        });
    }
    // The value must be fully read out before the source is cleared;
    // path and from may overlap (e.g. a move within one array).
    let value = read(document, from).cloned().unwrap_or(Value::Null);
    apply_remove(document, schema, from, touched)?;
    apply_add(document, schema, path, value, touched)
}

/// Deep structural comparison of the value at `path` with `expected`.
/// Arrays compare order-sensitively; an absent target never matches.
fn apply_test(document: &Value, path: &Path, expected: &Value) -> bool {
    match read(document, path) {
        Some(actual) => actual == expected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_patch_pointer::parse_pointer;
    use serde_json::json;

    fn schema() -> SchemaIndex {
        SchemaIndex::object()
            .field("first_name", SchemaIndex::scalar())
            .field("publisher", SchemaIndex::scalar())
            .field("phone_numbers", SchemaIndex::array(SchemaIndex::scalar()))
            .field(
                "address",
                SchemaIndex::object()
                    .field("city", SchemaIndex::scalar())
                    .field("state", SchemaIndex::scalar()),
            )
            .field(
                "aliases",
                SchemaIndex::object()
                    .field("names", SchemaIndex::array(SchemaIndex::scalar()))
                    .default_value(json!({"names": []})),
            )
            .field(
                "matrix",
                SchemaIndex::array(SchemaIndex::array(SchemaIndex::scalar())),
            )
    }

    fn run(doc: &mut Value, op: &Op) -> Result<Option<bool>, PatchError> {
        let mut touched = TouchedSet::default();
        apply_op(doc, &schema(), op, &mut touched)
    }

    fn path(p: &str) -> Path {
        parse_pointer(p).unwrap()
    }

    #[test]
    fn add_sets_object_field() {
        let mut doc = json!({"first_name": "JRR"});
        run(
            &mut doc,
            &Op::Add {
                path: path("/first_name"),
                value: json!("Jimmy"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"first_name": "Jimmy"}));
    }

    #[test]
    fn add_appends_to_array() {
        let mut doc = json!({"phone_numbers": ["111", "222"]});
        for number in ["333", "444"] {
            run(
                &mut doc,
                &Op::Add {
                    path: path("/phone_numbers/-"),
                    value: json!(number),
                },
            )
            .unwrap();
        }
        assert_eq!(doc["phone_numbers"], json!(["111", "222", "333", "444"]));
    }

    #[test]
    fn add_inserts_and_shifts_right() {
        let mut doc = json!({"phone_numbers": ["111", "222"]});
        run(
            &mut doc,
            &Op::Add {
                path: path("/phone_numbers/0"),
                value: json!("000"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["000", "111", "222"]));
    }

    #[test]
    fn add_at_length_does_not_shift() {
        let mut doc = json!({"phone_numbers": ["111"]});
        run(
            &mut doc,
            &Op::Add {
                path: path("/phone_numbers/1"),
                value: json!("222"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["111", "222"]));
    }

    #[test]
    fn add_past_length_fails_and_leaves_array_unchanged() {
        let mut doc = json!({"phone_numbers": ["111", "222"]});
        let err = run(
            &mut doc,
            &Op::Add {
                path: path("/phone_numbers/100"),
                value: json!("NO"),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            PatchError::IndexOutOfRange {
                path: "/phone_numbers/100".to_string(),
                index: 100,
            }
        );
        assert_eq!(doc["phone_numbers"], json!(["111", "222"]));
    }

    #[test]
    fn add_materializes_default_intermediates() {
        let mut doc = json!({});
        run(
            &mut doc,
            &Op::Add {
                path: path("/aliases/names/-"),
                value: json!("manin"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"aliases": {"names": ["manin"]}}));
    }

    #[test]
    fn add_builds_nested_array_of_arrays() {
        let mut doc = json!({});
        run(
            &mut doc,
            &Op::Add {
                path: path("/matrix/0/0"),
                value: json!("x"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"matrix": [["x"]]}));
    }

    #[test]
    fn add_root_replaces_whole_document() {
        let mut doc = json!({"first_name": "JRR"});
        run(
            &mut doc,
            &Op::Add {
                path: vec![],
                value: json!({"first_name": "Clay"}),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"first_name": "Clay"}));
    }

    #[test]
    fn remove_deletes_object_field() {
        let mut doc = json!({"first_name": "JRR", "publisher": "HM"});
        run(
            &mut doc,
            &Op::Remove {
                path: path("/first_name"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"publisher": "HM"}));
    }

    #[test]
    fn remove_shifts_array_left() {
        let mut doc = json!({"phone_numbers": ["111", "222"]});
        run(
            &mut doc,
            &Op::Remove {
                path: path("/phone_numbers/0"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["222"]));
    }

    #[test]
    fn remove_absent_field_is_not_an_error() {
        let mut doc = json!({});
        run(
            &mut doc,
            &Op::Remove {
                path: path("/first_name"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn remove_root_resets_to_empty_object() {
        let mut doc = json!({"first_name": "JRR"});
        run(&mut doc, &Op::Remove { path: vec![] }).unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn replace_overwrites_existing_value() {
        let mut doc = json!({"address": {"city": "NoWhere", "state": "TX"}});
        run(
            &mut doc,
            &Op::Replace {
                path: path("/address/city"),
                value: json!("New York"),
            },
        )
        .unwrap();
        assert_eq!(doc["address"], json!({"state": "TX", "city": "New York"}));
    }

    #[test]
    fn replace_array_element_in_place() {
        let mut doc = json!({"phone_numbers": ["111", "222", "333"]});
        run(
            &mut doc,
            &Op::Replace {
                path: path("/phone_numbers/1"),
                value: json!("999"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["111", "999", "333"]));
    }

    #[test]
    fn replace_twice_equals_replacing_once() {
        let direct = {
            let mut doc = json!({"first_name": "JRR"});
            run(
                &mut doc,
                &Op::Replace {
                    path: path("/first_name"),
                    value: json!("v2"),
                },
            )
            .unwrap();
            doc
        };
        let sequenced = {
            let mut doc = json!({"first_name": "JRR"});
            for v in ["v1", "v2"] {
                run(
                    &mut doc,
                    &Op::Replace {
                        path: path("/first_name"),
                        value: json!(v),
                    },
                )
                .unwrap();
            }
            doc
        };
        assert_eq!(direct, sequenced);
    }

    #[test]
    fn copy_duplicates_without_clearing_source() {
        let mut doc = json!({"address": {"city": "NoWhere"}, "aliases": {"names": []}});
        run(
            &mut doc,
            &Op::Copy {
                path: path("/aliases/names/-"),
                from: path("/address/city"),
            },
        )
        .unwrap();
        assert_eq!(doc["address"]["city"], json!("NoWhere"));
        assert_eq!(doc["aliases"]["names"], json!(["NoWhere"]));
    }

    #[test]
    fn copy_into_array_index_inserts_and_shifts() {
        let mut doc = json!({"phone_numbers": ["111", "222"]});
        run(
            &mut doc,
            &Op::Copy {
                path: path("/phone_numbers/0"),
                from: path("/phone_numbers/1"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["222", "111", "222"]));
    }

    #[test]
    fn move_relocates_and_clears_source() {
        let mut doc = json!({"first_name": "JRR", "publisher": null});
        run(
            &mut doc,
            &Op::Move {
                path: path("/publisher"),
                from: path("/first_name"),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"publisher": "JRR"}));
        assert_eq!(read(&doc, &path("/first_name")), None);
    }

    #[test]
    fn move_round_trip_restores_value() {
        let mut doc = json!({"first_name": "JRR", "publisher": "HM"});
        run(
            &mut doc,
            &Op::Move {
                path: path("/publisher"),
                from: path("/first_name"),
            },
        )
        .unwrap();
        run(
            &mut doc,
            &Op::Move {
                path: path("/first_name"),
                from: path("/publisher"),
            },
        )
        .unwrap();
        assert_eq!(doc["first_name"], json!("JRR"));
        assert_eq!(read(&doc, &path("/publisher")), None);
    }

    #[test]
    fn move_within_one_array_reads_before_clearing() {
        let mut doc = json!({"phone_numbers": ["111", "222", "333"]});
        run(
            &mut doc,
            &Op::Move {
                path: path("/phone_numbers/0"),
                from: path("/phone_numbers/2"),
            },
        )
        .unwrap();
        assert_eq!(doc["phone_numbers"], json!(["333", "111", "222"]));
    }

    #[test]
    fn move_into_own_children_fails() {
        let mut doc = json!({"address": {"city": "NoWhere"}});
        let err = run(
            &mut doc,
            &Op::Move {
                path: path("/address/city"),
                from: path("/address"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath { .. }));
    }

    #[test]
    fn test_compares_structurally() {
        let mut doc = json!({"address": {"city": "NoWhere", "state": "TX"}});
        let passed = run(
            &mut doc,
            &Op::Test {
                path: path("/address"),
                value: json!({"city": "NoWhere", "state": "TX"}),
            },
        )
        .unwrap();
        assert_eq!(passed, Some(true));
    }

    #[test]
    fn test_mismatch_reports_false_without_error() {
        let mut doc = json!({"first_name": "JRR"});
        let passed = run(
            &mut doc,
            &Op::Test {
                path: path("/first_name"),
                value: json!("Clay"),
            },
        )
        .unwrap();
        assert_eq!(passed, Some(false));
    }

    #[test]
    fn test_absent_path_reports_false() {
        let mut doc = json!({});
        let passed = run(
            &mut doc,
            &Op::Test {
                path: path("/first_name"),
                value: json!(null),
            },
        )
        .unwrap();
        assert_eq!(passed, Some(false));
    }

    #[test]
    fn mutating_ops_register_touched_records() {
        let schema = SchemaIndex::object().field(
            "aliases",
            SchemaIndex::object()
                .field("names", SchemaIndex::array(SchemaIndex::scalar()))
                .record(),
        );
        let mut doc = json!({});
        let mut touched = TouchedSet::default();
        apply_op(
            &mut doc,
            &schema,
            &Op::Add {
                path: path("/aliases/names/-"),
                value: json!("x"),
            },
            &mut touched,
        )
        .unwrap();
        assert!(touched.contains_root());
        assert!(touched.contains("/aliases"));
    }

    #[test]
    fn test_does_not_register_touched_records() {
        let mut doc = json!({"first_name": "JRR"});
        let mut touched = TouchedSet::default();
        apply_op(
            &mut doc,
            &schema(),
            &Op::Test {
                path: path("/first_name"),
                value: json!("JRR"),
            },
            &mut touched,
        )
        .unwrap();
        assert!(touched.is_empty());
    }
}
