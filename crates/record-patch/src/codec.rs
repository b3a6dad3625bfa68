//! Conversion between raw RFC 6902 JSON and the typed [`Op`] enum.
//!
//! Decoding runs after shape validation, so malformed input surfaces as a
//! `Validation` error with a single diagnostic rather than a panic.

use serde_json::{json, Value};

use record_patch_pointer::{format_pointer, parse_pointer, Path};

use crate::types::{Op, PatchError};
use crate::validate::ValidationError;

fn malformed(reason: impl Into<String>) -> PatchError {
    PatchError::Validation(ValidationError {
        diagnostics: vec![reason.into()],
    })
}

fn decode_pointer(map: &serde_json::Map<String, Value>, field: &str) -> Result<Path, PatchError> {
    let pointer = map
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("\"{field}\" must be a pointer string.")))?;
    parse_pointer(pointer).map_err(|e| malformed(e.to_string()))
}

fn decode_value(map: &serde_json::Map<String, Value>) -> Result<Value, PatchError> {
    map.get("value")
        .cloned()
        .ok_or_else(|| malformed("OP_VALUE_MISSING"))
}

/// Decode one raw operation object.
pub fn decode_op(raw: &Value) -> Result<Op, PatchError> {
    let map = raw.as_object().ok_or_else(|| malformed("OP_INVALID"))?;
    let name = map.get("op").and_then(Value::as_str).unwrap_or("");
    let path = decode_pointer(map, "path")?;
    match name {
        "add" => Ok(Op::Add {
            path,
            value: decode_value(map)?,
        }),
        "remove" => Ok(Op::Remove { path }),
        "replace" => Ok(Op::Replace {
            path,
            value: decode_value(map)?,
        }),
        "copy" => Ok(Op::Copy {
            path,
            from: decode_pointer(map, "from")?,
        }),
        "move" => Ok(Op::Move {
            path,
            from: decode_pointer(map, "from")?,
        }),
        "test" => Ok(Op::Test {
            path,
            value: decode_value(map)?,
        }),
        other => Err(malformed(format!("OP_UNKNOWN: {other}"))),
    }
}

/// Decode a whole patch array into operations, in array order.
pub fn decode_patch(patch: &Value) -> Result<Vec<Op>, PatchError> {
    let ops = patch
        .as_array()
        .ok_or_else(|| malformed("Patch is not an array."))?;
    ops.iter().map(decode_op).collect()
}

/// Encode an operation back to its RFC 6902 JSON form.
pub fn encode_op(op: &Op) -> Value {
    match op {
        Op::Add { path, value } => json!({
            "op": "add",
            "path": format_pointer(path),
            "value": value,
        }),
        Op::Remove { path } => json!({
            "op": "remove",
            "path": format_pointer(path),
        }),
        Op::Replace { path, value } => json!({
            "op": "replace",
            "path": format_pointer(path),
            "value": value,
        }),
        Op::Copy { path, from } => json!({
            "op": "copy",
            "path": format_pointer(path),
            "from": format_pointer(from),
        }),
        Op::Move { path, from } => json!({
            "op": "move",
            "path": format_pointer(path),
            "from": format_pointer(from),
        }),
        Op::Test { path, value } => json!({
            "op": "test",
            "path": format_pointer(path),
            "value": value,
        }),
    }
}

/// Encode a sequence of operations as a patch array.
pub fn encode_patch(ops: &[Op]) -> Value {
    Value::Array(ops.iter().map(encode_op).collect())
}
