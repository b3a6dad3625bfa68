//! Patch shape validation.
//!
//! Checks that a candidate patch document is syntactically a valid sequence
//! of JSON Patch operations before anything is decoded or executed. All
//! per-operation diagnostics are collected, not just the first, so callers
//! can report every problem in one round trip.
//!
//! The validator carries no state; [`PatchValidator::shared`] hands out one
//! process-wide immutable instance constructed on first use.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use record_patch_pointer::parse_pointer;

/// Shape-validation failure carrying the full diagnostic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub diagnostics: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostics.join(" "))
    }
}

impl std::error::Error for ValidationError {}

/// Validates raw patch documents against the JSON Patch grammar.
#[derive(Debug, Default)]
pub struct PatchValidator;

impl PatchValidator {
    /// The process-wide shared instance.
    pub fn shared() -> &'static PatchValidator {
        static INSTANCE: OnceLock<PatchValidator> = OnceLock::new();
        INSTANCE.get_or_init(PatchValidator::default)
    }

    /// Validate a patch document. An empty array is a valid no-op patch.
    pub fn validate(&self, patch: &Value) -> Result<(), ValidationError> {
        let ops = patch.as_array().ok_or_else(|| ValidationError {
            diagnostics: vec!["Patch is not an array.".to_string()],
        })?;
        let mut diagnostics = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            if let Err(reason) = validate_operation(op) {
                diagnostics.push(format!("Error in operation [index = {index}] ({reason})."));
            }
        }
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { diagnostics })
        }
    }
}

fn validate_operation(op: &Value) -> Result<(), String> {
    let map = op.as_object().ok_or("OP_INVALID")?;

    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or("OP_PATH_INVALID")?;
    validate_pointer(path)?;

    let name = map.get("op").and_then(Value::as_str).unwrap_or("");
    match name {
        "add" | "replace" | "test" => require_value(map),
        "remove" => Ok(()),
        "copy" => require_from(map),
        "move" => {
            require_from(map)?;
            let from = map.get("from").and_then(Value::as_str).unwrap_or("");
            // path must not be a child of from
            if path.starts_with(&format!("{from}/")) {
                return Err("Cannot move into own children.".to_string());
            }
            Ok(())
        }
        _ => Err("OP_UNKNOWN".to_string()),
    }
}

fn validate_pointer(pointer: &str) -> Result<(), String> {
    parse_pointer(pointer)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn require_value(map: &serde_json::Map<String, Value>) -> Result<(), String> {
    if !map.contains_key("value") {
        return Err("OP_VALUE_MISSING".to_string());
    }
    Ok(())
}

fn require_from(map: &serde_json::Map<String, Value>) -> Result<(), String> {
    let from = map
        .get("from")
        .and_then(Value::as_str)
        .ok_or("OP_FROM_INVALID")?;
    validate_pointer(from)
}
