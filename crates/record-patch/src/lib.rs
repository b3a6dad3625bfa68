//! record-patch — schema-aware RFC 6902 JSON Patch engine for record
//! graphs.
//!
//! Applies an ordered sequence of JSON Patch operations to an in-memory
//! document described by a declarative [`schema::SchemaIndex`]: field
//! names, nesting, array shapes, and per-field defaults. Missing
//! intermediate containers materialize from their schema defaults on
//! demand, path/operation pairs can be gated by allow-list or deny-list
//! rules, and every session reports which sub-records it mutated so the
//! caller can decide what to persist.
//!
//! # Example
//!
//! ```
//! use record_patch::schema::SchemaIndex;
//! use record_patch::session::{apply_patch, SessionOptions};
//! use serde_json::json;
//!
//! let schema = SchemaIndex::object()
//!     .field("first_name", SchemaIndex::scalar())
//!     .field("phone_numbers", SchemaIndex::array(SchemaIndex::scalar()));
//!
//! let mut doc = json!({"phone_numbers": ["111", "222"]});
//! let patch = json!([
//!     {"op": "remove", "path": "/phone_numbers/0"},
//!     {"op": "add", "path": "/first_name", "value": "JRR"}
//! ]);
//!
//! let outcome = apply_patch(&schema, SessionOptions::default(), &patch, &mut doc).unwrap();
//! assert_eq!(doc, json!({"phone_numbers": ["222"], "first_name": "JRR"}));
//! assert!(outcome.touched.contains_root());
//! ```
//!
//! The engine performs no I/O and holds no global mutable state; the one
//! process-wide piece of shared state is the immutable
//! [`validate::PatchValidator`] instance.

pub mod apply;
pub mod codec;
pub mod resolve;
pub mod schema;
pub mod session;
pub mod types;
pub mod validate;

pub use apply::apply_op;
pub use codec::{decode_op, decode_patch, encode_op, encode_patch};
pub use resolve::{read, resolve, Resolved, Slot};
pub use schema::{DefaultValue, SchemaIndex, SchemaKind};
pub use session::{apply_patch, PatchSession, SessionOptions, SessionState};
pub use types::{Op, OpTag, PatchError, PatchOutcome, Path, Step, TestResult, TouchedSet};
pub use validate::{PatchValidator, ValidationError};

pub use record_patch_rules::{PatchRules, Rule, RuleMode, RuleSet};
