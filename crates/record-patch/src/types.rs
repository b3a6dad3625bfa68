//! Core types for the patch engine: operations, errors, and the
//! touched-record set surfaced to callers for persistence decisions.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::validate::ValidationError;

pub use record_patch_pointer::{Path, Step};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The patch document is not a well-formed sequence of operations.
    /// Detected before any mutation; nothing is applied.
    #[error("patch failed schema validation: {0}")]
    Validation(#[from] ValidationError),
    /// An operation was denied by the session's rule set. Detected before
    /// any mutation; nothing is applied.
    #[error("operation \"{op}\" on \"{path}\" denied by rules")]
    RuleViolation { path: String, op: OpTag },
    /// A path could not be resolved against the document and its schema.
    /// Mutations committed by earlier operations in the same patch remain.
    #[error("invalid path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },
    /// An array index beyond the permitted range.
    #[error("invalid index value: {index} for array at \"{path}\"")]
    IndexOutOfRange { path: String, index: usize },
}

// ── Operations ────────────────────────────────────────────────────────────

/// The operation vocabulary, used for dispatch and rule checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl OpTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpTag::Add => "add",
            OpTag::Remove => "remove",
            OpTag::Replace => "replace",
            OpTag::Move => "move",
            OpTag::Copy => "copy",
            OpTag::Test => "test",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(OpTag::Add),
            "remove" => Some(OpTag::Remove),
            "replace" => Some(OpTag::Replace),
            "move" => Some(OpTag::Move),
            "copy" => Some(OpTag::Copy),
            "test" => Some(OpTag::Test),
            _ => None,
        }
    }
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded patch operation. Immutable input data for one session.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
    Copy { path: Path, from: Path },
    Move { path: Path, from: Path },
    Test { path: Path, value: Value },
}

impl Op {
    pub fn tag(&self) -> OpTag {
        match self {
            Op::Add { .. } => OpTag::Add,
            Op::Remove { .. } => OpTag::Remove,
            Op::Replace { .. } => OpTag::Replace,
            Op::Copy { .. } => OpTag::Copy,
            Op::Move { .. } => OpTag::Move,
            Op::Test { .. } => OpTag::Test,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Op::Add { path, .. } => path,
            Op::Remove { path } => path,
            Op::Replace { path, .. } => path,
            Op::Copy { path, .. } => path,
            Op::Move { path, .. } => path,
            Op::Test { path, .. } => path,
        }
    }

    /// The source path of `copy`/`move` operations.
    pub fn from(&self) -> Option<&Path> {
        match self {
            Op::Copy { from, .. } | Op::Move { from, .. } => Some(from),
            _ => None,
        }
    }
}

// ── Touched records ───────────────────────────────────────────────────────

/// Pointer strings of the records mutated during a session: the root (`""`)
/// plus every sub-record boundary a mutating operation resolved through.
///
/// Callers drain this after a session to decide what must be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedSet {
    records: BTreeSet<String>,
}

impl TouchedSet {
    pub fn insert(&mut self, pointer: String) {
        self.records.insert(pointer);
    }

    pub fn contains(&self, pointer: &str) -> bool {
        self.records.contains(pointer)
    }

    pub fn contains_root(&self) -> bool {
        self.records.contains("")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(String::as_str)
    }
}

impl Extend<String> for TouchedSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for TouchedSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

// ── Session results ───────────────────────────────────────────────────────

/// Outcome of one `test` operation. A mismatch never aborts the session;
/// treating it as fatal is the caller's policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestResult {
    /// Index of the operation in the patch array.
    pub index: usize,
    pub passed: bool,
}

/// Result of a completed session.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub touched: TouchedSet,
    pub tests: Vec<TestResult>,
    /// Advisory flag for the caller's persistence step; the engine itself
    /// never performs I/O.
    pub autosave: bool,
}

impl PatchOutcome {
    /// True if every `test` operation in the patch passed.
    pub fn tests_passed(&self) -> bool {
        self.tests.iter().all(|t| t.passed)
    }
}
