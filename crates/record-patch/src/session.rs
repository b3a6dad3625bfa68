//! Session orchestration: one patch against one root document.
//!
//! A session moves through `Created → Validated → RuleChecked → Executing →
//! Completed | Failed`. Shape validation and the rule check both run over
//! the whole patch before any mutation, so input-shape and policy failures
//! leave the document untouched. A structural failure during execution
//! halts immediately; operations already applied are not rolled back, and
//! the caller can infer what ran from the returned error and the touched
//! set of a prior successful call.
//!
//! Sessions are synchronous and single-threaded. The document must not be
//! mutated from outside while a session runs; sessions over different
//! documents are independent (the schema is shared read-only).

use serde_json::Value;
use tracing::{debug, trace, warn};

use record_patch_pointer::format_pointer;
use record_patch_rules::{PatchRules, RuleSet};

use crate::apply::apply_op;
use crate::codec::decode_patch;
use crate::schema::SchemaIndex;
use crate::types::{PatchError, PatchOutcome, TestResult, TouchedSet};
use crate::validate::PatchValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Validated,
    RuleChecked,
    Executing,
    Completed,
    Failed,
}

/// Session-level configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Access rules; absent means everything is permitted.
    pub rules: Option<RuleSet>,
    /// Advisory flag passed through to the caller's persistence step.
    pub autosave: bool,
}

/// Applies one patch to one document graph.
pub struct PatchSession<'s> {
    schema: &'s SchemaIndex,
    rules: Option<PatchRules>,
    autosave: bool,
    state: SessionState,
}

impl<'s> PatchSession<'s> {
    pub fn new(schema: &'s SchemaIndex, options: SessionOptions) -> Self {
        Self {
            schema,
            rules: options.rules.map(PatchRules::new),
            autosave: options.autosave,
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Validate, rule-check, and execute `patch` against `document`.
    ///
    /// Each call runs the full state machine from the start; the session
    /// ends in `Completed` or `Failed` and may be reused for another patch.
    pub fn apply(
        &mut self,
        patch: &Value,
        document: &mut Value,
    ) -> Result<PatchOutcome, PatchError> {
        self.state = SessionState::Created;
        match self.run(patch, document) {
            Ok(outcome) => {
                self.state = SessionState::Completed;
                debug!(
                    touched = outcome.touched.len(),
                    tests = outcome.tests.len(),
                    "patch session completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.state = SessionState::Failed;
                warn!(error = %err, "patch session failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, patch: &Value, document: &mut Value) -> Result<PatchOutcome, PatchError> {
        PatchValidator::shared().validate(patch)?;
        self.state = SessionState::Validated;

        let ops = decode_patch(patch)?;
        debug!(ops = ops.len(), "patch validated");

        // The whole patch is rule-checked before anything executes; the
        // first denial aborts with nothing applied.
        if let Some(rules) = &self.rules {
            for op in &ops {
                let pointer = format_pointer(op.path());
                if !rules.permits(&pointer, op.tag().as_str()) {
                    return Err(PatchError::RuleViolation {
                        path: pointer,
                        op: op.tag(),
                    });
                }
            }
        }
        self.state = SessionState::RuleChecked;

        self.state = SessionState::Executing;
        let mut touched = TouchedSet::default();
        let mut tests = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            trace!(index, op = op.tag().as_str(), "applying operation");
            if let Some(passed) = apply_op(document, self.schema, op, &mut touched)? {
                tests.push(TestResult { index, passed });
            }
        }

        Ok(PatchOutcome {
            touched,
            tests,
            autosave: self.autosave,
        })
    }
}

/// One-shot convenience: build a session, apply, return the outcome.
pub fn apply_patch(
    schema: &SchemaIndex,
    options: SessionOptions,
    patch: &Value,
    document: &mut Value,
) -> Result<PatchOutcome, PatchError> {
    PatchSession::new(schema, options).apply(patch, document)
}
