//! Path/operation access rules for JSON Patch documents.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s plus a [`RuleMode`]. Each
//! rule names a pointer pattern and the operations it covers. Compiling the
//! set yields a [`PatchRules`] matcher that answers whether a given
//! `(path, op)` pair is permitted:
//!
//! - **allow-list**: permitted only if some rule matches the path and lists
//!   the operation;
//! - **deny-list**: permitted unless some rule matches the path and lists
//!   the operation.
//!
//! A rule pattern governs its exact path and everything below it. A `*`
//! segment matches any single path segment.
//!
//! # Example
//!
//! ```
//! use record_patch_rules::{PatchRules, Rule, RuleMode, RuleSet};
//!
//! let rules = PatchRules::new(RuleSet {
//!     rules: vec![Rule {
//!         path: "/publisher".to_string(),
//!         ops: vec!["replace".to_string(), "remove".to_string()],
//!     }],
//!     mode: RuleMode::DenyList,
//! });
//!
//! assert!(!rules.permits("/publisher", "replace"));
//! assert!(rules.permits("/publisher", "test"));
//! assert!(rules.permits("/title", "replace"));
//! ```

use record_patch_pointer::unescape_segment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("operation \"{op}\" on \"{path}\" is not permitted")]
    Denied { path: String, op: String },
}

/// Whether matching a rule grants or forbids the matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleMode {
    AllowList,
    #[default]
    DenyList,
}

/// One rule: a pointer pattern and the operations it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Pointer pattern, e.g. `/publisher` or `/collaborators/*/author`.
    pub path: String,
    /// Operation names this rule covers (`add`, `remove`, ...).
    #[serde(rename = "op")]
    pub ops: Vec<String>,
}

/// An ordered rule collection plus its interpretation mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub mode: RuleMode,
}

// ── Compiled form ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Vec<PatternSegment>,
    ops: Vec<String>,
}

impl CompiledRule {
    /// A rule matches a path when every pattern segment matches the
    /// corresponding path segment; the path may extend deeper.
    fn matches(&self, path: &[String]) -> bool {
        if path.len() < self.pattern.len() {
            return false;
        }
        self.pattern.iter().zip(path).all(|(pat, seg)| match pat {
            PatternSegment::Wildcard => true,
            PatternSegment::Literal(lit) => lit == seg,
        })
    }

    fn covers_op(&self, op: &str) -> bool {
        self.ops.iter().any(|o| o == op)
    }
}

fn split_segments(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(unescape_segment)
        .collect()
}

fn compile_pattern(pointer: &str) -> Vec<PatternSegment> {
    split_segments(pointer)
        .into_iter()
        .map(|seg| {
            if seg == "*" {
                PatternSegment::Wildcard
            } else {
                PatternSegment::Literal(seg)
            }
        })
        .collect()
}

/// A compiled rule set, ready to answer `permits` queries.
#[derive(Debug, Clone)]
pub struct PatchRules {
    rules: Vec<CompiledRule>,
    mode: RuleMode,
}

impl PatchRules {
    pub fn new(set: RuleSet) -> Self {
        let rules = set
            .rules
            .into_iter()
            .map(|rule| CompiledRule {
                pattern: compile_pattern(&rule.path),
                ops: rule.ops,
            })
            .collect();
        Self {
            rules,
            mode: set.mode,
        }
    }

    pub fn mode(&self) -> RuleMode {
        self.mode
    }

    /// Is the `(path, op)` pair permitted under this rule set?
    pub fn permits(&self, path: &str, op: &str) -> bool {
        let segments = split_segments(path);
        let matched = self
            .rules
            .iter()
            .any(|rule| rule.matches(&segments) && rule.covers_op(op));
        match self.mode {
            RuleMode::AllowList => matched,
            RuleMode::DenyList => !matched,
        }
    }

    /// Check a batch of `(path, op)` pairs, reporting the first denial.
    pub fn check<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), RuleError> {
        for (path, op) in pairs {
            if !self.permits(path, op) {
                return Err(RuleError::Denied {
                    path: path.to_string(),
                    op: op.to_string(),
                });
            }
        }
        Ok(())
    }
}
