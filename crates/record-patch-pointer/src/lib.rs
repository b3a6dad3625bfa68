//! JSON Pointer (RFC 6901) utilities with typed path segments.
//!
//! A pointer string is parsed into a [`Path`] of [`Step`]s, discriminating
//! object keys, array indices, and the `-` append marker at parse time.
//! Whether an `Index` or `Append` step is actually legal at a given position
//! is decided later, against the container it resolves through.
//!
//! # Example
//!
//! ```
//! use record_patch_pointer::{parse_pointer, format_pointer, Step};
//!
//! let path = parse_pointer("/phone_numbers/0").unwrap();
//! assert_eq!(path, vec![Step::Key("phone_numbers".into()), Step::Index(0)]);
//!
//! let appended = parse_pointer("/phone_numbers/-").unwrap();
//! assert_eq!(appended[1], Step::Append);
//!
//! assert_eq!(format_pointer(&path), "/phone_numbers/0");
//! ```

use std::fmt;

use thiserror::Error;

/// Maximum allowed pointer string length.
const MAX_POINTER_LENGTH: usize = 1024;

/// Maximum allowed path depth.
const MAX_PATH_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// Non-empty pointer without a leading `/`.
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("PATH_TOO_DEEP")]
    PathTooDeep,
}

/// One step of a parsed pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// An object field name.
    Key(String),
    /// A zero-based array index.
    Index(usize),
    /// The `-` marker: one past the current end of an array.
    Append,
}

impl Step {
    /// Render the step as a raw (unescaped) pointer segment.
    pub fn as_segment(&self) -> String {
        match self {
            Step::Key(key) => key.clone(),
            Step::Index(idx) => idx.to_string(),
            Step::Append => "-".to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => f.write_str(key),
            Step::Index(idx) => write!(f, "{idx}"),
            Step::Append => f.write_str("-"),
        }
    }
}

/// A parsed pointer path. Empty means the document root.
pub type Path = Vec<Step>;

/// Unescapes a pointer segment.
///
/// Per RFC 6901, `~1` becomes `/` and `~0` becomes `~`.
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer segment.
///
/// Per RFC 6901, `~` becomes `~0` and `/` becomes `~1`.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    // Order matters: ~ must be escaped before /
    segment.replace('~', "~0").replace('/', "~1")
}

/// Check if a string is a valid RFC 6901 array index: ASCII digits with no
/// superfluous leading zero.
pub fn is_valid_index(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    let bytes = segment.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

fn classify(raw: &str) -> Step {
    if raw == "-" {
        return Step::Append;
    }
    if is_valid_index(raw) {
        // Indices wider than usize fall back to plain keys.
        if let Ok(idx) = raw.parse::<usize>() {
            return Step::Index(idx);
        }
    }
    Step::Key(unescape_segment(raw))
}

/// Parse a JSON Pointer string into a typed [`Path`].
///
/// The empty string denotes the document root. Any other pointer must start
/// with `/`.
///
/// # Example
///
/// ```
/// use record_patch_pointer::{parse_pointer, Step};
///
/// assert_eq!(parse_pointer("").unwrap(), Vec::<Step>::new());
/// assert_eq!(
///     parse_pointer("/a~0b/c~1d").unwrap(),
///     vec![Step::Key("a~b".into()), Step::Key("c/d".into())],
/// );
/// assert!(parse_pointer("no-slash").is_err());
/// ```
pub fn parse_pointer(pointer: &str) -> Result<Path, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(PointerError::PointerTooLong);
    }
    let path: Path = pointer[1..].split('/').map(classify).collect();
    if path.len() > MAX_PATH_DEPTH {
        return Err(PointerError::PathTooDeep);
    }
    Ok(path)
}

/// Format a [`Path`] back into a JSON Pointer string.
///
/// The root path formats as the empty string.
pub fn format_pointer(path: &[Step]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for step in path {
        out.push('/');
        out.push_str(&escape_segment(&step.as_segment()));
    }
    out
}

/// Format a prefix of `path` (the first `len` steps) as a pointer string.
pub fn format_prefix(path: &[Step], len: usize) -> String {
    format_pointer(&path[..len.min(path.len())])
}

/// Check if a path points to the document root.
pub fn is_root(path: &[Step]) -> bool {
    path.is_empty()
}

/// Check if `parent` is a strict ancestor of `child`.
pub fn is_child(parent: &[Step], child: &[Step]) -> bool {
    if parent.len() >= child.len() {
        return false;
    }
    parent.iter().zip(child).all(|(a, b)| a == b)
}
