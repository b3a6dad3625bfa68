//! Read-only description of a document's shape.
//!
//! A [`SchemaIndex`] tells the resolver, for every reachable location,
//! whether it is scalar, object, or array shaped, what the default value of
//! a missing node is, and whether an object node is a sub-record boundary
//! (a nested record persisted separately from the root, tracked by the
//! session's `TouchedSet`).
//!
//! The index is built once from whatever schema description the host
//! provides and shared read-only across sessions; it holds no live document
//! state.
//!
//! # Example
//!
//! ```
//! use record_patch::schema::SchemaIndex;
//! use serde_json::json;
//!
//! let author = SchemaIndex::object()
//!     .field("first_name", SchemaIndex::scalar())
//!     .field("phone_numbers", SchemaIndex::array(SchemaIndex::scalar()))
//!     .field(
//!         "aliases",
//!         SchemaIndex::object()
//!             .field("names", SchemaIndex::array(SchemaIndex::scalar()))
//!             .default_value(json!({"names": []})),
//!     );
//!
//! assert!(author.child("aliases").is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Default value of a missing node: a literal, or a zero-argument producer
/// invoked at materialization time.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Shape of one schema node.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Scalar,
    Object {
        children: IndexMap<String, SchemaIndex>,
    },
    Array {
        element: Box<SchemaIndex>,
    },
}

/// One node of the schema tree.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    kind: SchemaKind,
    default: Option<DefaultValue>,
    record: bool,
}

impl SchemaIndex {
    pub fn scalar() -> Self {
        Self {
            kind: SchemaKind::Scalar,
            default: None,
            record: false,
        }
    }

    pub fn object() -> Self {
        Self {
            kind: SchemaKind::Object {
                children: IndexMap::new(),
            },
            default: None,
            record: false,
        }
    }

    pub fn array(element: SchemaIndex) -> Self {
        Self {
            kind: SchemaKind::Array {
                element: Box::new(element),
            },
            default: None,
            record: false,
        }
    }

    /// Declare a named field on an object node.
    pub fn field(mut self, name: &str, child: SchemaIndex) -> Self {
        match &mut self.kind {
            SchemaKind::Object { children } => {
                children.insert(name.to_string(), child);
            }
            _ => panic!("field() is only valid on object schema nodes"),
        }
        self
    }

    /// Declare a literal default value for this node.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Declare a producer default, invoked each time the node materializes.
    pub fn default_with(mut self, producer: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    /// Mark this node as a sub-record boundary.
    pub fn record(mut self) -> Self {
        self.record = true;
        self
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn is_record(&self) -> bool {
        self.record
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Child node of an object field, if declared.
    pub fn child(&self, name: &str) -> Option<&SchemaIndex> {
        match &self.kind {
            SchemaKind::Object { children } => children.get(name),
            _ => None,
        }
    }

    /// Element node of an array.
    pub fn element(&self) -> Option<&SchemaIndex> {
        match &self.kind {
            SchemaKind::Array { element } => Some(element),
            _ => None,
        }
    }

    /// Produce the value a missing node materializes as: the declared
    /// default, or an empty container matching the node's shape.
    pub fn materialize(&self) -> Value {
        if let Some(default) = &self.default {
            return default.produce();
        }
        match &self.kind {
            SchemaKind::Object { .. } => Value::Object(Map::new()),
            SchemaKind::Array { .. } => Value::Array(Vec::new()),
            SchemaKind::Scalar => Value::Null,
        }
    }
}
