//! PHP Tree Serializer
//!
//! Walks a syntax tree and reports it to a [`NodeWriter`] as nested
//! start/end events, one pair per node, children in source order.
//!
//! ```text
//! GlobalCode → TreeSerializer → NodeWriter { EventRecorder | JsonNodeWriter }
//! ```

pub mod json;
pub mod recorder;
pub mod tree;

use php_lexer::Span;
use serde::Serialize;

pub use json::JsonNodeWriter;
pub use recorder::{EventRecorder, NodeEvent};
pub use tree::TreeSerializer;

/// A named value attached to a serialized node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Text(value.into()),
        }
    }

    /// Booleans are written as `True` / `False`.
    pub fn flag(name: impl Into<String>, value: bool) -> Self {
        Self::text(name, if value { "True" } else { "False" })
    }

    pub fn nested(name: impl Into<String>, children: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Nested(children),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Nested(Vec<Property>),
}

/// Receiver of serialization events.
///
/// Calls arrive strictly nested: every `start_node` is matched by one
/// `end_node` after the node's children.
pub trait NodeWriter {
    fn start_node(&mut self, kind: &str, span: Span, properties: &[Property]);
    fn end_node(&mut self);
}

impl<W: NodeWriter + ?Sized> NodeWriter for &mut W {
    fn start_node(&mut self, kind: &str, span: Span, properties: &[Property]) {
        (**self).start_node(kind, span, properties);
    }

    fn end_node(&mut self) {
        (**self).end_node();
    }
}

/// Misuse of a writer's event protocol.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("end_node without a matching start_node")]
    UnexpectedEnd,
    #[error("{depth} node(s) still open")]
    Unclosed { depth: usize },
    #[error("no node was written")]
    Empty,
    #[error("a second root node was started")]
    MultipleRoots,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `root` into a JSON value.
pub fn to_json(root: &php_ast::GlobalCode) -> Result<serde_json::Value, SerializeError> {
    let mut writer = JsonNodeWriter::new();
    root.accept(&mut TreeSerializer::new(&mut writer));
    writer.finish()
}

/// Serialize `root` into pretty-printed JSON text.
pub fn to_json_string(root: &php_ast::GlobalCode) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(&to_json(root)?)?)
}
