use php_lexer::Span;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::tree::span_bounds;
use crate::{NodeWriter, Property, PropertyValue, SerializeError};

/// Writer that builds a JSON document.
///
/// Each node becomes
/// `{"kind", "span": {"start", "end"}, "properties": {...}, "children": [...]}`
/// with properties in the order they were given. Protocol misuse is recorded
/// and reported by [`finish`](JsonNodeWriter::finish); the first error wins.
#[derive(Debug, Default)]
pub struct JsonNodeWriter {
    stack: Vec<Map<String, Value>>,
    root: Option<Value>,
    error: Option<SerializeError>,
}

impl JsonNodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn fail(&mut self, error: SerializeError) {
        warn!(%error, "JSON node writer misuse");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// The finished document.
    pub fn finish(self) -> Result<Value, SerializeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.stack.is_empty() {
            return Err(SerializeError::Unclosed {
                depth: self.stack.len(),
            });
        }
        self.root.ok_or(SerializeError::Empty)
    }
}

fn properties_object(properties: &[Property]) -> Value {
    let mut object = Map::with_capacity(properties.len());
    for property in properties {
        let value = match &property.value {
            PropertyValue::Text(text) => Value::String(text.clone()),
            PropertyValue::Nested(children) => properties_object(children),
        };
        object.insert(property.name.clone(), value);
    }
    Value::Object(object)
}

impl NodeWriter for JsonNodeWriter {
    fn start_node(&mut self, kind: &str, span: Span, properties: &[Property]) {
        if self.stack.is_empty() && self.root.is_some() {
            self.fail(SerializeError::MultipleRoots);
        }
        let (start, end) = span_bounds(span);
        let mut node = Map::new();
        node.insert("kind".into(), Value::String(kind.to_string()));
        node.insert("span".into(), json!({ "start": start, "end": end }));
        node.insert("properties".into(), properties_object(properties));
        node.insert("children".into(), Value::Array(Vec::new()));
        self.stack.push(node);
    }

    fn end_node(&mut self) {
        let Some(node) = self.stack.pop() else {
            self.fail(SerializeError::UnexpectedEnd);
            return;
        };
        let node = Value::Object(node);
        match self.stack.last_mut() {
            Some(parent) => {
                if let Some(Value::Array(children)) = parent.get_mut("children") {
                    children.push(node);
                }
            }
            None => self.root = Some(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeSerializer;
    use php_ast::ast::*;
    use php_ast::{QualifiedName, QualifiedNameRef};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builds_nested_document() {
        let mut writer = JsonNodeWriter::new();
        writer.start_node("EchoStmt", Span::new(0, 8), &[]);
        writer.start_node("LongIntLiteral", Span::new(5, 2), &[Property::text("Value", "42")]);
        writer.end_node();
        writer.end_node();

        assert_eq!(
            writer.finish().unwrap(),
            json!({
                "kind": "EchoStmt",
                "span": { "start": 0, "end": 8 },
                "properties": {},
                "children": [{
                    "kind": "LongIntLiteral",
                    "span": { "start": 5, "end": 7 },
                    "properties": { "Value": "42" },
                    "children": []
                }]
            })
        );
    }

    #[test]
    fn test_property_order_is_kept() {
        let mut writer = JsonNodeWriter::new();
        writer.start_node(
            "IncDecEx",
            Span::new(0, 4),
            &[Property::flag("Post", true), Property::flag("Inc", false)],
        );
        writer.end_node();
        let text = serde_json::to_string(&writer.finish().unwrap()["properties"]).unwrap();
        assert_eq!(text, r#"{"Post":"True","Inc":"False"}"#);
    }

    #[test]
    fn test_misuse_is_reported() {
        let mut writer = JsonNodeWriter::new();
        writer.end_node();
        assert!(matches!(writer.finish(), Err(SerializeError::UnexpectedEnd)));

        let mut writer = JsonNodeWriter::new();
        writer.start_node("GlobalCode", Span::new(0, 0), &[]);
        assert_eq!(writer.depth(), 1);
        assert!(matches!(writer.finish(), Err(SerializeError::Unclosed { depth: 1 })));

        assert!(matches!(JsonNodeWriter::new().finish(), Err(SerializeError::Empty)));

        let mut writer = JsonNodeWriter::new();
        for _ in 0..2 {
            writer.start_node("GlobalCode", Span::new(0, 0), &[]);
            writer.end_node();
        }
        assert!(matches!(writer.finish(), Err(SerializeError::MultipleRoots)));
    }

    #[test]
    fn test_tree_to_json_string() {
        let call = DirectFcnCall::new(
            Span::new(6, 8),
            QualifiedNameRef::new(Span::new(6, 6), QualifiedName::parse("time")),
            vec![],
        );
        let stmt = ExpressionStmt::new(Span::new(6, 9), call.into());
        let root = GlobalCode::new(Span::new(0, 15), vec![stmt.into()]);

        let value = crate::to_json(&root).unwrap();
        assert_eq!(value["kind"], "GlobalCode");
        assert_eq!(value["children"][0]["children"][0]["properties"]["Name"], "time");

        let text = crate::to_json_string(&root).unwrap();
        assert!(text.contains("\"DirectFcnCall\""));

        let mut writer = JsonNodeWriter::new();
        root.accept(&mut TreeSerializer::new(&mut writer));
        assert_eq!(writer.finish().unwrap(), value);
    }
}
