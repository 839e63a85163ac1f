use php_lexer::Span;
use serde::Serialize;

use crate::{NodeWriter, Property};

/// One writer call, as recorded by [`EventRecorder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum NodeEvent {
    Start {
        kind: String,
        span: Span,
        properties: Vec<Property>,
    },
    End,
}

/// Writer that keeps the raw event sequence.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<NodeEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[NodeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<NodeEvent> {
        self.events
    }

    /// True when every start has a matching end and no end comes first.
    pub fn is_balanced(&self) -> bool {
        let mut depth = 0usize;
        for event in &self.events {
            match event {
                NodeEvent::Start { .. } => depth += 1,
                NodeEvent::End => match depth.checked_sub(1) {
                    Some(next) => depth = next,
                    None => return false,
                },
            }
        }
        depth == 0
    }
}

impl NodeWriter for EventRecorder {
    fn start_node(&mut self, kind: &str, span: Span, properties: &[Property]) {
        self.events.push(NodeEvent::Start {
            kind: kind.to_string(),
            span,
            properties: properties.to_vec(),
        });
    }

    fn end_node(&mut self) {
        self.events.push(NodeEvent::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance() {
        let mut recorder = EventRecorder::new();
        recorder.start_node("GlobalCode", Span::new(0, 1), &[]);
        assert!(!recorder.is_balanced());
        recorder.end_node();
        assert!(recorder.is_balanced());
        recorder.end_node();
        assert!(!recorder.is_balanced());
    }

    #[test]
    fn test_events_serialize_tagged() {
        let mut recorder = EventRecorder::new();
        recorder.start_node("NullLiteral", Span::new(2, 4), &[Property::text("Value", "null")]);
        recorder.end_node();
        let json = serde_json::to_value(recorder.events()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {
                    "event": "start",
                    "kind": "NullLiteral",
                    "span": { "start": 2, "length": 4 },
                    "properties": [{ "name": "Value", "value": "null" }]
                },
                { "event": "end" }
            ])
        );
    }
}
