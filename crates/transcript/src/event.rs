use serde::{Deserialize, Serialize};

use crate::ids::EventId;

/// Speaker/origin of one conversation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Human,
    Assistant,
    ToolInvocation,
    ToolResult,
}

impl EventKind {
    /// Returns true for both tool-side kinds.
    ///
    /// Invocations and results carry the same payload shape on the wire and
    /// are treated identically by reordering and grouping.
    pub fn is_tool(self) -> bool {
        matches!(self, Self::ToolInvocation | Self::ToolResult)
    }
}

/// One step in a conversation, immutable once created.
///
/// Tool events carry structured JSON as text in `content`; the id is
/// optional because older backends emit events without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub id: Option<EventId>,
    pub kind: EventKind,
    pub content: String,
}

impl ChatEvent {
    /// Creates an event with explicit kind and no id.
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            content: content.into(),
        }
    }

    /// Attaches a stable identifier.
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    /// Creates a human turn.
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(EventKind::Human, content)
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(EventKind::Assistant, content)
    }

    /// Creates a tool result carrying a JSON payload as text.
    pub fn tool_result(content: impl Into<String>) -> Self {
        Self::new(EventKind::ToolResult, content)
    }
}
