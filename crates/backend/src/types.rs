use plotline_transcript::{ChatEvent, ChatId, EventKind};

/// Default chat title applied when the caller supplies a blank one.
pub const DEFAULT_CHAT_TITLE: &str = "New conversation";

/// Sidebar preview is capped to the first 100 characters of the message.
pub const PREVIEW_TEXT_MAX_CHARS: usize = 100;

/// One chat session as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: ChatId,
    pub title: String,
    pub created_at_unix_seconds: u64,
    pub preview_text: Option<String>,
}

impl SessionRecord {
    pub fn new(id: ChatId, title: impl Into<String>, created_at_unix_seconds: u64) -> Self {
        Self {
            id,
            title: title.into(),
            created_at_unix_seconds,
            preview_text: None,
        }
    }

    pub fn with_preview(mut self, preview: Option<String>) -> Self {
        self.preview_text = preview;
        self
    }
}

/// Derives sidebar preview text from a chat's event log.
///
/// Scans backwards for the latest human or assistant message, then truncates
/// on a character boundary. Tool events never contribute previews.
pub fn preview_text(events: &[ChatEvent]) -> Option<String> {
    events
        .iter()
        .rev()
        .find(|event| {
            matches!(event.kind, EventKind::Human | EventKind::Assistant)
                && !event.content.is_empty()
        })
        .map(|event| event.content.chars().take(PREVIEW_TEXT_MAX_CHARS).collect())
}
