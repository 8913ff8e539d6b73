use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use plotline_transcript::{ChatEvent, ChatId, EventId};
use snafu::{OptionExt, ensure};
use tokio::sync::{Mutex, mpsc};

use super::error::{BackendResult, ChatNotFoundSnafu, EmptyTitleSnafu};
use super::service::{BoxFuture, ChatBackend, LiveEventStream, make_live_stream};
use super::types::{DEFAULT_CHAT_TITLE, SessionRecord, preview_text};

/// Assistant greeting seeded into every newly created chat.
pub const WELCOME_GREETING: &str =
    "Hi! Ask me about a device and I can estimate how its price will evolve.";

struct ChatEntry {
    record: SessionRecord,
    events: Vec<ChatEvent>,
    subscribers: Vec<mpsc::UnboundedSender<ChatEvent>>,
}

/// In-memory backend collaborator.
///
/// Reference implementation of [`ChatBackend`] used as the test double for
/// the client layer; persistent storage engines stay out of scope.
#[derive(Default)]
pub struct MemoryBackend {
    chats: Mutex<HashMap<ChatId, ChatEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to a chat's log and fans it out to live subscribers.
    ///
    /// Subscribers whose stream handle was dropped are pruned here, on the
    /// next publish.
    pub async fn publish_event(&self, chat_id: ChatId, event: ChatEvent) -> BackendResult<()> {
        let mut chats = self.chats.lock().await;
        let entry = chats.get_mut(&chat_id).context(ChatNotFoundSnafu {
            stage: "publish-event",
            chat_id,
        })?;

        entry
            .subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        entry.events.push(event);
        Ok(())
    }

    async fn create_chat_inner(&self, title: &str) -> SessionRecord {
        let mut title = title.trim().to_string();
        if title.is_empty() {
            title = DEFAULT_CHAT_TITLE.to_string();
        }

        let greeting = ChatEvent::assistant(WELCOME_GREETING).with_id(EventId::new_v7());
        let events = vec![greeting];

        let record = SessionRecord::new(
            ChatId::new_v7(),
            title,
            current_unix_timestamp_seconds(),
        )
        .with_preview(preview_text(&events));

        let mut chats = self.chats.lock().await;
        chats.insert(
            record.id,
            ChatEntry {
                record: record.clone(),
                events,
                subscribers: Vec::new(),
            },
        );

        tracing::info!("created chat {} ('{}')", record.id, record.title);
        record
    }
}

impl ChatBackend for MemoryBackend {
    fn load_events(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<Vec<ChatEvent>>> {
        Box::pin(async move {
            let chats = self.chats.lock().await;
            let entry = chats.get(&chat_id).context(ChatNotFoundSnafu {
                stage: "load-events",
                chat_id,
            })?;
            Ok(entry.events.clone())
        })
    }

    fn subscribe(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<LiveEventStream>> {
        Box::pin(async move {
            let mut chats = self.chats.lock().await;
            let entry = chats.get_mut(&chat_id).context(ChatNotFoundSnafu {
                stage: "subscribe",
                chat_id,
            })?;

            let (event_tx, stream) = make_live_stream(chat_id);
            entry.subscribers.push(event_tx);
            Ok(stream)
        })
    }

    fn create_chat(&self, title: &str) -> BoxFuture<'_, BackendResult<SessionRecord>> {
        let title = title.to_string();
        Box::pin(async move { Ok(self.create_chat_inner(&title).await) })
    }

    fn rename_chat(
        &self,
        chat_id: ChatId,
        title: &str,
    ) -> BoxFuture<'_, BackendResult<SessionRecord>> {
        let title = title.trim().to_string();
        Box::pin(async move {
            ensure!(!title.is_empty(), EmptyTitleSnafu { stage: "rename-chat" });

            let mut chats = self.chats.lock().await;
            let entry = chats.get_mut(&chat_id).context(ChatNotFoundSnafu {
                stage: "rename-chat",
                chat_id,
            })?;
            entry.record.title = title;

            tracing::info!("renamed chat {} to '{}'", chat_id, entry.record.title);
            Ok(entry.record.clone())
        })
    }

    fn delete_chat(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            let mut chats = self.chats.lock().await;
            // Dropping the entry drops its subscriber senders, which closes
            // every live stream for this chat.
            chats.remove(&chat_id).context(ChatNotFoundSnafu {
                stage: "delete-chat",
                chat_id,
            })?;

            tracing::info!("deleted chat {}", chat_id);
            Ok(())
        })
    }

    fn list_chats(&self) -> BoxFuture<'_, BackendResult<Vec<SessionRecord>>> {
        Box::pin(async move {
            let chats = self.chats.lock().await;
            let mut records: Vec<SessionRecord> = chats
                .values()
                .map(|entry| {
                    entry
                        .record
                        .clone()
                        .with_preview(preview_text(&entry.events))
                })
                .collect();

            records.sort_by(|a, b| {
                b.created_at_unix_seconds
                    .cmp(&a.created_at_unix_seconds)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Ok(records)
        })
    }
}

fn current_unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
