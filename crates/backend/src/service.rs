use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use plotline_transcript::{ChatEvent, ChatId};
use tokio::sync::mpsc;

use super::error::BackendResult;
use super::types::SessionRecord;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Push channel delivering live events for one chat, one event at a time.
///
/// Events arrive in per-chat emission order. Dropping the handle closes the
/// channel, which is how switching the active chat terminates the old
/// subscription: the publisher sees the closed sender and prunes it.
pub struct LiveEventStream {
    chat_id: ChatId,
    events: mpsc::UnboundedReceiver<ChatEvent>,
}

impl LiveEventStream {
    pub(crate) fn new(chat_id: ChatId, events: mpsc::UnboundedReceiver<ChatEvent>) -> Self {
        Self { chat_id, events }
    }

    /// The chat this subscription delivers events for.
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Waits for the next live event; `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll used when draining pending events.
    pub fn try_recv(&mut self) -> Option<ChatEvent> {
        self.events.try_recv().ok()
    }
}

impl Stream for LiveEventStream {
    type Item = ChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

/// Builds the sender/receiver pair backing one live subscription.
pub fn make_live_stream(chat_id: ChatId) -> (mpsc::UnboundedSender<ChatEvent>, LiveEventStream) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (event_tx, LiveEventStream::new(chat_id, event_rx))
}

/// Abstract contract for the backend collaborator.
///
/// The core only needs these operations; transport, persistence, and LLM
/// orchestration live behind this seam. Failures are signalled, never
/// rendered, by this layer.
pub trait ChatBackend: Send + Sync {
    /// Loads the stored event sequence for a chat, in emission order.
    fn load_events(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<Vec<ChatEvent>>>;

    /// Opens a live subscription for a chat.
    fn subscribe(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<LiveEventStream>>;

    /// Creates a chat; blank titles fall back to the default title.
    fn create_chat(&self, title: &str) -> BoxFuture<'_, BackendResult<SessionRecord>>;

    /// Renames a chat; fails when the title trims to empty.
    fn rename_chat(
        &self,
        chat_id: ChatId,
        title: &str,
    ) -> BoxFuture<'_, BackendResult<SessionRecord>>;

    /// Deletes a chat and terminates its subscriptions.
    fn delete_chat(&self, chat_id: ChatId) -> BoxFuture<'_, BackendResult<()>>;

    /// Lists sessions, most recently created first.
    fn list_chats(&self) -> BoxFuture<'_, BackendResult<Vec<SessionRecord>>>;
}
