use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use plotline_backend::{BackendResult, ChatBackend, LiveEventStream, SessionRecord};
use plotline_transcript::{ChatId, EventId, EventKind, Transcript};
use tokio::sync::Mutex;

use crate::animation::AnimationTracker;
use crate::settings::ClientSettings;

/// Delay before a live assistant turn stops animating, long enough for the
/// typewriter effect to finish.
pub const DEFAULT_ANIMATION_RESET_MS: u64 = 10_000;

/// Live subscription state for the currently displayed chat.
struct ActiveChat {
    chat_id: ChatId,
    live: LiveEventStream,
}

/// Coordinator between the backend collaborator and the presentation layer.
///
/// Owns the reconstructed transcript as an atomically swapped snapshot:
/// readers always observe either the previous complete transcript or the
/// next one, never a partially built state. Each chat's events are owned by
/// exactly one active controller view at a time.
pub struct TranscriptController {
    backend: Arc<dyn ChatBackend>,
    transcript: ArcSwap<Transcript>,
    sessions: ArcSwap<Vec<SessionRecord>>,
    active: Mutex<Option<ActiveChat>>,
    animations: Arc<AnimationTracker>,
    animation_reset: Duration,
}

impl TranscriptController {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            transcript: ArcSwap::from_pointee(Transcript::new()),
            sessions: ArcSwap::from_pointee(Vec::new()),
            active: Mutex::new(None),
            animations: Arc::new(AnimationTracker::new()),
            animation_reset: Duration::from_millis(DEFAULT_ANIMATION_RESET_MS),
        }
    }

    /// Creates a controller configured from persisted client settings.
    pub fn from_settings(backend: Arc<dyn ChatBackend>, settings: &ClientSettings) -> Self {
        Self::new(backend).with_animation_reset(Duration::from_millis(settings.animation_reset_ms))
    }

    pub fn with_animation_reset(mut self, reset: Duration) -> Self {
        self.animation_reset = reset;
        self
    }

    /// Returns the current complete transcript snapshot.
    pub fn transcript(&self) -> Arc<Transcript> {
        self.transcript.load_full()
    }

    /// Returns the cached session list, most recent first.
    pub fn sessions(&self) -> Arc<Vec<SessionRecord>> {
        self.sessions.load_full()
    }

    pub async fn active_chat_id(&self) -> Option<ChatId> {
        self.active.lock().await.as_ref().map(|active| active.chat_id)
    }

    /// Asks whether the presentation layer should animate an event.
    pub fn should_animate(&self, event_id: EventId) -> bool {
        self.animations.should_animate(event_id)
    }

    /// Activates a chat: full batch reconstruction, then one atomic swap.
    ///
    /// Discards any in-progress incremental state; dropping the previous
    /// live stream terminates the old subscription. Loaded history never
    /// animates, so animation marks are cleared as well.
    pub async fn switch_chat(&self, chat_id: ChatId) -> BackendResult<()> {
        let events = self.backend.load_events(chat_id).await?;
        let live = self.backend.subscribe(chat_id).await?;
        let rebuilt = Transcript::from_events(&events);

        let mut active = self.active.lock().await;
        *active = Some(ActiveChat { chat_id, live });
        self.animations.clear();
        self.transcript.store(Arc::new(rebuilt));

        tracing::info!("activated chat {chat_id} with {} stored events", events.len());
        Ok(())
    }

    /// Drains pending live events and applies them incrementally.
    ///
    /// All drained events land in a single snapshot swap. Returns how many
    /// events survived the pre-filter and were applied.
    pub async fn pump_live(&self) -> usize {
        let mut active = self.active.lock().await;
        let Some(active) = active.as_mut() else {
            return 0;
        };

        let mut drained = Vec::new();
        while let Some(event) = active.live.try_recv() {
            drained.push(event);
        }
        if drained.is_empty() {
            return 0;
        }

        let mut next = Transcript::clone(&self.transcript.load());
        let mut applied = 0;

        for event in drained {
            let animate_id = (event.kind == EventKind::Assistant)
                .then_some(event.id)
                .flatten();

            if next.apply_live(event) {
                applied += 1;
                if let Some(event_id) = animate_id {
                    self.mark_for_animation(event_id);
                }
            }
        }

        self.transcript.store(Arc::new(next));
        tracing::debug!(
            "applied {applied} live events to chat {}",
            active.live.chat_id()
        );
        applied
    }

    /// Reloads the session list from the backend.
    pub async fn refresh_sessions(&self) -> BackendResult<Arc<Vec<SessionRecord>>> {
        let listed = self.backend.list_chats().await?;
        let listed = Arc::new(listed);
        self.sessions.store(Arc::clone(&listed));
        Ok(listed)
    }

    /// Creates a chat and makes it the active one.
    pub async fn create_chat(&self, title: &str) -> BackendResult<SessionRecord> {
        let record = self.backend.create_chat(title).await?;
        self.refresh_sessions().await?;
        self.switch_chat(record.id).await?;
        Ok(record)
    }

    /// Renames a chat and refreshes the cached session list.
    pub async fn rename_chat(
        &self,
        chat_id: ChatId,
        title: &str,
    ) -> BackendResult<SessionRecord> {
        let record = self.backend.rename_chat(chat_id, title).await?;
        self.refresh_sessions().await?;
        Ok(record)
    }

    /// Deletes a chat.
    ///
    /// Deleting the active chat activates the most recent remaining one, or
    /// creates a fresh chat when none remain.
    pub async fn delete_chat(&self, chat_id: ChatId) -> BackendResult<()> {
        self.backend.delete_chat(chat_id).await?;
        let sessions = self.refresh_sessions().await?;

        let was_active = {
            let mut active = self.active.lock().await;
            if active.as_ref().map(|a| a.chat_id) == Some(chat_id) {
                *active = None;
                true
            } else {
                false
            }
        };

        if was_active {
            match sessions.first() {
                Some(next) => self.switch_chat(next.id).await?,
                None => {
                    self.create_chat("").await?;
                }
            }
        }

        Ok(())
    }

    fn mark_for_animation(&self, event_id: EventId) {
        self.animations.mark(event_id);

        let tracker = Arc::clone(&self.animations);
        let reset = self.animation_reset;
        tokio::spawn(async move {
            tokio::time::sleep(reset).await;
            tracker.unmark(event_id);
        });
    }
}
