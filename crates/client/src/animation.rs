use std::collections::HashSet;
use std::sync::Mutex;

use plotline_transcript::EventId;

/// Tracks which events the presentation layer should animate.
///
/// The transcript core never owns animation state; this is a capability the
/// core's output is queried against. Marks are added when a live assistant
/// turn arrives and cleared wholesale on chat switch, so loading an existing
/// chat never replays typewriter animation.
#[derive(Debug, Default)]
pub struct AnimationTracker {
    marks: Mutex<HashSet<EventId>>,
}

impl AnimationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, event_id: EventId) {
        if let Ok(mut marks) = self.marks.lock() {
            marks.insert(event_id);
        }
    }

    pub fn unmark(&self, event_id: EventId) {
        if let Ok(mut marks) = self.marks.lock() {
            marks.remove(&event_id);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut marks) = self.marks.lock() {
            marks.clear();
        }
    }

    pub fn should_animate(&self, event_id: EventId) -> bool {
        self.marks
            .lock()
            .map(|marks| marks.contains(&event_id))
            .unwrap_or(false)
    }
}
