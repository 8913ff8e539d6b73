#![deny(unsafe_code)]

/// Animation capability queried by the presentation layer.
pub mod animation;
/// Transcript coordination: chat switching, live updates, session CRUD.
pub mod controller;
pub mod logging;
/// Settings persistence.
pub mod settings;

pub use animation::AnimationTracker;
pub use controller::{DEFAULT_ANIMATION_RESET_MS, TranscriptController};
pub use logging::init_tracing;
pub use settings::{ClientSettings, SettingsError, SettingsStore};
