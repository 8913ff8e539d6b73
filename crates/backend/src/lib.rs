#![deny(unsafe_code)]

pub mod error;
pub mod memory;
/// Service boundary contracts for the chat backend collaborator.
pub mod service;
pub mod types;

pub use error::{BackendError, BackendResult};
pub use memory::{MemoryBackend, WELCOME_GREETING};
pub use service::{BoxFuture, ChatBackend, LiveEventStream, make_live_stream};
pub use types::{DEFAULT_CHAT_TITLE, PREVIEW_TEXT_MAX_CHARS, SessionRecord, preview_text};
