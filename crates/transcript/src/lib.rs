#![deny(unsafe_code)]

pub mod chart;
pub mod classifier;
pub mod error;
/// Domain entities for conversation events.
pub mod event;
pub mod ids;
/// Transcript reordering and grouping, batch and incremental.
pub mod reconstruct;

pub use chart::{CHART_SERIES_NAME, ChartSeries, build_series};
pub use classifier::{GRAPH_DATA_FIELD, is_plottable};
pub use error::{TranscriptError, TranscriptResult};
pub use event::{ChatEvent, EventKind};
pub use ids::{ChatId, EventId};
pub use reconstruct::{DisplayGroup, Transcript, reconstruct, reorder_events};
