//! Host-side pieces around `quiver-core`: the CSV shot log, capture mapping,
//! history summaries and the console recorder used by the `quiver` binary.

pub mod capture;
pub mod config;
pub mod console;
pub mod history;
pub mod store;

pub use capture::{CanvasGeometry, CaptureError};
pub use config::RecorderConfig;
pub use console::{run_recorder, InputMode, RecorderOutcome};
pub use history::{
    summarize_sessions, summarize_volleys, HistoryFilter, SessionSummary, VolleySummary,
};
pub use store::{LogStore, StoreError, DEFAULT_LOG_FILE, LOG_HEADER};
