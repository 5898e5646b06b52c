//! The retrying log tailer: poll state machine, dedup ring buffer, and the
//! async driver that owns cancellation.

pub mod buffer;
pub mod state;
pub mod tailer;

pub use buffer::{LogBuffer, LogFilter};
pub use state::{PollDecision, RetryState, TailParams, TailState, TailStatus};
pub use tailer::{LogTailer, PollOutcome};
