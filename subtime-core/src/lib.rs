//! Timestamp conversion and retiming for subtitle workflows.

pub mod retime;
pub mod srt;
pub mod timestamp;

pub use retime::Retime;
pub use timestamp::{format_time, to_seconds, Timestamp, TimestampError};
