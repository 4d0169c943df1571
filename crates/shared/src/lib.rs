//! Types exchanged between the uploader host and its views.

pub mod domain;

/// Name of the channel the host pushes [`domain::LogEntry`] values on.
pub const EVENT_LOG_CHANNEL: &str = "event-log";
