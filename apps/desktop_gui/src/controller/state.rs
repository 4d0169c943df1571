//! View state owned by the controller.

use std::collections::VecDeque;

use shared::domain::LogEntry;

/// Newest-first activity log with a fixed capacity; the oldest entry is
/// dropped once the capacity is reached.
#[derive(Debug, Clone)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBook {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    SetApiKey,
    ApplyFolder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    Starting,
    Stopping { then: Option<FollowUp> },
    CommittingApiKey,
    PickingFolder,
}

/// User intents that can wait in the single-slot queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Stop,
    CommitApiKey,
    PickFolder,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub api_key: String,
    pub xml_path: String,
    pub is_running: bool,
    pub pending: Option<PendingOperation>,
    pub queued: Option<Intent>,
    /// A key commit requested mid-operation; never displaced by `queued`.
    pub key_commit_queued: bool,
    pub log: LogBook,
}

impl ViewState {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            api_key: String::new(),
            xml_path: String::new(),
            is_running: false,
            pending: None,
            queued: None,
            key_commit_queued: false,
            log: LogBook::with_capacity(log_capacity),
        }
    }

    pub fn fields_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.xml_path.is_empty()
    }

    pub fn toggle_enabled(&self) -> bool {
        self.fields_complete() && self.pending.is_none()
    }

    pub fn status_label(&self) -> &'static str {
        match (&self.pending, self.is_running) {
            (Some(PendingOperation::Starting), _) => "Starting...",
            (Some(PendingOperation::Stopping { .. }), _) => "Stopping...",
            (_, true) => "Running",
            (_, false) => "Stopped",
        }
    }
}
