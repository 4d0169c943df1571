//! Events flowing from the backend worker back into the view.

use shared::domain::LogEntry;

use crate::backend_bridge::commands::BackendCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Pushed by the host on the event-log channel.
    BackendLog(LogEntry),
    CommandFinished(CommandOutcome),
    /// The worker could not start; no further outcomes will arrive.
    BridgeUnavailable(String),
}

/// Result of one bridge command, with failures flattened to their description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Watch(Result<(), String>),
    Unwatch(Result<(), String>),
    SetApiKey(Result<(), String>),
    PickFolder(Result<Option<String>, String>),
}

impl CommandOutcome {
    /// Outcome for a command that never reached the worker.
    pub fn failed(command: &BackendCommand, reason: impl Into<String>) -> Option<Self> {
        let reason = reason.into();
        match command {
            BackendCommand::Watch => Some(Self::Watch(Err(reason))),
            BackendCommand::Unwatch => Some(Self::Unwatch(Err(reason))),
            BackendCommand::SetApiKey { .. } => Some(Self::SetApiKey(Err(reason))),
            BackendCommand::PickFolder => Some(Self::PickFolder(Err(reason))),
            BackendCommand::Shutdown => None,
        }
    }
}
