//! View controller: turns user actions and backend outcomes into state
//! transitions plus the bridge commands to issue next.
//!
//! At most one command is in flight. An intent arriving while one is pending
//! waits in a single slot (newest wins) and runs once the pending operation
//! settles. A key commit waits beside that slot and runs first, so the host
//! always ends up with the key the view shows.

use shared::domain::LogEntry;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{CommandOutcome, UiEvent};
use crate::controller::state::{FollowUp, Intent, PendingOperation, ViewState};

pub const WATCHING_MESSAGE: &str = "Watching for new XML files...";
pub const STOPPED_MESSAGE: &str = "Watcher stopped";
pub const MISSING_FIELDS_MESSAGE: &str = "Enter an API key and select a folder before starting";

pub struct ViewController {
    state: ViewState,
}

impl ViewController {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            state: ViewState::new(log_capacity),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Replaces the API key text; the host is only told on commit.
    pub fn set_api_key(&mut self, text: impl Into<String>) {
        self.state.api_key = text.into();
    }

    /// Stops a running watch first, then hands the current key to the host.
    pub fn commit_api_key_change(&mut self) -> Vec<BackendCommand> {
        self.request(Intent::CommitApiKey)
    }

    pub fn change_xml_path(&mut self) -> Vec<BackendCommand> {
        self.request(Intent::PickFolder)
    }

    pub fn start(&mut self) -> Vec<BackendCommand> {
        self.request(Intent::Start)
    }

    pub fn stop(&mut self) -> Vec<BackendCommand> {
        self.request(Intent::Stop)
    }

    pub fn toggle(&mut self) -> Vec<BackendCommand> {
        if self.state.is_running {
            self.stop()
        } else {
            self.start()
        }
    }

    pub fn on_backend_log(&mut self, entry: LogEntry) {
        self.state.log.push(entry);
    }

    pub fn handle_event(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        match event {
            UiEvent::BackendLog(entry) => {
                self.on_backend_log(entry);
                Vec::new()
            }
            UiEvent::CommandFinished(outcome) => self.finish(outcome),
            UiEvent::BridgeUnavailable(reason) => {
                tracing::error!("backend bridge unavailable: {reason}");
                self.state.log.push(LogEntry::error(reason));
                Vec::new()
            }
        }
    }

    fn request(&mut self, intent: Intent) -> Vec<BackendCommand> {
        if let Some(pending) = &self.state.pending {
            tracing::debug!(?intent, ?pending, "operation in progress; queueing intent");
            match intent {
                Intent::CommitApiKey => self.state.key_commit_queued = true,
                other => self.state.queued = Some(other),
            }
            return Vec::new();
        }
        self.begin(intent)
    }

    fn begin(&mut self, intent: Intent) -> Vec<BackendCommand> {
        match intent {
            Intent::Start => {
                if self.state.is_running {
                    tracing::debug!("start ignored; watcher already running");
                    return Vec::new();
                }
                if !self.state.fields_complete() {
                    self.state.log.push(LogEntry::error(MISSING_FIELDS_MESSAGE));
                    return Vec::new();
                }
                self.state.pending = Some(PendingOperation::Starting);
                vec![BackendCommand::Watch]
            }
            Intent::Stop => self.begin_stop(None),
            Intent::CommitApiKey => {
                if self.state.is_running {
                    self.begin_stop(Some(FollowUp::SetApiKey))
                } else {
                    self.issue_set_api_key()
                }
            }
            Intent::PickFolder => {
                self.state.pending = Some(PendingOperation::PickingFolder);
                vec![BackendCommand::PickFolder]
            }
        }
    }

    fn begin_stop(&mut self, then: Option<FollowUp>) -> Vec<BackendCommand> {
        self.state.pending = Some(PendingOperation::Stopping { then });
        vec![BackendCommand::Unwatch]
    }

    fn issue_set_api_key(&mut self) -> Vec<BackendCommand> {
        self.state.pending = Some(PendingOperation::CommittingApiKey);
        vec![BackendCommand::SetApiKey {
            new_api_key: self.state.api_key.clone(),
        }]
    }

    fn finish(&mut self, outcome: CommandOutcome) -> Vec<BackendCommand> {
        let pending = self.state.pending.take();
        let commands = match outcome {
            CommandOutcome::Watch(Ok(())) => {
                self.state.is_running = true;
                self.state
                    .log
                    .push(LogEntry::info(WATCHING_MESSAGE, self.state.xml_path.clone()));
                Vec::new()
            }
            CommandOutcome::Watch(Err(reason)) => {
                // The watch was never confirmed, so the view stays stopped.
                self.state.is_running = false;
                self.state.log.push(LogEntry::error(reason));
                Vec::new()
            }
            CommandOutcome::Unwatch(result) => {
                match result {
                    Ok(()) => self
                        .state
                        .log
                        .push(LogEntry::info(STOPPED_MESSAGE, self.state.xml_path.clone())),
                    Err(reason) => self.state.log.push(LogEntry::error(reason)),
                }
                self.state.is_running = false;
                match pending {
                    Some(PendingOperation::Stopping {
                        then: Some(FollowUp::SetApiKey),
                    }) => self.issue_set_api_key(),
                    Some(PendingOperation::Stopping {
                        then: Some(FollowUp::ApplyFolder(path)),
                    }) => {
                        self.state.xml_path = path;
                        Vec::new()
                    }
                    _ => Vec::new(),
                }
            }
            CommandOutcome::SetApiKey(Ok(())) => {
                tracing::info!("api key handed to host");
                Vec::new()
            }
            CommandOutcome::SetApiKey(Err(reason)) => {
                self.state.log.push(LogEntry::error(reason));
                Vec::new()
            }
            CommandOutcome::PickFolder(Ok(Some(path))) if path != self.state.xml_path => {
                if self.state.is_running {
                    self.begin_stop(Some(FollowUp::ApplyFolder(path)))
                } else {
                    self.state.xml_path = path;
                    Vec::new()
                }
            }
            CommandOutcome::PickFolder(Ok(_)) => Vec::new(),
            CommandOutcome::PickFolder(Err(reason)) => {
                self.state.log.push(LogEntry::error(reason));
                Vec::new()
            }
        };

        if !commands.is_empty() || self.state.pending.is_some() {
            return commands;
        }
        if std::mem::take(&mut self.state.key_commit_queued) {
            return self.begin(Intent::CommitApiKey);
        }
        match self.state.queued.take() {
            Some(intent) => self.begin(intent),
            None => commands,
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
