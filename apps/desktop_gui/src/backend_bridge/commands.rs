//! Backend commands queued from UI to backend worker.

pub enum BackendCommand {
    Watch,
    Unwatch,
    SetApiKey { new_api_key: String },
    PickFolder,
    /// Releases the event subscription and stops the worker.
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Watch => "watch",
            BackendCommand::Unwatch => "unwatch",
            BackendCommand::SetApiKey { .. } => "set_api_key",
            BackendCommand::PickFolder => "pick_folder",
            BackendCommand::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Debug for BackendCommand {
    // Keeps the API key out of logs and assertion output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for BackendCommand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                BackendCommand::SetApiKey { new_api_key: a },
                BackendCommand::SetApiKey { new_api_key: b },
            ) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}
