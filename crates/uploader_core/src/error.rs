use std::path::PathBuf;

use notify_debouncer_mini::notify;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("No folder selected")]
    NoFolderSelected,
    #[error("failed to create file watcher: {0}")]
    Init(#[source] notify::Error),
    #[error("{source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unrecognized file type")]
    UnrecognizedFile,
    #[error("API key is not set")]
    MissingApiKey,
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    /// Results service answered with a non-success status; `body` is its explanation.
    #[error("{body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
