use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind};
use shared::domain::LogEntry;
use tokio::{
    sync::{broadcast, mpsc, Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{error, info, warn};

pub mod classify;
pub mod config;
pub mod error;
pub mod uploader;
pub mod watcher;

use crate::{
    classify::{detect_kind, has_xml_extension},
    config::Settings,
    error::{UploadError, WatchError},
    uploader::{HttpResultsUploader, ResultsUploader},
    watcher::ChangesWatcher,
};

const EVENT_BUFFER: usize = 1024;

/// Commands and event subscription a view uses to drive the uploader host.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Starts watching the previously picked folder.
    async fn watch(&self) -> Result<()>;
    async fn unwatch(&self) -> Result<()>;
    /// Replaces the stored credential; an empty key clears it.
    async fn set_api_key(&self, new_api_key: &str) -> Result<()>;
    /// Suspends until the user picks a folder (`Some`) or cancels (`None`).
    async fn pick_folder(&self) -> Result<Option<String>>;
    fn subscribe_events(&self) -> broadcast::Receiver<LogEntry>;
}

#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick_folder(&self) -> Option<PathBuf>;
}

/// Picker for hosts without a desktop session; always behaves as cancelled.
pub struct MissingFolderPicker;

#[async_trait]
impl FolderPicker for MissingFolderPicker {
    async fn pick_folder(&self) -> Option<PathBuf> {
        warn!("no folder picker available; treating pick_folder as cancelled");
        None
    }
}

/// In-process host: watches the chosen folder and uploads recognized
/// documents, reporting every outcome on the event channel.
pub struct UploaderHost {
    api_key: Arc<RwLock<Option<String>>>,
    xml_path: Mutex<Option<PathBuf>>,
    // Shared with blocking tasks: notify may stall while registering OS watches.
    watcher: Arc<Mutex<ChangesWatcher>>,
    folder_picker: Arc<dyn FolderPicker>,
    events: broadcast::Sender<LogEntry>,
    upload_task: JoinHandle<()>,
}

impl UploaderHost {
    /// Must be called from within a tokio runtime.
    pub fn new(settings: &Settings, folder_picker: Arc<dyn FolderPicker>) -> Result<Arc<Self>> {
        let uploader = Arc::new(HttpResultsUploader::new(settings.api_base()));
        Self::with_uploader(settings, folder_picker, uploader)
    }

    pub fn with_uploader(
        settings: &Settings,
        folder_picker: Arc<dyn FolderPicker>,
        uploader: Arc<dyn ResultsUploader>,
    ) -> Result<Arc<Self>> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let watcher = ChangesWatcher::new(settings.debounce(), batch_tx)
            .context("failed to initialize folder watcher")?;
        let api_key = Arc::new(RwLock::new(None));

        let upload_task = tokio::spawn(run_upload_loop(
            batch_rx,
            api_key.clone(),
            uploader,
            events.clone(),
        ));

        Ok(Arc::new(Self {
            api_key,
            xml_path: Mutex::new(None),
            watcher: Arc::new(Mutex::new(watcher)),
            folder_picker,
            events,
            upload_task,
        }))
    }

    /// Selects the watched folder without going through the picker.
    pub async fn set_folder(&self, path: impl Into<PathBuf>) {
        *self.xml_path.lock().await = Some(path.into());
    }

    pub async fn folder(&self) -> Option<PathBuf> {
        self.xml_path.lock().await.clone()
    }

    pub async fn api_key(&self) -> Option<String> {
        self.api_key.read().await.clone()
    }

    pub async fn watched_path(&self) -> Option<PathBuf> {
        self.watcher.lock().await.watched_path().cloned()
    }
}

impl Drop for UploaderHost {
    fn drop(&mut self) {
        self.upload_task.abort();
    }
}

#[async_trait]
impl HostBridge for UploaderHost {
    async fn watch(&self) -> Result<()> {
        let path = self
            .xml_path
            .lock()
            .await
            .clone()
            .ok_or(WatchError::NoFolderSelected)?;
        let watcher = self.watcher.clone();
        tokio::task::spawn_blocking(move || watcher.blocking_lock().watch(path)).await??;
        Ok(())
    }

    async fn unwatch(&self) -> Result<()> {
        let watcher = self.watcher.clone();
        tokio::task::spawn_blocking(move || watcher.blocking_lock().unwatch()).await??;
        Ok(())
    }

    async fn set_api_key(&self, new_api_key: &str) -> Result<()> {
        let key = Some(new_api_key.to_string()).filter(|k| !k.is_empty());
        info!(cleared = key.is_none(), "api key updated");
        *self.api_key.write().await = key;
        Ok(())
    }

    async fn pick_folder(&self) -> Result<Option<String>> {
        let Some(path) = self.folder_picker.pick_folder().await else {
            return Ok(None);
        };
        let display = path.display().to_string();
        *self.xml_path.lock().await = Some(path);
        Ok(Some(display))
    }

    fn subscribe_events(&self) -> broadcast::Receiver<LogEntry> {
        self.events.subscribe()
    }
}

async fn run_upload_loop(
    mut batches: mpsc::UnboundedReceiver<DebounceEventResult>,
    api_key: Arc<RwLock<Option<String>>>,
    uploader: Arc<dyn ResultsUploader>,
    events: broadcast::Sender<LogEntry>,
) {
    while let Some(batch) = batches.recv().await {
        for entry in process_batch(batch, &api_key, uploader.as_ref()).await {
            // No subscribers is not an error: the view may not be listening yet.
            let _ = events.send(entry);
        }
    }
}

async fn process_batch(
    batch: DebounceEventResult,
    api_key: &RwLock<Option<String>>,
    uploader: &dyn ResultsUploader,
) -> Vec<LogEntry> {
    match batch {
        Ok(changes) => {
            let mut entries = Vec::new();
            for change in changes
                .iter()
                .filter(|c| has_xml_extension(&c.path))
                .filter(|c| c.kind == DebouncedEventKind::Any)
            {
                let api_key = api_key.read().await.clone();
                entries.push(upload_changed_file(&change.path, api_key, uploader).await);
            }
            entries
        }
        Err(err) if err.paths.iter().any(|p| has_xml_extension(p)) => {
            error!("watch error: {err}");
            let paths = err
                .paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            vec![LogEntry::error_for(err.to_string(), paths)]
        }
        Err(err) => {
            warn!("watch error: {err}");
            Vec::new()
        }
    }
}

async fn upload_changed_file(
    path: &Path,
    api_key: Option<String>,
    uploader: &dyn ResultsUploader,
) -> LogEntry {
    let filename = path.display().to_string();
    match classify_and_upload(path, api_key, uploader).await {
        Ok(kind) => {
            info!(file = %filename, %kind, "uploaded");
            LogEntry::success(format!("{kind} uploaded"), filename)
        }
        Err(err) => {
            error!(file = %filename, "upload failed: {err}");
            LogEntry::error_for(err.to_string(), filename)
        }
    }
}

async fn classify_and_upload(
    path: &Path,
    api_key: Option<String>,
    uploader: &dyn ResultsUploader,
) -> Result<shared::domain::XmlFileKind, UploadError> {
    let owned = path.to_path_buf();
    let kind = tokio::task::spawn_blocking(move || detect_kind(&owned))
        .await??
        .ok_or(UploadError::UnrecognizedFile)?;
    let api_key = api_key.ok_or(UploadError::MissingApiKey)?;
    uploader.upload(kind, path, &api_key).await?;
    Ok(kind)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
