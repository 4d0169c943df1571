use std::{path::PathBuf, time::Duration};

use notify_debouncer_mini::{
    new_debouncer,
    notify::{RecommendedWatcher, RecursiveMode},
    DebounceEventHandler, DebounceEventResult, Debouncer,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::error::WatchError;

/// Hands debounced batches from the watcher thread to the async upload loop.
struct BatchForwarder(UnboundedSender<DebounceEventResult>);

impl DebounceEventHandler for BatchForwarder {
    fn handle_event(&mut self, event: DebounceEventResult) {
        let _ = self.0.send(event);
    }
}

/// Recursive, debounced watch over at most one folder at a time.
pub struct ChangesWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    watched_path: Option<PathBuf>,
}

impl ChangesWatcher {
    pub fn new(
        debounce: Duration,
        batches: UnboundedSender<DebounceEventResult>,
    ) -> Result<Self, WatchError> {
        let debouncer =
            new_debouncer(debounce, BatchForwarder(batches)).map_err(WatchError::Init)?;
        Ok(Self {
            debouncer,
            watched_path: None,
        })
    }

    pub fn watched_path(&self) -> Option<&PathBuf> {
        self.watched_path.as_ref()
    }

    pub fn watch(&mut self, path: PathBuf) -> Result<(), WatchError> {
        self.unwatch()?;
        self.debouncer
            .watcher()
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "recursively watching for file changes");
        self.watched_path = Some(path);
        Ok(())
    }

    pub fn unwatch(&mut self) -> Result<(), WatchError> {
        if let Some(path) = self.watched_path.take() {
            self.debouncer
                .watcher()
                .unwatch(&path)
                .map_err(|source| WatchError::Watch {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), "stopped watching");
        }
        Ok(())
    }
}
