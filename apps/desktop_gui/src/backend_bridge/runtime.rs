//! Runtime bridge between UI command queue and backend event intake.

use std::{future::Future, sync::Arc, thread, time::Duration};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::domain::LogEntry;
use tokio::{sync::broadcast, task::JoinHandle};
use uploader_core::{config::Settings, HostBridge, UploaderHost};

use crate::backend_bridge::commands::BackendCommand;
use crate::backend_bridge::picker::RfdFolderPicker;
use crate::controller::events::{CommandOutcome, UiEvent};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: Settings,
) -> thread::JoinHandle<()> {
    let command_timeout = settings.command_timeout();
    launch_with(cmd_rx, ui_tx, command_timeout, move || {
        let host: Arc<dyn HostBridge> = UploaderHost::new(&settings, Arc::new(RfdFolderPicker))?;
        Ok(host)
    })
}

/// Spawns the worker thread; `make_host` runs inside the worker's runtime.
pub fn launch_with<F>(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    command_timeout: Duration,
    make_host: F,
) -> thread::JoinHandle<()>
where
    F: FnOnce() -> anyhow::Result<Arc<dyn HostBridge>> + Send + 'static,
{
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::BridgeUnavailable(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                return;
            }
        };

        runtime.block_on(async move {
            let host = match make_host() {
                Ok(host) => host,
                Err(err) => {
                    tracing::error!("failed to initialize uploader host: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::BridgeUnavailable(format!(
                        "backend worker startup failure: {err:#}"
                    )));
                    return;
                }
            };
            serve(host, cmd_rx, ui_tx, command_timeout).await;
        });
    })
}

/// Forwards host events to the view until dropped.
pub struct EventSubscription {
    task: JoinHandle<()>,
}

impl EventSubscription {
    pub fn forward(mut events: broadcast::Receiver<LogEntry>, ui_tx: Sender<UiEvent>) -> Self {
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(entry) => match ui_tx.try_send(UiEvent::BackendLog(entry)) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            tracing::warn!("ui event queue full; dropping backend log entry");
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event subscription lagged");
                        let _ = ui_tx.try_send(UiEvent::BackendLog(LogEntry::error(format!(
                            "{skipped} backend events were dropped"
                        ))));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self { task }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(channel = shared::EVENT_LOG_CHANNEL, "event subscription released");
    }
}

async fn serve(
    host: Arc<dyn HostBridge>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    command_timeout: Duration,
) {
    let subscription = EventSubscription::forward(host.subscribe_events(), ui_tx.clone());
    tracing::info!(channel = shared::EVENT_LOG_CHANNEL, "backend worker ready");

    while let Ok(cmd) = cmd_rx.recv() {
        let command = cmd.name();
        tracing::info!(command, "backend: executing");
        let Some(outcome) = execute(host.as_ref(), cmd, command_timeout).await else {
            break;
        };
        if ui_tx.send(UiEvent::CommandFinished(outcome)).is_err() {
            break;
        }
    }

    drop(subscription);
    if let Err(err) = host.unwatch().await {
        tracing::warn!("unwatch during shutdown failed: {err}");
    }
    tracing::info!("backend worker stopped");
}

async fn execute(
    host: &dyn HostBridge,
    cmd: BackendCommand,
    limit: Duration,
) -> Option<CommandOutcome> {
    let outcome = match cmd {
        BackendCommand::Watch => {
            CommandOutcome::Watch(with_timeout("watch", limit, host.watch()).await)
        }
        BackendCommand::Unwatch => {
            CommandOutcome::Unwatch(with_timeout("unwatch", limit, host.unwatch()).await)
        }
        BackendCommand::SetApiKey { new_api_key } => CommandOutcome::SetApiKey(
            with_timeout("set_api_key", limit, host.set_api_key(&new_api_key)).await,
        ),
        // Waits on the user, so no deadline applies.
        BackendCommand::PickFolder => {
            CommandOutcome::PickFolder(host.pick_folder().await.map_err(|err| err.to_string()))
        }
        BackendCommand::Shutdown => return None,
    };
    Some(outcome)
}

async fn with_timeout<T>(
    command: &'static str,
    limit: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, String> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::error!(command, "backend: command failed: {err:#}");
            Err(err.to_string())
        }
        Err(_) => {
            tracing::error!(command, ?limit, "backend: command timed out");
            Err(format!("{command} timed out after {limit:?}"))
        }
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
