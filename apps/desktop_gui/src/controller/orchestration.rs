//! Command orchestration helpers from UI actions to backend command queue.

use std::collections::VecDeque;

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{CommandOutcome, UiEvent};
use crate::controller::reducer::ViewController;

/// Queues one command; on failure hands the command back with a reason.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), (BackendCommand, String)> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(cmd)) => {
            Err((cmd, "UI command queue is full; please retry".to_string()))
        }
        Err(TrySendError::Disconnected(cmd)) => Err((
            cmd,
            "Backend command processor disconnected (possible startup/runtime failure)"
                .to_string(),
        )),
    }
}

/// Dispatches the controller's commands; a command that cannot be queued is
/// fed back as a failed outcome so the pending operation always settles.
pub fn drive(
    controller: &mut ViewController,
    cmd_tx: &Sender<BackendCommand>,
    commands: Vec<BackendCommand>,
) {
    let mut queue: VecDeque<BackendCommand> = commands.into();
    while let Some(cmd) = queue.pop_front() {
        let Err((cmd, reason)) = dispatch_backend_command(cmd_tx, cmd) else {
            continue;
        };
        tracing::warn!(command = cmd.name(), "{reason}");
        if let Some(outcome) = CommandOutcome::failed(&cmd, reason) {
            queue.extend(controller.handle_event(UiEvent::CommandFinished(outcome)));
        }
    }
}
