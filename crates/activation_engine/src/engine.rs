use std::pin::pin;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use activation_logging::{activation_debug, activation_error, activation_info, activation_warn};
use futures_util::future::{select, Either};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    BrokerError, EngineError, EngineEvent, InjectionRegistrar, PermissionBroker, PermissionSet,
    ScriptBundle, SettingsStore,
};

/// Collaborators the worker drives.
pub struct EngineParts {
    pub broker: Arc<dyn PermissionBroker>,
    pub registrar: Box<dyn InjectionRegistrar>,
    pub store: Arc<dyn SettingsStore>,
}

enum EngineCommand {
    CheckPermissions { ticket: u64, set: PermissionSet },
    RequestPermissions { ticket: u64, set: PermissionSet },
    RemovePermissions { origins: Vec<String> },
    Register {
        handle: String,
        patterns: Vec<String>,
        bundle: ScriptBundle,
    },
    Unregister { handle: String },
    Persist { key: String, value: Value },
    Barrier(mpsc::Sender<()>),
}

/// Runs broker, registrar and store calls one at a time, in submission order.
///
/// A single worker is the only writer of the registration handle, so a
/// register can never overlap an unregister or another register.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn new(parts: EngineParts) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let worker = Worker {
            parts,
            event_tx,
            cancel: cancel.clone(),
        };

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    activation_error!("Could not start engine runtime: {}", err);
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                if worker.cancel.is_cancelled() {
                    break;
                }
                runtime.block_on(worker.handle(command));
            }
            activation_debug!("Engine worker stopped");
        });

        Self {
            cmd_tx,
            event_rx,
            cancel,
        }
    }

    pub fn check_permissions(&self, ticket: u64, set: PermissionSet) {
        self.send(EngineCommand::CheckPermissions { ticket, set });
    }

    pub fn request_permissions(&self, ticket: u64, set: PermissionSet) {
        self.send(EngineCommand::RequestPermissions { ticket, set });
    }

    pub fn remove_permissions(&self, origins: Vec<String>) {
        self.send(EngineCommand::RemovePermissions { origins });
    }

    pub fn register(&self, handle: impl Into<String>, patterns: Vec<String>, bundle: ScriptBundle) {
        self.send(EngineCommand::Register {
            handle: handle.into(),
            patterns,
            bundle,
        });
    }

    pub fn unregister(&self, handle: impl Into<String>) {
        self.send(EngineCommand::Unregister {
            handle: handle.into(),
        });
    }

    pub fn persist(&self, key: impl Into<String>, value: Value) {
        self.send(EngineCommand::Persist {
            key: key.into(),
            value,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until every command submitted so far has been handled.
    pub fn flush(&self) -> Result<(), EngineError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(EngineCommand::Barrier(tx))
            .map_err(|_| EngineError::Disconnected)?;
        rx.recv().map_err(|_| EngineError::Disconnected)
    }

    /// Stops the worker; an open prompt resolves as dismissed.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            activation_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    parts: EngineParts,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
}

impl Worker {
    async fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::CheckPermissions { ticket, set } => {
                match self.parts.broker.contains(&set).await {
                    Ok(held) => self.emit(EngineEvent::PermissionsHeld { ticket, held }),
                    Err(err) => activation_warn!("Permission check {} failed: {}", ticket, err),
                }
            }
            EngineCommand::RequestPermissions { ticket, set } => {
                let result = self.prompt(&set).await;
                activation_info!("Permission request {} resolved: {:?}", ticket, result);
                self.emit(EngineEvent::PermissionDecided { ticket, result });
            }
            EngineCommand::RemovePermissions { origins } => {
                match self.parts.broker.remove(&origins).await {
                    Ok(removed) => {
                        activation_debug!("Revoked {} origins (changed: {})", origins.len(), removed)
                    }
                    Err(err) => activation_warn!("Ignoring permission removal failure: {}", err),
                }
            }
            EngineCommand::Register {
                handle,
                patterns,
                bundle,
            } => {
                let kind = self.parts.registrar.kind();
                match self.parts.registrar.register(&handle, &patterns, &bundle).await {
                    Ok(()) => activation_info!(
                        "Registered {} via {} for {} patterns",
                        handle,
                        kind,
                        patterns.len()
                    ),
                    Err(err) => activation_error!("Registering {} via {} failed: {}", handle, kind, err),
                }
            }
            EngineCommand::Unregister { handle } => {
                if let Err(err) = self.parts.registrar.unregister(&handle).await {
                    activation_warn!("Ignoring unregister failure for {}: {}", handle, err);
                }
            }
            EngineCommand::Persist { key, value } => {
                if let Err(err) = self.parts.store.set(&key, value) {
                    activation_error!("Failed to persist {}: {}", key, err);
                }
            }
            EngineCommand::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn prompt(&self, set: &PermissionSet) -> Result<bool, BrokerError> {
        let request = self.parts.broker.request(set);
        let cancelled = pin!(self.cancel.cancelled());
        match select(request, cancelled).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(BrokerError::Dismissed),
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
