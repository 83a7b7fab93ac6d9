use std::sync::Arc;

use activation_core::{
    update, ActivationConfig, AppState, AppViewModel, Msg, Notice, INSTANCES_KEY, SUPPORT_KEY,
};
use activation_engine::host::{CapabilityProbe, DeclarativeContent, RuntimeMessenger};
use activation_engine::{
    read_bool, read_strings, select_registrar, EngineError, EngineHandle, EngineParts,
    PermissionBroker, SettingsStore, StoreError,
};
use activation_logging::activation_info;

use crate::effects::{map_kind, EffectRunner};

/// Owns the activation state and drives its effects against the host.
pub struct Controller {
    state: AppState,
    runner: EffectRunner,
}

impl Controller {
    /// Probes the host, reads the stored settings and starts the permission check.
    pub fn start<H>(host: Arc<H>, store: Arc<dyn SettingsStore>) -> Result<Self, StoreError>
    where
        H: PermissionBroker + CapabilityProbe + DeclarativeContent + RuntimeMessenger + 'static,
    {
        let support_enabled = read_bool(store.as_ref(), SUPPORT_KEY)?.unwrap_or(false);
        let instances = read_strings(store.as_ref(), INSTANCES_KEY)?;

        let registrar = select_registrar(host.clone());
        let config = ActivationConfig::new(map_kind(registrar.kind()));
        activation_info!(
            "Starting with {}={} and {} stored instances",
            SUPPORT_KEY,
            support_enabled,
            instances.as_ref().map_or(0, Vec::len)
        );

        let engine = EngineHandle::new(EngineParts {
            broker: host,
            registrar,
            store,
        });
        let mut controller = Self {
            state: AppState::new(config),
            runner: EffectRunner::new(engine),
        };
        controller.dispatch(Msg::Loaded {
            support_enabled,
            instances,
        });
        Ok(controller)
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Feeds engine results back in until nothing is outstanding.
    pub fn settle(&mut self) -> Result<(), EngineError> {
        loop {
            let inbox = self.runner.collect()?;
            if inbox.is_empty() {
                return Ok(());
            }
            for msg in inbox {
                self.dispatch(msg);
            }
        }
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Returns whether the view changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.runner.take_notices()
    }

    pub fn shutdown(&self) {
        self.runner.shutdown();
    }
}

/// User-facing text for a notice.
pub fn describe_notice(notice: &Notice) -> String {
    match notice {
        Notice::InstanceRejected(err) => format!("Could not add instance: {err}"),
        Notice::PermissionDenied => {
            "Permission was not granted; alternate frontend support stays off".to_string()
        }
        Notice::FlagCorrected { enabled: true } => {
            "Permissions are already granted; alternate frontend support is on".to_string()
        }
        Notice::FlagCorrected { enabled: false } => {
            "Permissions were revoked outside the extension; alternate frontend support is off"
                .to_string()
        }
    }
}
