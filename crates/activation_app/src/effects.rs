use activation_core::{
    Effect, InjectionStrategy, Msg, Notice, PermissionOutcome, PermissionRequest, INSTANCES_KEY,
    SUPPORT_KEY,
};
use activation_engine::{
    BrokerError, EngineError, EngineEvent, EngineHandle, PermissionSet, RegistrarKind,
    ScriptBundle,
};
use activation_logging::{activation_info, activation_warn};
use serde_json::json;

/// Hands core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    notices: Vec<Notice>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            notices: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CheckPermissions { ticket, request } => {
                    self.engine.check_permissions(ticket, map_request(request));
                }
                Effect::RequestPermissions { ticket, request } => {
                    self.engine.request_permissions(ticket, map_request(request));
                }
                Effect::RemovePermissions { origins } => {
                    self.engine.remove_permissions(origins);
                }
                Effect::Register {
                    handle,
                    patterns,
                    descriptor,
                } => {
                    let bundle = ScriptBundle {
                        js: descriptor.scripts,
                        css: descriptor.styles,
                        all_frames: descriptor.all_frames,
                    };
                    self.engine.register(handle, patterns, bundle);
                }
                Effect::Unregister { handle } => {
                    self.engine.unregister(handle);
                }
                Effect::PersistFlag(enabled) => {
                    self.engine.persist(SUPPORT_KEY, json!(enabled));
                }
                Effect::PersistInstances(instances) => {
                    self.engine.persist(INSTANCES_KEY, json!(instances));
                }
                Effect::Notify(notice) => {
                    activation_info!("Notice: {:?}", notice);
                    self.notices.push(notice);
                }
            }
        }
    }

    /// Waits for the engine to go idle and returns what it reported meanwhile.
    pub fn collect(&self) -> Result<Vec<Msg>, EngineError> {
        self.engine.flush()?;
        Ok(std::iter::from_fn(|| self.engine.try_recv())
            .map(map_event)
            .collect())
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn map_request(request: PermissionRequest) -> PermissionSet {
    PermissionSet {
        origins: request.origins,
        permissions: request.permissions,
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PermissionsHeld { ticket, held } => Msg::PermissionsChecked { ticket, held },
        EngineEvent::PermissionDecided { ticket, result } => Msg::PermissionResolved {
            ticket,
            outcome: map_decision(result),
        },
    }
}

fn map_decision(result: Result<bool, BrokerError>) -> PermissionOutcome {
    match result {
        Ok(true) => PermissionOutcome::Granted,
        Ok(false) => PermissionOutcome::Denied,
        Err(BrokerError::Dismissed) => PermissionOutcome::Dismissed,
        Err(err @ BrokerError::Runtime(_)) => {
            // No answer was given, so the previous choice stands.
            activation_warn!("Permission request failed: {}", err);
            PermissionOutcome::Dismissed
        }
    }
}

pub(crate) fn map_kind(kind: RegistrarKind) -> InjectionStrategy {
    match kind {
        RegistrarKind::Declarative => InjectionStrategy::DeclarativeRules,
        RegistrarKind::Message => InjectionStrategy::RuntimeMessage,
    }
}
