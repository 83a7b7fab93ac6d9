use crate::{InjectionDescriptor, InstanceError, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckPermissions {
        ticket: Ticket,
        request: PermissionRequest,
    },
    RequestPermissions {
        ticket: Ticket,
        request: PermissionRequest,
    },
    RemovePermissions { origins: Vec<String> },
    Register {
        handle: String,
        patterns: Vec<String>,
        descriptor: InjectionDescriptor,
    },
    Unregister { handle: String },
    PersistFlag(bool),
    PersistInstances(Vec<String>),
    Notify(Notice),
}

/// Host patterns plus named capabilities, as one permission set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionRequest {
    pub origins: Vec<String>,
    pub permissions: Vec<String>,
}

/// User-facing messages raised by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    InstanceRejected(InstanceError),
    PermissionDenied,
    /// The stored flag disagreed with the permissions actually held.
    FlagCorrected { enabled: bool },
}
