//! Activation core: pure state machine for the permission-gated integration toggle.
mod config;
mod effect;
mod msg;
mod patterns;
mod state;
mod update;
mod view_model;

pub use config::{
    ActivationConfig, InjectionDescriptor, InjectionStrategy, DECLARATIVE_CONTENT_PERMISSION,
    DEFAULT_INSTANCES, INSTANCES_KEY, REGISTRATION_HANDLE, SUPPORT_KEY,
};
pub use effect::{Effect, Notice, PermissionRequest};
pub use msg::{Msg, PermissionOutcome};
pub use patterns::{derive_patterns, validate_instance, InstanceError};
pub use state::{AppState, Ticket};
pub use update::update;
pub use view_model::AppViewModel;
