//! Activation engine: permission broker, injection registrars, settings store
//! and the ordered worker that executes them.
mod broker;
mod engine;
pub mod host;
mod registrar;
mod simulated;
mod store;
mod types;

pub use broker::PermissionBroker;
pub use engine::{EngineHandle, EngineParts};
pub use registrar::{
    build_rule, select_registrar, DeclarativeRegistrar, FileRef, InjectionRegistrar,
    MessageRegistrar, ScriptMessage,
};
pub use simulated::{MessageRegistration, PromptAnswer, SimulatedRuntime};
pub use store::{read_bool, read_strings, JsonFileStore, MemoryStore, SettingsStore};
pub use types::{
    BrokerError, EngineError, EngineEvent, PermissionSet, RegistrarError, RegistrarKind,
    ScriptBundle, SettingChange, StoreError,
};
