use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// Host patterns and named capabilities, shaped like the runtime's permission object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PermissionSet {
    pub origins: Vec<String>,
    pub permissions: Vec<String>,
}

/// Scripts and styles attached to matching pages, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBundle {
    pub js: Vec<String>,
    pub css: Vec<String>,
    pub all_frames: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrarKind {
    Declarative,
    Message,
}

impl fmt::Display for RegistrarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrarKind::Declarative => write!(f, "declarative rules"),
            RegistrarKind::Message => write!(f, "runtime messages"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("permission prompt dismissed without an answer")]
    Dismissed,
    #[error("permission call failed: {0}")]
    Runtime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrarError {
    #[error("runtime call failed: {0}")]
    Runtime(String),
    #[error("could not encode registration message: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings file must hold a json object")]
    NotAnObject,
    #[error("setting {key} has unexpected type")]
    WrongType { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine worker is no longer running")]
    Disconnected,
}

/// Notification fired after a setting was written.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub value: serde_json::Value,
}

/// Result messages produced by the engine worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PermissionsHeld {
        ticket: u64,
        held: bool,
    },
    PermissionDecided {
        ticket: u64,
        result: Result<bool, BrokerError>,
    },
}
