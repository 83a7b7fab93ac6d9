//! Activation app: wires the core state machine to the engine and exposes a
//! line-driven options surface.
pub mod config;
mod controller;
mod effects;
pub mod platform;

pub use config::{load_config, AppConfig, Browser, ConfigError, PromptChoice, DEFAULT_CONFIG_FILE};
pub use controller::{describe_notice, Controller};
