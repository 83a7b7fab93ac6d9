pub mod app;
pub mod commands;
pub mod logging;
