use std::io::{self, BufRead, Write};
use std::sync::Arc;

use activation_engine::{JsonFileStore, SettingsStore, SimulatedRuntime};
use activation_logging::{activation_info, activation_warn};
use anyhow::Context;

use super::commands::{parse_command, Command};
use crate::config::{AppConfig, Browser};
use crate::controller::{describe_notice, Controller};

/// Runs the line-driven options surface until `quit` or end of input.
pub fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let runtime = Arc::new(match config.browser {
        Browser::Chromium => SimulatedRuntime::declarative(config.prompt.into()),
        Browser::Firefox => SimulatedRuntime::message_based(config.prompt.into()),
    });
    let file_store = JsonFileStore::open(&config.settings_path)
        .with_context(|| format!("opening settings at {:?}", config.settings_path))?;
    activation_info!("Settings file: {}", file_store.path().display());
    let store: Arc<dyn SettingsStore> = Arc::new(file_store);

    let mut controller =
        Controller::start(runtime.clone(), store).context("reading stored settings")?;
    controller.settle().context("initial permission check")?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    render(&mut controller, &runtime, &mut stdout)?;

    for line in stdin.lock().lines() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                writeln!(stdout, "{err}")?;
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Status => {
                // Force a full redraw.
                print_status(&controller, &runtime, &mut stdout)?;
            }
            other => {
                if let Some(msg) = other.to_msg() {
                    activation_info!("Dispatching {:?}", msg);
                    controller.dispatch(msg);
                }
                if let Err(err) = controller.settle() {
                    activation_warn!("Engine stopped: {}", err);
                    break;
                }
                render(&mut controller, &runtime, &mut stdout)?;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

fn render(
    controller: &mut Controller,
    runtime: &SimulatedRuntime,
    out: &mut impl Write,
) -> io::Result<()> {
    for notice in controller.take_notices() {
        writeln!(out, "! {}", describe_notice(&notice))?;
    }
    if controller.consume_dirty() {
        print_status(controller, runtime, out)?;
    }
    Ok(())
}

fn print_status(
    controller: &Controller,
    runtime: &SimulatedRuntime,
    out: &mut impl Write,
) -> io::Result<()> {
    let view = controller.view();
    let mark = if view.checkbox_checked { "x" } else { " " };
    writeln!(out, "[{mark}] Alternate frontend support")?;
    writeln!(out, "    instances: {}", view.instances.join(", "))?;
    writeln!(
        out,
        "    patterns: {}  active registrations: {}",
        view.patterns.len(),
        runtime.active_registrations()
    )?;
    Ok(())
}
