use std::path::PathBuf;

use activation_app::platform::{app, logging};
use activation_app::{load_config, AppConfig, DEFAULT_CONFIG_FILE};
use activation_logging::{activation_info, activation_warn, parse_level};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let (config, problem) = match load_config(&config_path) {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (AppConfig::default(), Some(err)),
    };

    logging::initialize(
        config.log_destination,
        parse_level(&config.log_level),
        &config.log_path,
    );
    if let Some(err) = problem {
        activation_warn!("Using default config: {}", err);
    }
    activation_info!("Starting activation app with {:?}", config);

    app::run_app(config)
}
