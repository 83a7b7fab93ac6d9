use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use activation_engine::PromptAnswer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "activation.ron";

/// Which browser family the simulated runtime behaves like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    /// Offers declarative content rules.
    Chromium,
    /// Registers content scripts from the background page.
    Firefox,
}

/// Standing answer of the simulated permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptChoice {
    Grant,
    Deny,
    Dismiss,
}

impl From<PromptChoice> for PromptAnswer {
    fn from(choice: PromptChoice) -> Self {
        match choice {
            PromptChoice::Grant => PromptAnswer::Grant,
            PromptChoice::Deny => PromptAnswer::Deny,
            PromptChoice::Dismiss => PromptAnswer::Dismiss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings_path: PathBuf,
    pub log_destination: LogDestination,
    pub log_path: PathBuf,
    pub log_level: String,
    pub browser: Browser,
    pub prompt: PromptChoice,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("settings.json"),
            log_destination: LogDestination::File,
            log_path: PathBuf::from("./activation.log"),
            log_level: "info".to_string(),
            browser: Browser::Chromium,
            prompt: PromptChoice::Grant,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Loads the app config; `Ok(None)` when the file does not exist.
pub fn load_config(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(load_config(&temp.path().join("absent.ron")).unwrap().is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activation.ron");
        fs::write(&path, "(browser: Firefox, prompt: Deny)").unwrap();

        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.browser, Browser::Firefox);
        assert_eq!(config.prompt, PromptChoice::Deny);
        assert_eq!(config.settings_path, AppConfig::default().settings_path);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activation.ron");
        fs::write(&path, "(browser: Netscape)").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
