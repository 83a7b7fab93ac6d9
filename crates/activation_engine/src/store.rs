use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex, PoisonError};

use activation_logging::{activation_debug, activation_info};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::{SettingChange, StoreError};

/// Flat key/value settings shared with every other option of the extension.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Writes one key and notifies subscribers once it is stored.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    fn subscribe(&self) -> mpsc::Receiver<SettingChange>;
}

/// Reads a boolean setting; `None` when the key was never written.
pub fn read_bool(store: &dyn SettingsStore, key: &str) -> Result<Option<bool>, StoreError> {
    read_typed(store, key)
}

/// Reads a string list setting; `None` when the key was never written.
pub fn read_strings(
    store: &dyn SettingsStore,
    key: &str,
) -> Result<Option<Vec<String>>, StoreError> {
    read_typed(store, key)
}

fn read_typed<T: serde::de::DeserializeOwned>(
    store: &dyn SettingsStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|_| StoreError::WrongType {
                key: key.to_string(),
            }),
    }
}

#[derive(Default)]
struct Listeners {
    senders: Mutex<Vec<mpsc::Sender<SettingChange>>>,
}

impl Listeners {
    fn subscribe(&self) -> mpsc::Receiver<SettingChange> {
        let (tx, rx) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn notify(&self, key: &str, value: Value) {
        let change = SettingChange {
            key: key.to_string(),
            value,
        };
        // Dropped receivers are pruned here.
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(change.clone()).is_ok());
    }
}

/// Settings kept only in memory.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
    listeners: Listeners,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
            listeners: Listeners::default(),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        self.listeners.notify(key, value);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<SettingChange> {
        self.listeners.subscribe()
    }
}

/// Settings persisted as one JSON object, rewritten atomically on every set.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    listeners: Listeners,
}

impl JsonFileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => map,
                _ => return Err(StoreError::NotAnObject),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                activation_info!("No settings at {:?}; starting empty", path);
                Map::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
            listeners: Listeners::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let content = serde_json::to_string_pretty(values)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        {
            let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = values.clone();
            next.insert(key.to_string(), value.clone());
            // Memory only changes once the file is on disk.
            self.write_atomic(&next)?;
            *values = next;
        }
        activation_debug!("Stored {} in {:?}", key, self.path);
        self.listeners.notify(key, value);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<SettingChange> {
        self.listeners.subscribe()
    }
}
