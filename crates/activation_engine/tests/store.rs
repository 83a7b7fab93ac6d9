use std::fs;

use activation_engine::{
    read_bool, read_strings, JsonFileStore, MemoryStore, SettingChange, SettingsStore, StoreError,
};
use serde_json::{json, Value};
use tempfile::TempDir;

#[test]
fn missing_file_starts_empty_and_is_created_on_set() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("settings.json");
    let store = JsonFileStore::open(&path).unwrap();

    assert_eq!(store.path(), path.as_path());
    assert!(!path.exists());
    assert_eq!(read_bool(&store, "supportInvidious").unwrap(), None);
    store.set("supportInvidious", json!(true)).unwrap();

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"supportInvidious": true}));
}

#[test]
fn unrelated_keys_survive_writes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, r#"{"skipKeybind": "Enter", "invidiousInstances": ["a.org"]}"#).unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(
        read_strings(&store, "invidiousInstances").unwrap(),
        Some(vec!["a.org".to_string()])
    );
    store
        .set("invidiousInstances", json!(["a.org", "b.net"]))
        .unwrap();

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get("skipKeybind"), Some(json!("Enter")));
    assert_eq!(
        read_strings(&reopened, "invidiousInstances").unwrap(),
        Some(vec!["a.org".to_string(), "b.net".to_string()])
    );
}

#[test]
fn non_object_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, "[1, 2]").unwrap();

    assert!(matches!(JsonFileStore::open(&path), Err(StoreError::NotAnObject)));
}

#[test]
fn wrong_type_is_reported_with_key() {
    let store = MemoryStore::new();
    store.set("supportInvidious", json!("yes")).unwrap();

    match read_bool(&store, "supportInvidious") {
        Err(StoreError::WrongType { key }) => assert_eq!(key, "supportInvidious"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn subscribers_see_each_write() {
    let store = MemoryStore::new();
    let changes = store.subscribe();

    store.set("supportInvidious", json!(false)).unwrap();
    store.set("invidiousInstances", json!([])).unwrap();

    let seen: Vec<SettingChange> = changes.try_iter().collect();
    assert_eq!(
        seen,
        vec![
            SettingChange {
                key: "supportInvidious".to_string(),
                value: json!(false),
            },
            SettingChange {
                key: "invidiousInstances".to_string(),
                value: json!([]),
            },
        ]
    );
}

#[test]
fn failed_write_leaves_memory_untouched() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("config");
    let store = JsonFileStore::open(dir.join("settings.json")).unwrap();
    // The settings directory can no longer be created.
    fs::write(&dir, "x").unwrap();

    assert!(store.set("supportInvidious", json!(true)).is_err());
    assert_eq!(store.get("supportInvidious"), None);
}
