//! JSON file store backend.
//!
//! Each store is a single JSON object on disk. Writes rewrite the whole file;
//! there is no locking, matching the non-transactional sync store it stands in
//! for.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{KeyValueStore, LocalStorage, Result};
use crate::error::StoreError;

/// Store backed by one JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open (lazily) the store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject),
        }
    }

    fn write(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn merge(&self, items: Map<String, Value>) -> Result<()> {
        let mut values = self.read()?;
        values.extend(items);
        self.write(&values)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut values = self.read()?;
        Ok(keys
            .iter()
            .filter_map(|k| values.remove(*k).map(|v| ((*k).to_string(), v)))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.merge(items)
    }
}

impl LocalStorage for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        // localStorage only holds strings; anything else reads as its JSON text.
        Ok(self.read()?.remove(key).map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = Map::new();
        items.insert(key.to_string(), Value::from(value));
        self.merge(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("sync.json"));
        assert!(store.get(&["lockerActive"]).await.unwrap().is_empty());
        assert!(store.get_item("fingerprintRegistered").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roundtrip_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sync.json");

        let mut items = Map::new();
        items.insert("lockerActive".into(), json!(true));
        JsonFileStore::new(&path).set(items).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        let got = reopened.get(&["lockerActive", "unlockMethod"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["lockerActive"], json!(true));
    }

    #[test]
    fn test_local_items() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("local.json"));
        store.set_item("fingerprintRegistered", "true").unwrap();
        assert_eq!(
            store.get_item("fingerprintRegistered").unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_not_an_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.json");
        fs::write(&path, "[1, 2]").unwrap();
        let err = JsonFileStore::new(&path).get(&["a"]).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject));
    }
}
