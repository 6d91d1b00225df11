//! Storage boundary: the cross-device sync store and per-device local storage.
//!
//! The sync store holds the locker configuration under three keys:
//!
//! | key              | type   | written by                 |
//! |------------------|--------|----------------------------|
//! | `lockerActive`   | bool   | setup surface checkbox     |
//! | `unlockMethod`   | string | setup surface save         |
//! | `credentialHash` | hex    | setup surface save         |
//!
//! Local storage only holds `fingerprintRegistered`, which is deliberately not
//! synced: a second device inherits a fingerprint lock it never registered.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::method::UnlockMethod;

/// Sync-store key for the activation flag.
pub const KEY_ACTIVE: &str = "lockerActive";
/// Sync-store key for the method name.
pub const KEY_METHOD: &str = "unlockMethod";
/// Sync-store key for the credential digest.
pub const KEY_DIGEST: &str = "credentialHash";
/// Local-storage key for the fingerprint registration flag.
pub const KEY_FINGERPRINT_REGISTERED: &str = "fingerprintRegistered";

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Asynchronous key/value store with `chrome.storage` semantics.
///
/// `get` returns only the requested keys that exist; `set` merges.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// Synchronous per-device string storage with `localStorage` semantics.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        (**self).get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        (**self).set(items).await
    }
}

impl<T: LocalStorage + ?Sized> LocalStorage for std::sync::Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }
}

/// Locker configuration as read from the sync store.
///
/// Every field is optional on the wire; values of the wrong JSON type read as
/// absent. `method` is kept as the raw stored string so unknown names survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockerConfig {
    pub active: bool,
    pub method: Option<String>,
    pub digest_hex: Option<String>,
}

impl LockerConfig {
    /// Build from a `get` result holding any subset of the three keys.
    #[must_use]
    pub fn from_items(items: &Map<String, Value>) -> Self {
        Self {
            active: items.get(KEY_ACTIVE).and_then(Value::as_bool).unwrap_or(false),
            method: non_empty_str(items.get(KEY_METHOD)),
            digest_hex: non_empty_str(items.get(KEY_DIGEST)),
        }
    }

    /// Whether the lock engages: active, with a method and a digest present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.active && self.method.is_some() && self.digest_hex.is_some()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Typed view over the sync store.
#[derive(Debug, Clone)]
pub struct SyncSettings<K> {
    store: K,
}

impl<K: KeyValueStore> SyncSettings<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Read all three configuration keys in one call.
    pub async fn load_config(&self) -> Result<LockerConfig> {
        let items = self.store.get(&[KEY_ACTIVE, KEY_METHOD, KEY_DIGEST]).await?;
        Ok(LockerConfig::from_items(&items))
    }

    /// Read the activation flag; absent reads as `false`.
    pub async fn load_active(&self) -> Result<bool> {
        let items = self.store.get(&[KEY_ACTIVE]).await?;
        Ok(LockerConfig::from_items(&items).active)
    }

    /// Read the stored digest.
    pub async fn load_digest(&self) -> Result<Option<String>> {
        let items = self.store.get(&[KEY_DIGEST]).await?;
        Ok(LockerConfig::from_items(&items).digest_hex)
    }

    /// Persist method and digest together. Leaves `lockerActive` untouched.
    pub async fn save_credential(&self, method: UnlockMethod, digest_hex: &str) -> Result<()> {
        let mut items = Map::new();
        items.insert(KEY_DIGEST.to_string(), Value::from(digest_hex));
        items.insert(KEY_METHOD.to_string(), Value::from(method.as_str()));
        self.store.set(items).await
    }

    /// Persist the activation flag alone.
    pub async fn set_active(&self, active: bool) -> Result<()> {
        let mut items = Map::new();
        items.insert(KEY_ACTIVE.to_string(), Value::from(active));
        self.store.set(items).await
    }

    pub fn store(&self) -> &K {
        &self.store
    }
}

/// Whether this device has completed fingerprint registration.
pub fn fingerprint_registered<L: LocalStorage + ?Sized>(local: &L) -> Result<bool> {
    Ok(local.get_item(KEY_FINGERPRINT_REGISTERED)?.is_some())
}

/// Record a successful fingerprint registration. There is no way to clear it.
pub fn mark_fingerprint_registered<L: LocalStorage + ?Sized>(local: &L) -> Result<()> {
    local.set_item(KEY_FINGERPRINT_REGISTERED, "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn items(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_config_complete() {
        let cfg = LockerConfig::from_items(&items(json!({
            "lockerActive": true,
            "unlockMethod": "pin",
            "credentialHash": "ab",
        })));
        assert!(cfg.is_complete());
        assert_eq!(cfg.method.as_deref(), Some("pin"));
    }

    #[test]
    fn test_config_fail_open() {
        let cases = [
            json!({ "unlockMethod": "pin", "credentialHash": "ab" }),
            json!({ "lockerActive": false, "unlockMethod": "pin", "credentialHash": "ab" }),
            json!({ "lockerActive": true, "credentialHash": "ab" }),
            json!({ "lockerActive": true, "unlockMethod": "pin" }),
            json!({ "lockerActive": true, "unlockMethod": "", "credentialHash": "ab" }),
            json!({ "lockerActive": true, "unlockMethod": "pin", "credentialHash": "" }),
            json!({ "lockerActive": "true", "unlockMethod": "pin", "credentialHash": "ab" }),
            json!({ "lockerActive": true, "unlockMethod": 7, "credentialHash": "ab" }),
        ];
        for case in cases {
            assert!(!LockerConfig::from_items(&items(case.clone())).is_complete(), "{case}");
        }
    }

    #[tokio::test]
    async fn test_save_credential_keeps_active() {
        let store = Arc::new(MemoryStore::new());
        let settings = SyncSettings::new(store.clone());

        settings.set_active(true).await.unwrap();
        settings.save_credential(UnlockMethod::Pattern, "cafe").await.unwrap();

        let cfg = settings.load_config().await.unwrap();
        assert!(cfg.active);
        assert_eq!(cfg.method.as_deref(), Some("pattern"));
        assert_eq!(cfg.digest_hex.as_deref(), Some("cafe"));
    }

    #[tokio::test]
    async fn test_set_active_keeps_credential() {
        let settings = SyncSettings::new(MemoryStore::new());
        settings.save_credential(UnlockMethod::Pin, "beef").await.unwrap();
        settings.set_active(true).await.unwrap();
        settings.set_active(false).await.unwrap();

        let cfg = settings.load_config().await.unwrap();
        assert!(!cfg.active);
        assert_eq!(settings.load_digest().await.unwrap().as_deref(), Some("beef"));
    }

    #[test]
    fn test_fingerprint_flag() {
        let local = MemoryStore::new();
        assert!(!fingerprint_registered(&local).unwrap());
        mark_fingerprint_registered(&local).unwrap();
        assert!(fingerprint_registered(&local).unwrap());
        assert_eq!(
            local.get_item(KEY_FINGERPRINT_REGISTERED).unwrap().as_deref(),
            Some("true")
        );
    }
}
