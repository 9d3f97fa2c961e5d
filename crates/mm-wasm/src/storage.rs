//! `localStorage` backend for board persistence.

use mm_core::{KeyValueStore, StorageError};
use wasm_bindgen::JsValue;

/// The window's `localStorage`, or nothing when the browser denies it
/// (private mode, sandboxed iframes). Without storage every read is empty
/// and every write fails, so the board lives in memory only.
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            log::warn!("localStorage unavailable, boards will not be saved");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StorageError> {
        self.inner
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("no localStorage".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(describe(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| storage_error(key, value.len(), &e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(describe(&e)))
    }
}

fn describe(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

/// Browsers throw a `QuotaExceededError` DOMException when the origin's
/// storage is full; anything else is reported as unavailable.
fn storage_error(key: &str, needed: usize, e: &JsValue) -> StorageError {
    classify_failure(key, needed, &describe(e))
}

fn classify_failure(key: &str, needed: usize, message: &str) -> StorageError {
    if message.contains("QuotaExceeded") || message.contains("quota") {
        StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
        }
    } else {
        StorageError::Unavailable(message.to_string())
    }
}
