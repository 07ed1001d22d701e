//! `window.localStorage` cache backend.
//! Synchronous under the hood and capped at a few MB, but available in
//! contexts where IndexedDB is blocked (some private-browsing modes).

use async_trait::async_trait;
use web_sys::Storage;

use chat_core::ports::{CacheKey, CachePort};
use chat_types::{ChatError, Result};

pub struct LocalStorageCache {
    storage: Storage,
}

impl LocalStorageCache {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ChatError::Storage("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| ChatError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| ChatError::Storage("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl CachePort for LocalStorageCache {
    async fn get(&self, key: CacheKey) -> Result<Option<String>> {
        self.storage
            .get_item(key.as_str())
            .map_err(|e| ChatError::Storage(format!("{:?}", e)))
    }

    async fn set(&self, key: CacheKey, value: &str) -> Result<()> {
        // Throws QuotaExceededError when full
        self.storage
            .set_item(key.as_str(), value)
            .map_err(|e| ChatError::Storage(format!("{:?}", e)))
    }

    async fn remove(&self, key: CacheKey) -> Result<()> {
        self.storage
            .remove_item(key.as_str())
            .map_err(|e| ChatError::Storage(format!("{:?}", e)))
    }

    fn backend_name(&self) -> &str {
        "localstorage"
    }
}
