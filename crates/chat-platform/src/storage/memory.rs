//! In-memory cache backend.
//! Used when no browser storage is reachable; lost on reload.

use std::cell::RefCell;
use std::collections::HashMap;
use async_trait::async_trait;
use chat_core::ports::{CacheKey, CachePort};
use chat_types::Result;

#[derive(Default)]
pub struct MemoryCache {
    data: RefCell<HashMap<CacheKey, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl CachePort for MemoryCache {
    async fn get(&self, key: CacheKey) -> Result<Option<String>> {
        Ok(self.data.borrow().get(&key).cloned())
    }

    async fn set(&self, key: CacheKey, value: &str) -> Result<()> {
        self.data.borrow_mut().insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: CacheKey) -> Result<()> {
        self.data.borrow_mut().remove(&key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
