//! Typed view of the local cache.
//!
//! The session list and the active pointer live under separate keys, so a
//! cache written by an older client with only one of them still loads.

use std::rc::Rc;
use chat_types::{
    Result,
    collection::Collection,
    session::Session,
};
use crate::ports::{CacheKey, CachePort};

#[derive(Clone)]
pub struct CacheMirror {
    cache: Rc<dyn CachePort>,
}

impl CacheMirror {
    pub fn new(cache: Rc<dyn CachePort>) -> Self {
        Self { cache }
    }

    /// Last mirrored collection. `None` if absent or holding no sessions.
    pub async fn read_collection(&self) -> Result<Option<Collection>> {
        let Some(raw) = self.cache.get(CacheKey::Collection).await? else {
            return Ok(None);
        };
        let sessions: Vec<Session> = serde_json::from_str(&raw)?;
        if sessions.is_empty() {
            return Ok(None);
        }
        let active = self.cache.get(CacheKey::ActiveSession).await?;
        Ok(Some(Collection::new(sessions, active)))
    }

    pub async fn write_collection(&self, collection: &Collection) -> Result<()> {
        let sessions = serde_json::to_string(&collection.sessions)?;
        self.cache.set(CacheKey::Collection, &sessions).await?;
        match &collection.active {
            Some(id) => self.cache.set(CacheKey::ActiveSession, id).await,
            None => self.cache.remove(CacheKey::ActiveSession).await,
        }
    }

    pub async fn read_last_synced(&self) -> Result<Option<String>> {
        self.cache.get(CacheKey::LastSynced).await
    }

    pub async fn write_last_synced(&self, timestamp: &str) -> Result<()> {
        self.cache.set(CacheKey::LastSynced, timestamp).await
    }
}
