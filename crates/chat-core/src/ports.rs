//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use chat_types::{
    Result,
    collection::Collection,
    message::Message,
    session::Session,
};

// ─── Remote Store Port ───────────────────────────────────────

/// Partial update for `update_session`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

/// Authoritative remote copy of every session, partitioned by identity.
#[async_trait(?Send)]
pub trait RemoteStorePort {
    /// All sessions plus the active pointer for `identity`
    async fn fetch_all(&self, identity: &str) -> Result<Collection>;

    async fn create_session(&self, identity: &str, session_id: &str, title: &str) -> Result<()>;

    async fn update_session(
        &self,
        identity: &str,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Session>;

    async fn delete_session(&self, identity: &str, session_id: &str) -> Result<()>;

    async fn clear_sessions(&self, identity: &str) -> Result<()>;

    async fn set_active(&self, identity: &str, session_id: Option<&str>) -> Result<()>;

    /// Returns the message as stored remotely
    async fn append_message(
        &self,
        identity: &str,
        session_id: &str,
        message: &Message,
    ) -> Result<Message>;

    /// Ask the assistant for a reply to `user_text`
    async fn send_chat_turn(&self, user_text: &str, session_id: &str) -> Result<String>;

    /// Cheap reachability check
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

// ─── Local Cache Port ────────────────────────────────────────

/// The fixed set of keys the client ever persists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Serialized session list
    Collection,
    ActiveSession,
    Identity,
    LastSynced,
    Config,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Collection => "chat:collection",
            CacheKey::ActiveSession => "chat:active",
            CacheKey::Identity => "chat:identity",
            CacheKey::LastSynced => "chat:last_synced",
            CacheKey::Config => "chat:config",
        }
    }

    pub fn all() -> &'static [CacheKey] {
        &[
            CacheKey::Collection,
            CacheKey::ActiveSession,
            CacheKey::Identity,
            CacheKey::LastSynced,
            CacheKey::Config,
        ]
    }
}

/// Local key-value persistence. Absent means "use the default".
#[async_trait(?Send)]
pub trait CachePort {
    async fn get(&self, key: CacheKey) -> Result<Option<String>>;

    async fn set(&self, key: CacheKey, value: &str) -> Result<()>;

    async fn remove(&self, key: CacheKey) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Ticker Port ─────────────────────────────────────────────

/// Timer used to pace the response renderer.
#[async_trait(?Send)]
pub trait TickerPort {
    async fn sleep(&self, ms: u64);
}
