use serde::{Deserialize, Serialize};
use crate::session::DEFAULT_TITLE_MAX_CHARS;

/// Top-level client configuration. Missing fields take their defaults, so a
/// partial override such as `{"remote":{"base_url":"..."}}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub remote: RemoteConfig,
    pub renderer: RendererConfig,
    pub storage: StorageConfig,
    pub title_max_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            renderer: RendererConfig::default(),
            storage: StorageConfig::default(),
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Requests running longer than this fail with `ChatError::Timeout`
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Delay between revealed characters
    pub tick_ms: u64,
    /// Streamed in place of the assistant reply when the chat turn fails
    pub apology_text: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            apology_text: DEFAULT_APOLOGY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    LocalStorage,
    IndexedDb,
}

impl StorageBackendType {
    pub fn label(&self) -> &str {
        match self {
            StorageBackendType::Auto => "Auto",
            StorageBackendType::Memory => "Memory",
            StorageBackendType::LocalStorage => "localStorage",
            StorageBackendType::IndexedDb => "IndexedDB",
        }
    }
}

const DEFAULT_BASE_URL: &str = "https://zeni-backend.up.railway.app";

pub const DEFAULT_APOLOGY: &str = "Sorry, I'm having trouble connecting right now. \
Please check if the backend is running and try again.";
