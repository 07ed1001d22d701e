use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No data available in remote store or local cache")]
    DataUnavailable,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sync engine not initialized")]
    NotInitialized,

    #[error("Cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// Connectivity-class failures: these degrade to local-only mode
    /// instead of reaching the user.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_) | ChatError::Timeout(_) | ChatError::Remote(_)
        )
    }

    /// The caller named a session that no longer exists.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ChatError::SessionNotFound(_))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
