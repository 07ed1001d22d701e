use serde::{Deserialize, Serialize};

/// Where `Load` got its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadSource {
    Remote,
    Cache,
    /// Neither source had anything; a default session was synthesized
    Default,
}

/// Events emitted by the sync engine and the renderer.
/// The presentation layer drains these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// In-memory collection finished loading
    Loaded { source: LoadSource },

    /// Any local mutation of the collection
    CollectionChanged,

    /// A best-effort remote call failed; local state was kept
    RemoteFailed { operation: String, message: String },

    /// Renderer began revealing a reply
    StreamStarted { session_id: String },

    /// Visible prefix advanced by one character
    StreamFrame { session_id: String, visible: String },

    /// Full reply appended as an assistant message
    StreamCommitted { session_id: String, message_id: String },

    /// Stream interrupted; nothing was committed
    StreamCancelled { session_id: String },
}
