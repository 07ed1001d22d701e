//! JSON shapes spoken by the chat backend.
//!
//! The backend keys messages by `isUser` and uses camelCase throughout.
//! Timestamps arrive either as RFC 3339 strings or as epoch milliseconds,
//! depending on which client version wrote them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use chat_types::{
    ChatError, Result,
    collection::Collection,
    ids::{millis_to_rfc3339, new_id, now_rfc3339},
    message::{Message, Role},
    session::{Session, DEFAULT_TITLE},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTime {
    Text(String),
    Millis(f64),
}

impl WireTime {
    pub fn to_rfc3339(&self) -> Option<String> {
        match self {
            WireTime::Text(s) if !s.is_empty() => Some(s.clone()),
            WireTime::Text(_) => None,
            WireTime::Millis(ms) => millis_to_rfc3339(*ms as i64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<WireTime>,
}

impl From<&Message> for WireMessage {
    /// Outgoing form. The backend assigns its own id.
    fn from(msg: &Message) -> Self {
        Self {
            id: None,
            text: msg.text.clone(),
            is_user: msg.role.is_user(),
            timestamp: Some(WireTime::Text(msg.timestamp.clone())),
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Message {
            id: wire.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
            role: Role::from_is_user(wire.is_user),
            text: wire.text,
            timestamp: wire
                .timestamp
                .and_then(|t| t.to_rfc3339())
                .unwrap_or_else(now_rfc3339),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChat {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub created_at: Option<WireTime>,
    #[serde(default)]
    pub updated_at: Option<WireTime>,
}

impl From<WireChat> for Session {
    fn from(wire: WireChat) -> Self {
        let messages: Vec<Message> = wire.messages.into_iter().map(Message::from).collect();
        let created_at = wire
            .created_at
            .and_then(|t| t.to_rfc3339())
            .unwrap_or_else(now_rfc3339);
        // Older records carry no updatedAt; the newest message stands in.
        let updated_at = wire
            .updated_at
            .and_then(|t| t.to_rfc3339())
            .or_else(|| messages.last().map(|m| m.timestamp.clone()))
            .unwrap_or_else(|| created_at.clone());
        Session {
            id: wire.id,
            title: wire
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            messages,
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCollection {
    #[serde(default)]
    pub chats: Vec<WireChat>,
    #[serde(default)]
    pub active_chat: Option<String>,
}

impl From<WireCollection> for Collection {
    fn from(wire: WireCollection) -> Self {
        Collection::new(
            wire.chats.into_iter().map(Session::from).collect(),
            wire.active_chat,
        )
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

// ─── Request bodies ──────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateChatBody<'a> {
    pub id: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveChatBody<'a> {
    pub chat_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct UpdateChatBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<WireMessage>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnBody<'a> {
    pub message: &'a str,
    pub chat_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatTurnReply {
    #[serde(default)]
    reply: String,
}

// ─── Response parsing ────────────────────────────────────

/// `GET /chats/{identity}` → `{ data: { chats, activeChat } }`
pub fn parse_collection(raw: &str) -> Result<Collection> {
    let envelope: Envelope<WireCollection> = serde_json::from_str(raw)
        .map_err(|e| ChatError::Remote(format!("Malformed chat list: {}", e)))?;
    Ok(envelope.data.into())
}

/// `POST /chat` → `{ reply }`. A missing reply reads as empty.
pub fn parse_reply(raw: &str) -> Result<String> {
    let reply: ChatTurnReply = serde_json::from_str(raw)
        .map_err(|e| ChatError::Remote(format!("Malformed chat reply: {}", e)))?;
    Ok(reply.reply)
}

/// Body echoed back by a mutation, bare or wrapped in `{ data }`.
/// `None` when the backend only acknowledged.
pub fn parse_echo<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<Envelope<T>>(raw)
        .map(|e| e.data)
        .or_else(|_| serde_json::from_str::<T>(raw))
        .ok()
}
