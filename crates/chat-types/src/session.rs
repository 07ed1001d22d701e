use serde::{Deserialize, Serialize};
use crate::ids::{new_id, now_rfc3339};
use crate::message::{Message, Role};

pub const DEFAULT_TITLE: &str = "New Chat";
pub const TITLE_ELLIPSIS: &str = "…";
pub const DEFAULT_TITLE_MAX_CHARS: usize = 30;

/// One conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = now_rfc3339();
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Fresh empty session with a newly minted id.
    pub fn fresh() -> Self {
        Self::new(new_id())
    }

    /// Append a message, deriving the title when it is the first one and
    /// user-authored. Later appends never touch the title.
    pub fn push_message(&mut self, message: Message, title_max_chars: usize) {
        if self.messages.is_empty() && message.role == Role::User {
            self.title = derive_title(&message.text, title_max_chars);
        }
        self.messages.push(message);
        self.touch();
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// First `max_chars` characters of `text`, with an ellipsis if anything was cut.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TITLE_ELLIPSIS),
        None => text.to_string(),
    }
}

/// Summary of a session for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub updated_at: String,
    pub message_count: usize,
}
