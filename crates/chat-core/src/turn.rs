//! One user → assistant exchange.
//!
//! The user message is committed optimistically, the assistant reply is
//! fetched, and the reply is handed to the renderer. A failed or empty reply
//! is replaced by a fixed apology so the user always gets an assistant turn.

use std::rc::Rc;

use chat_types::{ChatError, Result, message::Role};
use crate::ports::RemoteStorePort;
use crate::renderer::{RenderOutcome, ResponseRenderer};
use crate::sync::ChatSync;

pub struct ChatTurn {
    sync: ChatSync,
    remote: Rc<dyn RemoteStorePort>,
    renderer: ResponseRenderer,
    apology_text: String,
}

impl ChatTurn {
    pub fn new(
        sync: ChatSync,
        remote: Rc<dyn RemoteStorePort>,
        renderer: ResponseRenderer,
        apology_text: impl Into<String>,
    ) -> Self {
        Self {
            sync,
            remote,
            renderer,
            apology_text: apology_text.into(),
        }
    }

    pub fn renderer(&self) -> &ResponseRenderer {
        &self.renderer
    }

    pub async fn send(&self, session_id: &str, text: &str) -> Result<RenderOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        // Local commit first; its remote append runs on the session lane.
        self.sync.append_message(session_id, Role::User, text)?;

        let reply = match self.remote.send_chat_turn(text, session_id).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                log::warn!("Assistant returned an empty reply for {}", session_id);
                self.apology_text.clone()
            }
            Err(e) => {
                log::error!("Failed to get assistant reply for {}: {}", session_id, e);
                self.apology_text.clone()
            }
        };

        self.renderer.stream(session_id, reply).await
    }
}
