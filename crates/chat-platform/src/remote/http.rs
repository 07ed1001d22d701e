//! Chat backend adapter.
//!
//! Implements `RemoteStorePort` over the backend's REST API using browser
//! `fetch()` via gloo-net. Every request is raced against a timer; a request
//! that loses the race surfaces as `ChatError::Timeout`.

use async_trait::async_trait;
use futures::future::{self, Either};
use gloo_net::http::{Request, RequestBuilder, Response};
use gloo_timers::future::TimeoutFuture;
use serde::Serialize;

use chat_core::ports::{RemoteStorePort, SessionPatch};
use chat_types::{
    ChatError, Result,
    collection::Collection,
    config::RemoteConfig,
    message::Message,
    session::Session,
};
use super::wire::{self, ActiveChatBody, ChatTurnBody, CreateChatBody, UpdateChatBody, WireChat, WireMessage};

pub struct HttpRemoteStore {
    base_url: String,
    timeout_ms: u64,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&String::from(js_sys::encode_uri_component(segment)));
        }
        url
    }

    fn with_json<T: Serialize>(&self, builder: RequestBuilder, body: &T) -> Result<Request> {
        builder
            .header("Content-Type", "application/json")
            .json(body)
            .map_err(|e| ChatError::Serialization(e.to_string()))
    }

    fn bare(&self, builder: RequestBuilder) -> Result<Request> {
        builder
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))
    }

    /// Send, enforce the timeout, and map non-2xx to `ChatError::Remote`.
    /// Returns the response body as text.
    async fn execute(&self, label: &str, request: Request) -> Result<String> {
        log::debug!("→ {}", label);
        let send = Box::pin(request.send());
        let timer = TimeoutFuture::new(self.timeout_ms.min(u32::MAX as u64) as u32);

        let response: Response = match future::select(send, timer).await {
            Either::Left((result, _)) => result.map_err(|e| ChatError::Network(e.to_string()))?,
            Either::Right(_) => {
                log::warn!("{} timed out after {}ms", label, self.timeout_ms);
                return Err(ChatError::Timeout(self.timeout_ms));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        log::debug!("← {} HTTP {}", label, status);
        if !response.ok() {
            return Err(ChatError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl RemoteStorePort for HttpRemoteStore {
    async fn fetch_all(&self, identity: &str) -> Result<Collection> {
        let request = self.bare(Request::get(&self.url(&["chats", identity])))?;
        let body = self.execute("fetch-all", request).await?;
        wire::parse_collection(&body)
    }

    async fn create_session(&self, identity: &str, session_id: &str, title: &str) -> Result<()> {
        let request = self.with_json(
            Request::post(&self.url(&["chats", identity])),
            &CreateChatBody { id: session_id, title },
        )?;
        self.execute("create-session", request).await?;
        Ok(())
    }

    async fn update_session(
        &self,
        identity: &str,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Session> {
        let body = UpdateChatBody {
            title: patch.title.clone(),
            messages: patch
                .messages
                .as_ref()
                .map(|msgs| msgs.iter().map(WireMessage::from).collect()),
        };
        let request = self.with_json(
            Request::put(&self.url(&["chats", identity, session_id])),
            &body,
        )?;
        let raw = self.execute("update-session", request).await?;

        match wire::parse_echo::<WireChat>(&raw) {
            Some(chat) => Ok(chat.into()),
            None => {
                // Acknowledged without an echo; rebuild from the patch.
                let mut session = Session::new(session_id.to_string());
                if let Some(title) = patch.title {
                    session.title = title;
                }
                if let Some(messages) = patch.messages {
                    session.messages = messages;
                }
                Ok(session)
            }
        }
    }

    async fn delete_session(&self, identity: &str, session_id: &str) -> Result<()> {
        let request = self.bare(Request::delete(&self.url(&["chats", identity, session_id])))?;
        self.execute("delete-session", request).await?;
        Ok(())
    }

    async fn clear_sessions(&self, identity: &str) -> Result<()> {
        let request = self.bare(Request::delete(&self.url(&["chats", identity])))?;
        self.execute("clear-sessions", request).await?;
        Ok(())
    }

    async fn set_active(&self, identity: &str, session_id: Option<&str>) -> Result<()> {
        let request = self.with_json(
            Request::put(&self.url(&["chats", identity, "active"])),
            &ActiveChatBody { chat_id: session_id },
        )?;
        self.execute("set-active", request).await?;
        Ok(())
    }

    async fn append_message(
        &self,
        identity: &str,
        session_id: &str,
        message: &Message,
    ) -> Result<Message> {
        let request = self.with_json(
            Request::post(&self.url(&["chats", identity, session_id, "messages"])),
            &WireMessage::from(message),
        )?;
        let raw = self.execute("append-message", request).await?;
        Ok(wire::parse_echo::<WireMessage>(&raw)
            .map(Message::from)
            .unwrap_or_else(|| message.clone()))
    }

    async fn send_chat_turn(&self, user_text: &str, session_id: &str) -> Result<String> {
        let request = self.with_json(
            Request::post(&self.url(&["chat"])),
            &ChatTurnBody { message: user_text, chat_id: session_id },
        )?;
        let raw = self.execute("chat-turn", request).await?;
        wire::parse_reply(&raw)
    }

    async fn health(&self) -> Result<()> {
        let request = self.bare(Request::get(&format!("{}/", self.base_url)))?;
        self.execute("health", request).await?;
        Ok(())
    }
}
