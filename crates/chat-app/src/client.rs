//! JS-facing chat client.
//!
//! Local mutations are synchronous and return immediately; their remote side
//! effects run in the background and report failures through `drain_events`.
//! Operations that genuinely wait on the network return a `Promise`.

use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use chat_core::event_bus::EventBus;
use chat_core::identity::IdentityProvider;
use chat_core::ports::{CachePort, RemoteStorePort};
use chat_core::renderer::{RenderOutcome, ResponseRenderer};
use chat_core::sync::ChatSync;
use chat_core::turn::ChatTurn;
use chat_platform::storage::open_cache;
use chat_platform::{GlooTicker, HttpRemoteStore, WasmSpawner};
use chat_types::{
    ChatError,
    config::{ClientConfig, StorageBackendType},
    message::Role,
};

use crate::config_store::{restore_config, save_config};

#[wasm_bindgen]
pub struct ChatClient {
    config: ClientConfig,
    cache: Rc<dyn CachePort>,
    event_bus: EventBus,
    sync: ChatSync,
    turn: Rc<ChatTurn>,
}

#[wasm_bindgen]
impl ChatClient {
    /// Build and initialize a client.
    ///
    /// `config_json` overrides (and replaces) any saved configuration.
    /// Without it, the saved configuration is used, or the defaults.
    pub async fn connect(config_json: Option<String>) -> Result<ChatClient, JsValue> {
        let override_config = match config_json {
            Some(raw) => Some(
                serde_json::from_str::<ClientConfig>(&raw)
                    .map_err(|e| to_js(ChatError::Config(e.to_string())))?,
            ),
            None => None,
        };

        let backend = override_config
            .as_ref()
            .map(|c| c.storage.backend)
            .unwrap_or(StorageBackendType::Auto);
        let cache = open_cache(backend).await;

        let config = match override_config {
            Some(config) => {
                if let Err(e) = save_config(&cache, &config).await {
                    log::warn!("Failed to save config: {}", e);
                }
                config
            }
            None => restore_config(&cache).await.unwrap_or_default(),
        };

        let identity = IdentityProvider::new(cache.clone()).get_or_create().await;

        let remote: Rc<dyn RemoteStorePort> = Rc::new(HttpRemoteStore::new(&config.remote));

        let event_bus = EventBus::new();
        let sync = ChatSync::new(
            remote.clone(),
            cache.clone(),
            Rc::new(WasmSpawner),
            event_bus.clone(),
            config.title_max_chars,
        );
        let renderer = ResponseRenderer::new(
            sync.clone(),
            Rc::new(GlooTicker),
            event_bus.clone(),
            &config.renderer,
        );
        let turn = Rc::new(ChatTurn::new(
            sync.clone(),
            remote,
            renderer,
            config.renderer.apology_text.clone(),
        ));

        sync.init(identity).await;
        // Reported through drainEvents; nothing waits on it.
        let _ = sync.check_health();

        Ok(ChatClient {
            config,
            cache,
            event_bus,
            sync,
            turn,
        })
    }

    // ─── Reads ───────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.sync.snapshot())
    }

    pub fn summaries(&self) -> Result<JsValue, JsValue> {
        to_value(&self.sync.summaries())
    }

    #[wasm_bindgen(js_name = activeSession)]
    pub fn active_session(&self) -> Result<JsValue, JsValue> {
        to_value(&self.sync.active_session())
    }

    pub fn identity(&self) -> Option<String> {
        self.sync.identity()
    }

    #[wasm_bindgen(js_name = lastSynced)]
    pub fn last_synced(&self) -> Option<String> {
        self.sync.last_synced()
    }

    #[wasm_bindgen(js_name = cacheBackend)]
    pub fn cache_backend(&self) -> String {
        self.cache.backend_name().to_string()
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_value(&self.config)
    }

    /// Events since the last call, oldest first.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        to_value(&self.event_bus.drain())
    }

    // ─── Mutations ───────────────────────────────────────────

    #[wasm_bindgen(js_name = createSession)]
    pub fn create_session(&self) -> String {
        self.sync.create_session().value
    }

    /// False when `id` was the only session and was kept. A reply still
    /// streaming into a deleted session is cancelled.
    #[wasm_bindgen(js_name = deleteSession)]
    pub fn delete_session(&self, id: &str) -> Result<bool, JsValue> {
        let deleted = self.sync.delete_session(id).map_err(to_js)?.is_some();
        if deleted {
            self.turn.renderer().cancel_for(id);
        }
        Ok(deleted)
    }

    #[wasm_bindgen(js_name = clearAllSessions)]
    pub fn clear_all_sessions(&self) -> String {
        self.turn.renderer().cancel();
        self.sync.clear_all_sessions().value
    }

    #[wasm_bindgen(js_name = setActiveSession)]
    pub fn set_active_session(&self, id: &str) -> Result<(), JsValue> {
        self.turn.renderer().cancel();
        self.sync.set_active_session(id).map(drop).map_err(to_js)
    }

    #[wasm_bindgen(js_name = appendMessage)]
    pub fn append_message(&self, session_id: &str, is_user: bool, text: &str) -> Result<JsValue, JsValue> {
        let pending = self
            .sync
            .append_message(session_id, Role::from_is_user(is_user), text)
            .map_err(to_js)?;
        to_value(&pending.value)
    }

    #[wasm_bindgen(js_name = renameSession)]
    pub fn rename_session(&self, session_id: &str, title: &str) -> Result<(), JsValue> {
        self.sync
            .rename_session(session_id, title)
            .map(drop)
            .map_err(to_js)
    }

    // ─── Network-bound ───────────────────────────────────────

    /// Send `text` as the user and stream the reply. Resolves to the
    /// committed assistant message, or `null` if the stream was cancelled.
    pub fn send(&self, session_id: String, text: String) -> Promise {
        let turn = self.turn.clone();
        future_to_promise(async move {
            match turn.send(&session_id, &text).await.map_err(to_js)? {
                RenderOutcome::Committed(message) => to_value(&message),
                RenderOutcome::Cancelled => Ok(JsValue::NULL),
            }
        })
    }

    /// Reload from the remote store (or cache). Resolves to the collection.
    pub fn load(&self) -> Promise {
        let sync = self.sync.clone();
        future_to_promise(async move { to_value(&sync.load().await) })
    }

    /// Replace remote data with the local cache, then reload.
    #[wasm_bindgen(js_name = syncLocalToRemote)]
    pub fn sync_local_to_remote(&self) -> Promise {
        let sync = self.sync.clone();
        future_to_promise(async move {
            let collection = sync.sync_local_to_remote().await.map_err(to_js)?;
            to_value(&collection)
        })
    }

    /// Persist a new configuration; it applies from the next `connect`.
    #[wasm_bindgen(js_name = saveConfig)]
    pub fn save_config(&self, config_json: String) -> Promise {
        let cache = self.cache.clone();
        future_to_promise(async move {
            let config: ClientConfig = serde_json::from_str(&config_json)
                .map_err(|e| to_js(ChatError::Config(e.to_string())))?;
            save_config(&cache, &config).await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Forget this installation's identity. The next `connect` mints a new
    /// one and sees an empty remote store.
    #[wasm_bindgen(js_name = forgetIdentity)]
    pub fn forget_identity(&self) -> Promise {
        let cache = self.cache.clone();
        let sync = self.sync.clone();
        future_to_promise(async move {
            sync.shutdown();
            IdentityProvider::new(cache).clear().await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    // ─── Renderer ────────────────────────────────────────────

    #[wasm_bindgen(js_name = cancelStream)]
    pub fn cancel_stream(&self) {
        self.turn.renderer().cancel();
    }

    #[wasm_bindgen(js_name = isStreaming)]
    pub fn is_streaming(&self) -> bool {
        self.turn.renderer().is_streaming()
    }

    /// Partially revealed reply while streaming.
    #[wasm_bindgen(js_name = visibleText)]
    pub fn visible_text(&self) -> Option<String> {
        self.turn.renderer().visible_text()
    }

    pub fn shutdown(&self) {
        self.turn.renderer().cancel();
        self.sync.shutdown();
    }
}

fn to_js(e: ChatError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn to_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| to_js(ChatError::Serialization(e.to_string())))
}
