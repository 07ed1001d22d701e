//! IndexedDB cache backend.
//! Persistent across page reloads. Values are stored as plain JS strings
//! in a single key-value object store.

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

use chat_core::ports::{CacheKey, CachePort};
use chat_types::{ChatError, Result};

const DB_NAME: &str = "chat_cache";
const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

pub struct IndexedDbCache {
    db: IdbDatabase,
}

impl IndexedDbCache {
    /// Open (or create) the cache database.
    pub async fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ChatError::Storage("No window object".to_string()))?;

        let idb_factory = window
            .indexed_db()
            .map_err(storage_err)?
            .ok_or_else(|| ChatError::Storage("IndexedDB not available".to_string()))?;

        let open_req = idb_factory
            .open_with_u32(DB_NAME, DB_VERSION)
            .map_err(storage_err)?;

        // First open (or version bump): create the object store
        let open_req_clone = open_req.clone();
        let onupgrade = Closure::once(move |_event: web_sys::Event| {
            let db = open_req_clone
                .result()
                .ok()
                .and_then(|r| r.dyn_into::<IdbDatabase>().ok());
            match db {
                Some(db) => {
                    if let Err(e) = db.create_object_store(STORE_NAME) {
                        log::warn!("Could not create object store: {:?}", e);
                    }
                }
                None => log::error!("IndexedDB upgrade fired without a database"),
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db: IdbDatabase = JsFuture::from(idb_request_to_promise(&open_req))
            .await
            .map_err(storage_err)?
            .dyn_into()
            .map_err(storage_err)?;

        Ok(Self { db })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        let tx = self
            .db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(storage_err)?;
        tx.object_store(STORE_NAME).map_err(storage_err)
    }
}

#[async_trait(?Send)]
impl CachePort for IndexedDbCache {
    async fn get(&self, key: CacheKey) -> Result<Option<String>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let req = store
            .get(&JsValue::from_str(key.as_str()))
            .map_err(storage_err)?;
        let result = JsFuture::from(idb_request_to_promise(&req))
            .await
            .map_err(storage_err)?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        result
            .as_string()
            .map(Some)
            .ok_or_else(|| ChatError::Storage(format!("Non-string value under {}", key.as_str())))
    }

    async fn set(&self, key: CacheKey, value: &str) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let req = store
            .put_with_key(&JsValue::from_str(value), &JsValue::from_str(key.as_str()))
            .map_err(storage_err)?;
        JsFuture::from(idb_request_to_promise(&req))
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn remove(&self, key: CacheKey) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let req = store
            .delete(&JsValue::from_str(key.as_str()))
            .map_err(storage_err)?;
        JsFuture::from(idb_request_to_promise(&req))
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

fn storage_err(e: JsValue) -> ChatError {
    ChatError::Storage(format!("{:?}", e))
}

/// Wrap the callback-based IDB request in a Promise for `JsFuture`.
fn idb_request_to_promise(req: &IdbRequest) -> js_sys::Promise {
    let req_for_success = req.clone();
    let req_for_callbacks = req.clone();

    js_sys::Promise::new(&mut move |resolve, reject| {
        let req_inner = req_for_success.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let _ = resolve.call1(
                &JsValue::NULL,
                &req_inner.result().unwrap_or(JsValue::UNDEFINED),
            );
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IDB request failed"));
        });
        req_for_callbacks.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        req_for_callbacks.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    })
}
