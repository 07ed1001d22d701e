//! Conversation state synchronization engine.
//!
//! Owns the in-memory [`Collection`]. Every mutation is applied locally and
//! synchronously first (optimistic), then mirrored to the local cache and
//! forwarded to the remote store through per-session call lanes. Remote
//! failures never undo a local change; divergence heals on the next `load`.
//!
//! Lifecycle: `new` → `init(identity)` → operations → `shutdown`.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::task::LocalSpawn;

use chat_types::{
    ChatError, Result,
    collection::Collection,
    event::{ChatEvent, LoadSource},
    ids::now_rfc3339,
    message::{Message, Role},
    session::{Session, SessionSummary},
};
use crate::event_bus::EventBus;
use crate::lanes::{CallLanes, RemoteTicket};
use crate::mirror::CacheMirror;
use crate::ports::{CachePort, RemoteStorePort, SessionPatch};

/// Lane for calls that touch the whole collection rather than one session.
const COLLECTION_LANE: &str = "collection";
/// Lane for the backend reachability check, so a hung backend blocks no one.
const HEALTH_LANE: &str = "health";
/// Lane for write-behind cache snapshots.
const CACHE_LANE: &str = "cache";

/// Result of a local mutation plus the handle to its remote side effect.
pub struct Pending<T> {
    pub value: T,
    pub remote: RemoteTicket,
}

/// Shared handle to the engine, clone-cheap via Rc.
#[derive(Clone)]
pub struct ChatSync {
    inner: Rc<SyncInner>,
}

struct SyncInner {
    remote: Rc<dyn RemoteStorePort>,
    mirror: CacheMirror,
    lanes: CallLanes,
    /// Separate from `lanes` so the cache keeps up after `shutdown`
    cache_lanes: CallLanes,
    event_bus: EventBus,
    title_max_chars: usize,
    state: RefCell<Collection>,
    identity: RefCell<Option<String>>,
    last_synced: RefCell<Option<String>>,
}

impl ChatSync {
    pub fn new(
        remote: Rc<dyn RemoteStorePort>,
        cache: Rc<dyn CachePort>,
        spawner: Rc<dyn LocalSpawn>,
        event_bus: EventBus,
        title_max_chars: usize,
    ) -> Self {
        Self {
            inner: Rc::new(SyncInner {
                remote,
                mirror: CacheMirror::new(cache),
                lanes: CallLanes::new(spawner.clone()),
                cache_lanes: CallLanes::new(spawner),
                event_bus,
                title_max_chars,
                state: RefCell::new(Collection::default()),
                identity: RefCell::new(None),
                last_synced: RefCell::new(None),
            }),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────

    /// Bind the engine to `identity` and load its sessions.
    pub async fn init(&self, identity: impl Into<String>) -> Collection {
        let identity = identity.into();
        log::info!("Sync engine starting for {}", identity);
        *self.inner.identity.borrow_mut() = Some(identity);
        self.inner.lanes.reopen();
        if let Ok(Some(ts)) = self.inner.mirror.read_last_synced().await {
            *self.inner.last_synced.borrow_mut() = Some(ts);
        }
        self.load().await
    }

    /// Close all remote lanes. Calls already queued still complete; new
    /// remote calls resolve to `Cancelled` until the next `init`. Local
    /// changes keep being mirrored to the cache.
    pub fn shutdown(&self) {
        self.inner.lanes.close();
        *self.inner.identity.borrow_mut() = None;
        log::info!("Sync engine shut down");
    }

    pub fn identity(&self) -> Option<String> {
        self.inner.identity.borrow().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.identity.borrow().is_some()
    }

    // ─── Reads ───────────────────────────────────────────────

    pub fn snapshot(&self) -> Collection {
        self.inner.state.borrow().clone()
    }

    pub fn session(&self, id: &str) -> Option<Session> {
        self.inner.state.borrow().get(id).cloned()
    }

    pub fn active_session(&self) -> Option<Session> {
        self.inner.state.borrow().active_session().cloned()
    }

    pub fn active_id(&self) -> Option<String> {
        self.inner.state.borrow().active.clone()
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.inner.state.borrow().summaries()
    }

    /// When the last successful remote `load` happened
    pub fn last_synced(&self) -> Option<String> {
        self.inner.last_synced.borrow().clone()
    }

    // ─── Load ────────────────────────────────────────────────

    /// Replace in-memory state from the remote store, falling back to the
    /// local cache and finally to a single default session. Never fails.
    pub async fn load(&self) -> Collection {
        let fetched = match self.identity() {
            Some(identity) => self.inner.remote.fetch_all(&identity).await,
            None => Err(ChatError::NotInitialized),
        };

        let (mut collection, mut source) = match fetched {
            Ok(collection) if !collection.is_empty() => (collection, LoadSource::Remote),
            Ok(_) => {
                log::info!("Remote store holds no sessions, trying local cache");
                self.load_from_cache().await
            }
            Err(e) => {
                log::warn!("Remote load failed ({}), falling back to local cache", e);
                self.load_from_cache().await
            }
        };

        if collection.ensure_usable() {
            source = LoadSource::Default;
        }

        if source == LoadSource::Remote {
            let now = now_rfc3339();
            if let Err(e) = self.inner.mirror.write_last_synced(&now).await {
                log::warn!("Failed to record sync time: {}", e);
            }
            *self.inner.last_synced.borrow_mut() = Some(now);
        }

        *self.inner.state.borrow_mut() = collection.clone();
        log::info!("Loaded {} sessions from {:?}", collection.len(), source);

        if source != LoadSource::Cache {
            self.schedule_mirror();
        }
        if source == LoadSource::Default {
            if let Some(session) = collection.sessions.first() {
                let _ = self.remote_create(session);
            }
        }

        self.inner.event_bus.emit(ChatEvent::Loaded { source });
        self.inner.event_bus.emit(ChatEvent::CollectionChanged);
        collection
    }

    async fn load_from_cache(&self) -> (Collection, LoadSource) {
        match self.inner.mirror.read_collection().await {
            Ok(Some(collection)) => (collection, LoadSource::Cache),
            Ok(None) => (Collection::default(), LoadSource::Default),
            Err(e) => {
                log::warn!("Local cache unreadable ({}), starting fresh", e);
                (Collection::default(), LoadSource::Default)
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────

    /// New empty session at the head of the list, made active.
    pub fn create_session(&self) -> Pending<String> {
        let session = Session::fresh();
        let id = session.id.clone();
        let remote = self.remote_create(&session);
        self.inner.state.borrow_mut().insert_front(session);
        self.changed();
        Pending { value: id, remote }
    }

    /// Remove a session. Returns `Ok(None)` when `id` is the only session
    /// left: the last session is never deleted.
    pub fn delete_session(&self, id: &str) -> Result<Option<RemoteTicket>> {
        let removed = self.inner.state.borrow_mut().remove(id)?;
        if removed.is_none() {
            log::info!("Refusing to delete {}: it is the only session", id);
            return Ok(None);
        }
        self.changed();

        let session_id = id.to_string();
        let ticket = self.dispatch(id, "delete-session", move |remote, identity| async move {
            remote.delete_session(&identity, &session_id).await
        });
        self.inner.lanes.retire(id);
        Ok(Some(ticket))
    }

    /// Drop every session and start over with one fresh empty session.
    /// Takes local effect regardless of the remote outcome.
    pub fn clear_all_sessions(&self) -> Pending<String> {
        let session = Session::fresh();
        let id = session.id.clone();
        let title = session.title.clone();

        // Clear and re-create share the new session's lane so messages
        // appended to it can never overtake the clear.
        let session_id = id.clone();
        let remote = self.dispatch(&id, "clear-sessions", move |remote, identity| async move {
            remote.clear_sessions(&identity).await?;
            remote.create_session(&identity, &session_id, &title).await
        });

        {
            let mut state = self.inner.state.borrow_mut();
            state.sessions = vec![session];
            state.active = Some(id.clone());
        }
        self.inner
            .lanes
            .retire_all_except(&[COLLECTION_LANE, HEALTH_LANE, id.as_str()]);
        self.changed();
        log::info!("Cleared all sessions");
        Pending { value: id, remote }
    }

    /// Point the active pointer at `id`. An unknown id leaves the pointer
    /// unchanged and is reported to the caller.
    pub fn set_active_session(&self, id: &str) -> Result<RemoteTicket> {
        self.inner.state.borrow_mut().set_active(id)?;
        self.changed();
        let session_id = id.to_string();
        Ok(self.dispatch(COLLECTION_LANE, "set-active", move |remote, identity| async move {
            remote.set_active(&identity, Some(&session_id)).await
        }))
    }

    /// Append a message to `session_id`. If the remote append fails, the
    /// full collection is written to the local cache instead.
    pub fn append_message(
        &self,
        session_id: &str,
        role: Role,
        text: impl Into<String>,
    ) -> Result<Pending<Message>> {
        let message = Message::new(role, text);
        self.inner
            .state
            .borrow_mut()
            .require_mut(session_id)?
            .push_message(message.clone(), self.inner.title_max_chars);
        self.changed();

        let weak: Weak<SyncInner> = Rc::downgrade(&self.inner);
        let sid = session_id.to_string();
        let outgoing = message.clone();
        let remote = self.dispatch(session_id, "append-message", move |remote, identity| async move {
            let result = remote
                .append_message(&identity, &sid, &outgoing)
                .await
                .map(|_| ());
            if result.is_err() {
                if let Some(inner) = weak.upgrade() {
                    let snapshot = inner.state.borrow().clone();
                    match inner.mirror.write_collection(&snapshot).await {
                        Ok(()) => log::info!("Append to {} kept in local cache", sid),
                        Err(e) => log::error!("Failed to persist fallback snapshot: {}", e),
                    }
                }
            }
            result
        });
        Ok(Pending { value: message, remote })
    }

    pub fn rename_session(&self, session_id: &str, title: impl Into<String>) -> Result<RemoteTicket> {
        let title = title.into();
        self.inner
            .state
            .borrow_mut()
            .require_mut(session_id)?
            .rename(title.clone());
        self.changed();

        let sid = session_id.to_string();
        Ok(self.dispatch(session_id, "update-session", move |remote, identity| async move {
            let patch = SessionPatch {
                title: Some(title),
                messages: None,
            };
            remote.update_session(&identity, &sid, patch).await.map(|_| ())
        }))
    }

    // ─── Migration ───────────────────────────────────────────

    /// Push the local cache to the remote store, replacing whatever is there,
    /// then reload from the remote copy.
    ///
    /// Remote calls and cache writes queued before the migration settle
    /// first, so the replay sees every local change and nothing queued
    /// earlier lands after the clear. Calls then run strictly in sequence:
    /// each session is created before its messages are replayed, in order.
    /// The first failure aborts the migration and is returned.
    pub async fn sync_local_to_remote(&self) -> Result<Collection> {
        let identity = self.identity().ok_or(ChatError::NotInitialized)?;
        self.inner.lanes.flush().await;
        self.inner.cache_lanes.flush().await;
        let cached = self
            .inner
            .mirror
            .read_collection()
            .await?
            .ok_or(ChatError::DataUnavailable)?;

        log::info!("Migrating {} cached sessions to remote store", cached.len());
        if let Err(e) = self.replay(&identity, &cached).await {
            log::error!("Local-to-remote migration failed: {}", e);
            return Err(e);
        }
        Ok(self.load().await)
    }

    async fn replay(&self, identity: &str, cached: &Collection) -> Result<()> {
        let remote = &self.inner.remote;
        remote.clear_sessions(identity).await?;
        for session in &cached.sessions {
            remote.create_session(identity, &session.id, &session.title).await?;
            for message in &session.messages {
                remote.append_message(identity, &session.id, message).await?;
            }
        }
        if let Some(active) = cached.active.as_deref() {
            remote.set_active(identity, Some(active)).await?;
        }
        Ok(())
    }

    // ─── Health ──────────────────────────────────────────────

    /// Check that the backend answers. Runs on its own lane; a failure is
    /// published as `RemoteFailed { operation: "health" }`.
    pub fn check_health(&self) -> RemoteTicket {
        self.dispatch(HEALTH_LANE, "health", |remote, _identity| async move {
            remote.health().await
        })
    }

    // ─── Internals ───────────────────────────────────────────

    fn remote_create(&self, session: &Session) -> RemoteTicket {
        let sid = session.id.clone();
        let title = session.title.clone();
        self.dispatch(&session.id, "create-session", move |remote, identity| async move {
            remote.create_session(&identity, &sid, &title).await
        })
    }

    /// Queue a best-effort remote call on `lane`. Failures are logged and
    /// published on the event bus, never propagated into local state.
    fn dispatch<F, Fut>(&self, lane: &str, operation: &'static str, call: F) -> RemoteTicket
    where
        F: FnOnce(Rc<dyn RemoteStorePort>, String) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let Some(identity) = self.identity() else {
            log::debug!("Skipping remote {}: engine not initialized", operation);
            return RemoteTicket::ready(Err(ChatError::NotInitialized));
        };
        let remote = self.inner.remote.clone();
        let event_bus = self.inner.event_bus.clone();
        self.inner.lanes.enqueue(
            lane,
            Box::pin(async move {
                let result = call(remote, identity).await;
                if let Err(ref e) = result {
                    log::warn!("Remote {} failed: {}", operation, e);
                    event_bus.emit(ChatEvent::RemoteFailed {
                        operation: operation.to_string(),
                        message: e.to_string(),
                    });
                }
                result
            }),
        )
    }

    /// Publish a local change and queue a write-behind cache snapshot.
    fn changed(&self) {
        self.inner.event_bus.emit(ChatEvent::CollectionChanged);
        self.schedule_mirror();
    }

    fn schedule_mirror(&self) -> RemoteTicket {
        let snapshot = self.inner.state.borrow().clone();
        let mirror = self.inner.mirror.clone();
        self.inner.cache_lanes.enqueue(
            CACHE_LANE,
            Box::pin(async move {
                let result = mirror.write_collection(&snapshot).await;
                if let Err(ref e) = result {
                    log::warn!("Failed to mirror collection to cache: {}", e);
                }
                result
            }),
        )
    }
}
