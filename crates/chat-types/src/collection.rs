//! The full set of sessions plus the active-session pointer.
//!
//! All structural invariants live here so the engine only has to decide
//! *when* to mutate, not *how*:
//! - a loaded collection is never empty
//! - `active`, when set, names a session that is present

use serde::{Deserialize, Serialize};
use crate::error::ChatError;
use crate::session::{Session, SessionSummary};
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub sessions: Vec<Session>,
    pub active: Option<String>,
}

impl Collection {
    pub fn new(sessions: Vec<Session>, active: Option<String>) -> Self {
        let mut collection = Self { sessions, active };
        collection.repair_active();
        collection
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Like `get_mut`, but a missing id is a caller error.
    pub fn require_mut(&mut self, id: &str) -> Result<&mut Session> {
        self.get_mut(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    /// Insert at the head and make it active.
    pub fn insert_front(&mut self, session: Session) {
        self.active = Some(session.id.clone());
        self.sessions.insert(0, session);
    }

    /// Remove a session.
    ///
    /// Returns `Ok(None)` without touching anything when `id` is the only
    /// remaining session.
    pub fn remove(&mut self, id: &str) -> Result<Option<Session>> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        if self.sessions.len() == 1 {
            return Ok(None);
        }
        let removed = self.sessions.remove(index);
        self.repair_active();
        Ok(Some(removed))
    }

    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(ChatError::SessionNotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Replace everything with one fresh empty session, made active.
    /// Returns the new session id.
    pub fn reset_to_default(&mut self) -> String {
        let session = Session::fresh();
        let id = session.id.clone();
        self.sessions = vec![session];
        self.active = Some(id.clone());
        id
    }

    /// Point a dangling active pointer at the first session (or nothing).
    pub fn repair_active(&mut self) {
        let dangling = match self.active.as_deref() {
            Some(id) => !self.contains(id),
            None => false,
        };
        if dangling {
            self.active = self.sessions.first().map(|s| s.id.clone());
        }
    }

    /// Make a freshly loaded collection usable: never empty, and with an
    /// active session. Returns true if a default session had to be synthesized.
    pub fn ensure_usable(&mut self) -> bool {
        if self.sessions.is_empty() {
            self.reset_to_default();
            return true;
        }
        self.repair_active();
        if self.active.is_none() {
            self.active = self.sessions.first().map(|s| s.id.clone());
        }
        false
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }
}
