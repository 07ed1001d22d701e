//! Event queue between the sync engine and whatever presents it.
//!
//! Single-threaded (WASM constraint), shared through `Rc<RefCell<..>>` and
//! drained by the UI whenever it repaints. The queue stays bounded even when
//! nobody drains it:
//! - a `StreamFrame` replaces any pending frame for the same session, since
//!   only the latest preview is worth painting
//! - past [`MAX_PENDING`] events the oldest are dropped

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use chat_types::event::ChatEvent;

/// Most events held between two drains.
pub const MAX_PENDING: usize = 1024;

/// Shared event bus, clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
    overflowed: Rc<Cell<bool>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
            overflowed: Rc::new(Cell::new(false)),
        }
    }

    pub fn emit(&self, event: ChatEvent) {
        let mut queue = self.inner.borrow_mut();
        if let ChatEvent::StreamFrame { session_id, .. } = &event {
            queue.retain(|pending| {
                !matches!(pending, ChatEvent::StreamFrame { session_id: s, .. } if s == session_id)
            });
        }
        if queue.len() >= MAX_PENDING {
            queue.pop_front();
            if !self.overflowed.replace(true) {
                log::warn!("Event queue full, dropping oldest events until next drain");
            }
        }
        queue.push_back(event);
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.overflowed.set(false);
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
