//! Incremental response renderer.
//!
//! Reveals an already complete assistant reply one character per tick, then
//! commits it to the sync engine as a single assistant message. A stream that
//! is cancelled (or whose future is dropped) before the last tick commits
//! nothing; the partial text only ever existed as on-screen preview.
//!
//! ```text
//! Idle ──stream()──▶ Streaming(text, 0) ──tick──▶ Streaming(text, n)
//!   ▲                      │ cancel / drop / new stream      │ n == len
//!   └──────────────────────┴──────────── Committing ◀────────┘
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{self, Either};
use tokio_util::sync::CancellationToken;

use chat_types::{
    Result,
    config::RendererConfig,
    event::ChatEvent,
    message::{Message, Role},
};
use crate::event_bus::EventBus;
use crate::ports::TickerPort;
use crate::sync::ChatSync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Streaming {
        session_id: String,
        full_text: String,
        /// Characters revealed so far
        position: usize,
    },
}

impl RenderState {
    /// The on-screen preview: the first `position` characters.
    pub fn visible_text(&self) -> Option<&str> {
        match self {
            RenderState::Idle => None,
            RenderState::Streaming { full_text, position, .. } => {
                Some(char_prefix(full_text, *position))
            }
        }
    }
}

/// How a stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Ran to the end; the full text is now a message in the session
    Committed(Message),
    /// Interrupted before the end; nothing was committed
    Cancelled,
}

/// Shared handle to the renderer, clone-cheap via Rc.
#[derive(Clone)]
pub struct ResponseRenderer {
    inner: Rc<RendererInner>,
}

struct RendererInner {
    sync: ChatSync,
    ticker: Rc<dyn TickerPort>,
    event_bus: EventBus,
    tick_ms: u64,
    state: RefCell<RenderState>,
    /// Token of the running stream, tagged with its generation
    current: RefCell<Option<(u64, CancellationToken)>>,
    generation: Cell<u64>,
}

impl ResponseRenderer {
    pub fn new(
        sync: ChatSync,
        ticker: Rc<dyn TickerPort>,
        event_bus: EventBus,
        config: &RendererConfig,
    ) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                sync,
                ticker,
                event_bus,
                tick_ms: config.tick_ms,
                state: RefCell::new(RenderState::Idle),
                current: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    pub fn state(&self) -> RenderState {
        self.inner.state.borrow().clone()
    }

    pub fn is_streaming(&self) -> bool {
        matches!(*self.inner.state.borrow(), RenderState::Streaming { .. })
    }

    pub fn visible_text(&self) -> Option<String> {
        self.inner.state.borrow().visible_text().map(str::to_string)
    }

    /// Stop the running stream without committing. No-op when idle.
    pub fn cancel(&self) {
        self.inner.finish(None, true);
    }

    /// Cancel the running stream only if it targets `session_id`.
    pub fn cancel_for(&self, session_id: &str) {
        let targeted = matches!(
            &*self.inner.state.borrow(),
            RenderState::Streaming { session_id: streaming, .. } if streaming == session_id
        );
        if targeted {
            self.cancel();
        }
    }

    /// Reveal `full_text` into `session_id`, then commit it.
    ///
    /// Any stream already running is cancelled first. Fails only if the
    /// commit itself is rejected (the session disappeared mid-stream).
    pub async fn stream(
        &self,
        session_id: &str,
        full_text: impl Into<String>,
    ) -> Result<RenderOutcome> {
        let full_text = full_text.into();
        self.cancel();

        let token = CancellationToken::new();
        let generation = self.inner.begin(session_id, &full_text, token.clone());
        let mut guard = StreamGuard {
            inner: self.inner.as_ref(),
            generation,
            settled: false,
        };

        let total = full_text.chars().count();
        for position in 1..=total {
            if token.is_cancelled() {
                return Ok(RenderOutcome::Cancelled);
            }
            let cancelled = token.cancelled();
            futures::pin_mut!(cancelled);
            let tick = self.inner.ticker.sleep(self.inner.tick_ms);
            if let Either::Left(_) = future::select(cancelled, tick).await {
                return Ok(RenderOutcome::Cancelled);
            }
            self.inner.advance(generation, position);
        }

        if token.is_cancelled() {
            return Ok(RenderOutcome::Cancelled);
        }
        guard.settled = true;
        self.inner.finish(Some(generation), false);

        let pending = self
            .inner
            .sync
            .append_message(session_id, Role::Assistant, full_text)
            .map_err(|e| {
                log::warn!("Dropping streamed reply for {}: {}", session_id, e);
                e
            })?;
        let message = pending.value;
        self.inner.event_bus.emit(ChatEvent::StreamCommitted {
            session_id: session_id.to_string(),
            message_id: message.id.clone(),
        });
        Ok(RenderOutcome::Committed(message))
    }
}

impl RendererInner {
    fn begin(&self, session_id: &str, full_text: &str, token: CancellationToken) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        *self.current.borrow_mut() = Some((generation, token));
        *self.state.borrow_mut() = RenderState::Streaming {
            session_id: session_id.to_string(),
            full_text: full_text.to_string(),
            position: 0,
        };
        self.event_bus.emit(ChatEvent::StreamStarted {
            session_id: session_id.to_string(),
        });
        generation
    }

    fn advance(&self, generation: u64, to: usize) {
        if !self.is_current(generation) {
            return;
        }
        let frame = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                RenderState::Streaming { session_id, full_text, position } => {
                    *position = to;
                    Some((session_id.clone(), char_prefix(full_text, to).to_string()))
                }
                RenderState::Idle => None,
            }
        };
        if let Some((session_id, visible)) = frame {
            self.event_bus.emit(ChatEvent::StreamFrame { session_id, visible });
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(*self.current.borrow(), Some((g, _)) if g == generation)
    }

    /// Return to Idle if `generation` (or any stream, when `None`) is the
    /// running one. Cancels its token and, if `cancelled`, reports it.
    fn finish(&self, generation: Option<u64>, cancelled: bool) {
        let token = {
            let mut current = self.current.borrow_mut();
            match current.as_ref() {
                Some((g, _)) if generation.map_or(true, |want| want == *g) => {}
                _ => return,
            }
            current.take().map(|(_, token)| token)
        };
        if let Some(token) = token {
            token.cancel();
        }

        let previous = self.state.replace(RenderState::Idle);
        if cancelled {
            if let RenderState::Streaming { session_id, position, .. } = previous {
                log::debug!("Stream for {} cancelled at {}", session_id, position);
                self.event_bus.emit(ChatEvent::StreamCancelled { session_id });
            }
        }
    }
}

/// Resets the renderer if a stream future is dropped mid-flight.
struct StreamGuard<'a> {
    inner: &'a RendererInner,
    generation: u64,
    settled: bool,
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.finish(Some(self.generation), true);
        }
    }
}

fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
