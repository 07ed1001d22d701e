//! Per-session remote call lanes.
//!
//! Every remote mutation is queued on a lane (normally the session id) and
//! executed by a spawned worker that drains the lane strictly in FIFO order.
//! Local state never waits for a lane: enqueueing returns a [`RemoteTicket`]
//! that callers may await for the eventual outcome or simply drop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::{mpsc, oneshot};
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::StreamExt;

use chat_types::{ChatError, Result};

/// A queued remote call. Lazy: nothing runs until the lane worker polls it.
pub type RemoteCall = LocalBoxFuture<'static, Result<()>>;

struct QueuedCall {
    call: RemoteCall,
    done: oneshot::Sender<Result<()>>,
}

/// Eventual outcome of a queued remote call.
///
/// Resolves to `Err(ChatError::Cancelled)` if the lane was torn down before
/// the call ran.
pub struct RemoteTicket {
    rx: oneshot::Receiver<Result<()>>,
}

impl RemoteTicket {
    /// A ticket that is already settled.
    pub fn ready(result: Result<()>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for RemoteTicket {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ChatError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct CallLanes {
    spawner: Rc<dyn LocalSpawn>,
    lanes: RefCell<HashMap<String, mpsc::UnboundedSender<QueuedCall>>>,
    /// Retired lanes that may still be draining, held until the next `flush`
    retired: RefCell<Vec<mpsc::UnboundedSender<QueuedCall>>>,
    closed: Cell<bool>,
}

impl CallLanes {
    pub fn new(spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            spawner,
            lanes: RefCell::new(HashMap::new()),
            retired: RefCell::new(Vec::new()),
            closed: Cell::new(false),
        }
    }

    /// Queue `call` behind everything already queued on `lane`.
    pub fn enqueue(&self, lane: &str, call: RemoteCall) -> RemoteTicket {
        let (done, rx) = oneshot::channel();
        if self.closed.get() {
            let _ = done.send(Err(ChatError::Cancelled));
            return RemoteTicket { rx };
        }

        let mut queued = QueuedCall { call, done };
        let existing = self.lanes.borrow().get(lane).cloned();
        if let Some(tx) = existing {
            match tx.unbounded_send(queued) {
                Ok(()) => return RemoteTicket { rx },
                // Worker is gone; start a new one below.
                Err(e) => queued = e.into_inner(),
            }
        }

        let (tx, lane_rx) = mpsc::unbounded();
        if let Err(e) = self.spawner.spawn_local(run_lane(lane.to_string(), lane_rx)) {
            log::error!("Failed to spawn remote lane {}: {}", lane, e);
            let _ = queued.done.send(Err(ChatError::Other(format!("spawn failed: {}", e))));
            return RemoteTicket { rx };
        }
        let _ = tx.unbounded_send(queued);
        self.lanes.borrow_mut().insert(lane.to_string(), tx);
        RemoteTicket { rx }
    }

    /// Stop accepting work for `lane`. Calls already queued still run.
    pub fn retire(&self, lane: &str) {
        if let Some(tx) = self.lanes.borrow_mut().remove(lane) {
            self.retired.borrow_mut().push(tx);
        }
    }

    /// Retire every lane except those named in `keep`.
    pub fn retire_all_except(&self, keep: &[&str]) {
        let mut retired = self.retired.borrow_mut();
        self.lanes.borrow_mut().retain(|lane, tx| {
            let kept = keep.contains(&lane.as_str());
            if !kept {
                retired.push(tx.clone());
            }
            kept
        });
    }

    /// Resolves once every call queued so far, on open and retired lanes
    /// alike, has finished. Calls queued afterwards are not waited for.
    pub fn flush(&self) -> impl Future<Output = ()> + 'static {
        let open: Vec<String> = self.lanes.borrow().keys().cloned().collect();
        let mut tickets: Vec<RemoteTicket> = open
            .iter()
            .map(|lane| self.enqueue(lane, Box::pin(async { Ok::<(), ChatError>(()) })))
            .collect();
        for tx in self.retired.borrow_mut().drain(..) {
            let (done, rx) = oneshot::channel();
            let marker = QueuedCall { call: Box::pin(async { Ok::<(), ChatError>(()) }), done };
            if tx.unbounded_send(marker).is_ok() {
                tickets.push(RemoteTicket { rx });
            }
        }
        async move {
            futures::future::join_all(tickets).await;
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.borrow().len()
    }

    /// Retire all lanes and refuse new work until `reopen`.
    pub fn close(&self) {
        self.closed.set(true);
        self.lanes.borrow_mut().clear();
        self.retired.borrow_mut().clear();
    }

    pub fn reopen(&self) {
        self.closed.set(false);
    }
}

async fn run_lane(lane: String, mut rx: mpsc::UnboundedReceiver<QueuedCall>) {
    while let Some(queued) = rx.next().await {
        let result = queued.call.await;
        if let Err(ref e) = result {
            log::debug!("Remote call on lane {} failed: {}", lane, e);
        }
        let _ = queued.done.send(result);
    }
    log::debug!("Remote lane {} drained", lane);
}
