//! Command queue between client sessions and the host thread
//!
//! Sessions are the producers; the drain scheduler on the host thread is the
//! only consumer. Each request carries its own oneshot completion, so the
//! queue itself never needs a lock around its contents.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use uuid::Uuid;

/// Single-resolution handle for a request's response
///
/// Resolving consumes the handle, so a request cannot be answered twice.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<String>,
}

impl Completion {
    /// Deliver the serialized response
    ///
    /// Returns `false` if the waiting session has already gone away.
    pub fn resolve(self, response: String) -> bool {
        self.tx.send(response).is_ok()
    }

    /// Whether the waiting session has gone away
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A queued request awaiting execution
#[derive(Debug)]
pub struct PendingRequest {
    pub id: Uuid,
    pub payload: String,
    pub completion: Completion,
}

/// Receiving half of a submitted request
pub type ResponseReceiver = oneshot::Receiver<String>;

/// Error returned when the consumer side has shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("command queue is closed")]
pub struct QueueClosed;

/// Create a connected queue pair
pub fn command_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        QueueSender {
            tx,
            pending: Arc::clone(&pending),
        },
        QueueReceiver { rx, pending },
    )
}

/// Producer side, cloned into every session
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<PendingRequest>,
    pending: Arc<AtomicUsize>,
}

impl QueueSender {
    /// Enqueue a raw payload under a fresh request id
    pub fn submit(&self, payload: String) -> Result<(Uuid, ResponseReceiver), QueueClosed> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            id,
            payload,
            completion: Completion { tx },
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueClosed);
        }

        trace!(request_id = %id, "Request enqueued");
        Ok((id, rx))
    }

    /// Number of requests enqueued but not yet drained
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the consumer side has shut down
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the drain scheduler
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<PendingRequest>,
    pending: Arc<AtomicUsize>,
}

impl QueueReceiver {
    /// Remove and return every request queued at this instant
    ///
    /// Never blocks. Requests submitted while the snapshot is being taken may
    /// land in this batch or the next one.
    pub fn drain_all(&mut self) -> Vec<PendingRequest> {
        let mut batch = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            batch.push(request);
        }
        if !batch.is_empty() {
            self.pending.fetch_sub(batch.len(), Ordering::SeqCst);
        }
        batch
    }

    /// Stop accepting new requests; already queued ones stay drainable
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
