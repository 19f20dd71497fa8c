//! Foreground side of the feeder handshake
//!
//! A blocking submission parks the calling thread on a fresh one-shot
//! rendezvous. The rendezvous fires on the next "waiting" notification from
//! the worker, except the very first one after startup, which only reflects
//! the worker's initial idle state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use super::{ExecutionRequest, FragmentQueue};
use crate::error::{Error, Result};

pub struct ExecutionCoordinator {
    queue: Box<dyn FragmentQueue>,
    /// Rendezvous for the submission currently in flight
    pending: Mutex<Option<oneshot::Sender<()>>>,
    /// Set until the startup "waiting" notification has been swallowed
    first_waiting: AtomicBool,
}

impl ExecutionCoordinator {
    pub fn new(queue: Box<dyn FragmentQueue>) -> Self {
        Self {
            queue,
            pending: Mutex::new(None),
            first_waiting: AtomicBool::new(true),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a fragment to the worker. Blocking requests return only after
    /// the worker reports it is waiting for more input.
    pub fn append(&self, request: ExecutionRequest) -> Result<()> {
        if !request.blocking {
            return self.queue.append(request);
        }

        let (tx, rx) = oneshot::channel();
        if self.pending().replace(tx).is_some() {
            warn!("Replacing an unfinished blocking submission");
        }

        if let Err(e) = self.queue.append(request) {
            self.pending().take();
            return Err(e);
        }

        rx.blocking_recv().map_err(|_| Error::WorkerStopped)
    }

    pub fn begin_execution(&self) {
        self.queue.begin_execution();
    }

    /// Drain the worker. A caller still parked on a submission is released
    /// with [`Error::WorkerStopped`].
    pub fn end_after_queue_done(&self) {
        self.queue.end_after_queue_done();
        self.pending().take();
    }

    /// Worker has no more ready work
    pub fn on_waiting(&self) {
        if self.first_waiting.swap(false, Ordering::SeqCst) {
            debug!("Ignoring startup waiting notification");
            return;
        }
        if let Some(tx) = self.pending().take() {
            let _ = tx.send(());
        }
    }

    /// Whether a blocking submission is parked
    pub fn has_pending(&self) -> bool {
        self.pending().is_some()
    }
}

impl std::fmt::Debug for ExecutionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionCoordinator")
            .field("pending", &self.has_pending())
            .field("first_waiting", &self.first_waiting.load(Ordering::SeqCst))
            .finish()
    }
}
