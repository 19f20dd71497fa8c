//! Script feeder
//!
//! Runs block-mode fragments against an evaluator on a dedicated worker
//! thread. Non-blank fragments accumulate into the open block; a blank
//! fragment evaluates the block once and pauses the worker until the
//! session calls [`FragmentQueue::begin_execution`] again.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{ExecutionRequest, FeederEvent, FragmentQueue};
use crate::engine::{EngineHost, EvalMode, Evaluator};
use crate::error::{Error, Result};

#[derive(Debug)]
struct FeederState {
    queue: VecDeque<String>,
    paused: bool,
    closing: bool,
}

struct FeederShared {
    state: Mutex<FeederState>,
    wake: Condvar,
}

impl FeederShared {
    fn lock(&self) -> MutexGuard<'_, FeederState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Worker-thread execution queue
pub struct ScriptFeeder {
    shared: Arc<FeederShared>,
    events: Mutex<Option<UnboundedSender<FeederEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ScriptFeeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFeeder")
            .field("state", &*self.shared.lock())
            .finish()
    }
}

impl ScriptFeeder {
    /// Start a paused feeder. The receiver yields every [`FeederEvent`] and
    /// closes once the feeder has drained and stopped.
    pub fn start(
        evaluator: Arc<dyn Evaluator>,
        host: Arc<dyn EngineHost>,
    ) -> Result<(Self, UnboundedReceiver<FeederEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(FeederShared {
            state: Mutex::new(FeederState {
                queue: VecDeque::new(),
                paused: true,
                closing: false,
            }),
            wake: Condvar::new(),
        });

        let worker = Worker {
            shared: Arc::clone(&shared),
            events: tx.clone(),
            evaluator,
            host,
            block: Vec::new(),
        };
        let handle = thread::Builder::new()
            .name("cantus-feeder".to_string())
            .spawn(move || worker.run())?;

        debug!("Script feeder started");

        Ok((
            Self {
                shared,
                events: Mutex::new(Some(tx)),
                worker: Mutex::new(Some(handle)),
            },
            rx,
        ))
    }

    /// Fragments waiting for the worker
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Whether the worker is paused after a completed block
    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    fn emit(&self, event: FeederEvent) {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref() {
            let _ = tx.send(event);
        }
    }
}

impl FragmentQueue for ScriptFeeder {
    fn append(&self, request: ExecutionRequest) -> Result<()> {
        let mut state = self.shared.lock();
        if state.closing {
            return Err(Error::FeederClosed);
        }
        state.queue.push_back(request.fragment);
        drop(state);
        self.shared.wake.notify_all();
        Ok(())
    }

    fn begin_execution(&self) {
        let mut state = self.shared.lock();
        if state.closing || !state.paused {
            return;
        }
        state.paused = false;
        let idle = state.queue.is_empty();
        drop(state);

        self.shared.wake.notify_all();
        if idle {
            self.emit(FeederEvent::Waiting);
        }
    }

    fn end_after_queue_done(&self) {
        {
            let mut state = self.shared.lock();
            state.closing = true;
        }
        self.shared.wake.notify_all();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Script feeder worker panicked while draining");
            }
        }

        // Last sender gone: the event stream ends for the consumer
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("Script feeder drained");
    }
}

impl Drop for ScriptFeeder {
    fn drop(&mut self) {
        let running = self
            .worker
            .lock()
            .map(|worker| worker.is_some())
            .unwrap_or(false);
        if running {
            self.end_after_queue_done();
        }
    }
}

struct Worker {
    shared: Arc<FeederShared>,
    events: UnboundedSender<FeederEvent>,
    evaluator: Arc<dyn Evaluator>,
    host: Arc<dyn EngineHost>,
    /// Lines of the block currently being entered
    block: Vec<String>,
}

impl Worker {
    fn run(mut self) {
        while let Some(fragment) = self.next_fragment() {
            self.process(fragment);
        }

        // Drain: whatever is still open runs once more
        if !self.block.is_empty() {
            self.finish_block(false);
        }
        debug!("Script feeder worker exiting");
    }

    fn next_fragment(&self) -> Option<String> {
        let mut state = self.shared.lock();
        loop {
            if !state.paused || state.closing {
                if let Some(fragment) = state.queue.pop_front() {
                    return Some(fragment);
                }
            }
            if state.closing {
                return None;
            }
            state = self
                .shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn process(&mut self, fragment: String) {
        if fragment.trim().is_empty() {
            if self.block.is_empty() {
                self.emit(FeederEvent::Waiting);
                return;
            }
            self.finish_block(true);
            return;
        }

        self.block.push(fragment);
        let idle = self.shared.lock().queue.is_empty();
        if idle {
            self.emit(FeederEvent::Waiting);
        }
    }

    /// Evaluate the open block. With `pause`, the worker stops taking
    /// fragments before the outcome is reported.
    fn finish_block(&mut self, pause: bool) {
        let source = self.block.join("\n");
        self.block.clear();
        trace!("Evaluating block of {} bytes", source.len());

        let evaluator = &self.evaluator;
        let host = &self.host;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            evaluator.eval(&source, EvalMode::ReturnedOnly, host)
        }));

        let event = match outcome {
            Ok(Ok(result)) => FeederEvent::Completed(result),
            Ok(Err(e)) => FeederEvent::Failed(e.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Evaluator panicked: {}", message);
                FeederEvent::Failed(format!("Internal error: {}", message))
            }
        };

        if pause {
            let mut state = self.shared.lock();
            if !state.closing {
                state.paused = true;
            }
        }
        self.emit(event);
    }

    fn emit(&self, event: FeederEvent) {
        trace!("Feeder event: {:?}", event);
        if self.events.send(event).is_err() {
            warn!("Feeder event dropped: no consumer");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
