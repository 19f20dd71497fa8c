//! Asynchronous fragment execution
//!
//! The console hands source fragments to a worker thread through a
//! [`FragmentQueue`]. [`ScriptFeeder`] is the queue that ships with the
//! console; [`ExecutionCoordinator`] sits in front of any queue and adds the
//! "block until the worker is done" handshake used in block mode.
//!
//! The feeder reports progress as [`FeederEvent`]s on a single-consumer
//! channel. The session owns the receiving end.

pub mod coordinator;
pub mod feeder;

use crate::error::Result;

pub use coordinator::ExecutionCoordinator;
pub use feeder::ScriptFeeder;

/// A source fragment submitted for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Source text; one input line in block mode
    pub fragment: String,
    /// Whether the submitting thread waits for the worker before continuing
    pub blocking: bool,
}

impl ExecutionRequest {
    /// Request whose caller suspends until the worker reports back
    pub fn blocking(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            blocking: true,
        }
    }

    /// Fire-and-forget request
    pub fn queued(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            blocking: false,
        }
    }

    /// Blank fragments close the open block
    pub fn is_blank(&self) -> bool {
        self.fragment.trim().is_empty()
    }
}

/// Progress notifications from the feeder worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeederEvent {
    /// A block finished; carries its rendered value
    Completed(String),
    /// A block raised an error (or the evaluator panicked)
    Failed(String),
    /// The worker has no more ready work
    Waiting,
}

/// Worker-side execution queue
pub trait FragmentQueue: Send + Sync {
    /// Queue a fragment. Fails once the queue has been asked to drain.
    fn append(&self, request: ExecutionRequest) -> Result<()>;

    /// Resume a paused worker
    fn begin_execution(&self);

    /// Finish every queued fragment, then stop. Returns once the worker
    /// has exited.
    fn end_after_queue_done(&self);
}
