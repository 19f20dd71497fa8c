//! Contract Tests for the Feeder Handshake
//!
//! The coordinator and the feeder worker together must serialize block
//! submissions: a blocking append returns only after the worker reports it
//! is waiting, and the startup "waiting" notification never releases anyone.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cantus_console::engine::{EngineHost, NullHost};
use cantus_console::execution::{
    ExecutionCoordinator, ExecutionRequest, FeederEvent, FragmentQueue, ScriptFeeder,
};
use cantus_console::{Calculator, Error, Result};
use tokio::sync::mpsc::UnboundedReceiver;

type Log = Arc<Mutex<Vec<FeederEvent>>>;

/// Minimal pump: records outcomes, resumes the feeder after each one and
/// forwards waiting notifications
fn pump(
    coordinator: Arc<ExecutionCoordinator>,
    mut events: UnboundedReceiver<FeederEvent>,
) -> (Log, JoinHandle<()>) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let handle = thread::spawn(move || {
        while let Some(event) = events.blocking_recv() {
            match event {
                FeederEvent::Waiting => coordinator.on_waiting(),
                outcome => {
                    sink.lock().unwrap().push(outcome);
                    coordinator.begin_execution();
                }
            }
        }
    });
    (log, handle)
}

fn start() -> (Arc<ExecutionCoordinator>, Log, JoinHandle<()>) {
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);
    let (feeder, events) = ScriptFeeder::start(Arc::new(Calculator::default()), host).unwrap();
    let coordinator = Arc::new(ExecutionCoordinator::new(Box::new(feeder)));
    let (log, handle) = pump(Arc::clone(&coordinator), events);
    coordinator.begin_execution();
    (coordinator, log, handle)
}

fn outcomes(log: &Log) -> Vec<FeederEvent> {
    log.lock().unwrap().clone()
}

#[test]
fn test_blocking_append_returns_after_block_completes() {
    let (coordinator, log, pump) = start();

    coordinator.append(ExecutionRequest::blocking("let a = 1")).unwrap();
    coordinator.append(ExecutionRequest::blocking("a + 1")).unwrap();
    assert!(outcomes(&log).is_empty(), "block ran before it was closed");

    coordinator.append(ExecutionRequest::blocking("")).unwrap();
    assert_eq!(outcomes(&log), vec![FeederEvent::Completed("2".to_string())]);

    coordinator.end_after_queue_done();
    pump.join().unwrap();
}

#[test]
fn test_blocks_complete_in_submission_order() {
    let (coordinator, log, pump) = start();

    for line in ["let x = 1", "", "x * 10", "", "1 / 0", "", "x + 5", ""] {
        coordinator.append(ExecutionRequest::blocking(line)).unwrap();
    }

    assert_eq!(
        outcomes(&log),
        vec![
            FeederEvent::Completed("1".to_string()),
            FeederEvent::Completed("10".to_string()),
            FeederEvent::Failed("Division by zero".to_string()),
            FeederEvent::Completed("6".to_string()),
        ]
    );

    coordinator.end_after_queue_done();
    pump.join().unwrap();
}

#[test]
fn test_queued_fragments_drain_on_shutdown() {
    let (coordinator, log, pump) = start();

    coordinator.append(ExecutionRequest::queued("let q = 3")).unwrap();
    coordinator.append(ExecutionRequest::queued("q * q")).unwrap();
    coordinator.end_after_queue_done();
    pump.join().unwrap();

    assert_eq!(outcomes(&log), vec![FeederEvent::Completed("9".to_string())]);
}

#[test]
fn test_append_after_drain_is_rejected() {
    let (coordinator, _log, pump) = start();
    coordinator.end_after_queue_done();
    pump.join().unwrap();

    let result = coordinator.append(ExecutionRequest::blocking("1"));
    assert!(matches!(result, Err(Error::FeederClosed)));
    assert!(!coordinator.has_pending());
}

/// Queue that accepts everything and never reports back on its own
struct SilentQueue;

impl FragmentQueue for SilentQueue {
    fn append(&self, _request: ExecutionRequest) -> Result<()> {
        Ok(())
    }

    fn begin_execution(&self) {}

    fn end_after_queue_done(&self) {}
}

#[test]
fn test_first_waiting_never_releases_a_caller() {
    let coordinator = Arc::new(ExecutionCoordinator::new(Box::new(SilentQueue)));
    let notified = Arc::new(AtomicUsize::new(0));

    let notifier = {
        let coordinator = Arc::clone(&coordinator);
        let notified = Arc::clone(&notified);
        thread::spawn(move || {
            for _ in 0..2 {
                thread::sleep(Duration::from_millis(50));
                notified.fetch_add(1, Ordering::SeqCst);
                coordinator.on_waiting();
            }
        })
    };

    coordinator.append(ExecutionRequest::blocking("x")).unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 2);
    notifier.join().unwrap();
}

#[test]
fn test_drain_releases_a_parked_caller() {
    let coordinator = Arc::new(ExecutionCoordinator::new(Box::new(SilentQueue)));
    coordinator.on_waiting();

    let parked = {
        let coordinator = Arc::clone(&coordinator);
        thread::spawn(move || coordinator.append(ExecutionRequest::blocking("x")))
    };
    while !coordinator.has_pending() {
        thread::sleep(Duration::from_millis(5));
    }
    coordinator.end_after_queue_done();

    let result = parked.join().unwrap();
    assert!(matches!(result, Err(Error::WorkerStopped)));
}
