//! Integration Tests for Shutdown
//!
//! State persistence from every exit path: concurrent triggers, a worker
//! still evaluating, termination signals, and reloading what was saved.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use cantus_console::engine::{EngineHost, EvalError, EvalMode, NullHost, Value};
use cantus_console::execution::{ExecutionRequest, FeederEvent, FragmentQueue, ScriptFeeder};
use cantus_console::shutdown::{ShutdownHandler, SAVE_FAILED_MESSAGE};
use cantus_console::terminal::MemoryTerminal;
use cantus_console::{Calculator, EngineConfig, Evaluator};
use test_utils::recording_exit;

/// Evaluator whose `eval` parks until released, and which counts saves
struct GatedEvaluator {
    gate: Mutex<mpsc::Receiver<()>>,
    scripts: AtomicUsize,
}

impl GatedEvaluator {
    fn new() -> (Arc<Self>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let evaluator = Arc::new(Self {
            gate: Mutex::new(rx),
            scripts: AtomicUsize::new(0),
        });
        (evaluator, tx)
    }
}

impl Evaluator for GatedEvaluator {
    fn eval(
        &self,
        source: &str,
        _mode: EvalMode,
        _host: &Arc<dyn EngineHost>,
    ) -> Result<String, EvalError> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(source.to_string())
    }

    fn to_script(&self) -> String {
        self.scripts.fetch_add(1, Ordering::SeqCst);
        "let gated = 1\n".to_string()
    }

    fn config(&self) -> EngineConfig {
        EngineConfig::default()
    }

    fn set_config(&self, _config: EngineConfig) {}
}

#[test]
fn test_concurrent_triggers_save_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let (evaluator, _release) = GatedEvaluator::new();
    let (exit, exits) = recording_exit();
    let handler = Arc::new(ShutdownHandler::new(
        evaluator.clone(),
        dir.path().join("init.can"),
        Arc::new(MemoryTerminal::new()),
        exit,
    ));

    let barrier = Arc::new(Barrier::new(8));
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let handler = Arc::clone(&handler);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                handler.terminate(0);
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(evaluator.scripts.load(Ordering::SeqCst), 1);
    assert_eq!(exits.lock().unwrap().as_slice(), &[0; 8]);
    assert_eq!(
        fs::read_to_string(handler.state_path()).unwrap(),
        "let gated = 1\n"
    );
}

#[test]
fn test_save_does_not_wait_for_running_worker() {
    let dir = tempfile::tempdir().unwrap();
    let (evaluator, release) = GatedEvaluator::new();
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);
    let (feeder, mut events) = ScriptFeeder::start(evaluator.clone(), host).unwrap();

    feeder.begin_execution();
    feeder.append(ExecutionRequest::queued("spin()")).unwrap();
    feeder.append(ExecutionRequest::queued("")).unwrap();

    // Worker is now parked inside eval
    thread::sleep(Duration::from_millis(50));
    let handler = ShutdownHandler::new(
        evaluator.clone(),
        dir.path().join("init.can"),
        Arc::new(MemoryTerminal::new()),
        recording_exit().0,
    );
    handler.save();
    assert!(handler.is_saved());
    assert!(handler.state_path().is_file());

    release.send(()).unwrap();
    let completed = loop {
        match events.blocking_recv() {
            Some(FeederEvent::Waiting) => continue,
            other => break other,
        }
    };
    assert_eq!(completed, Some(FeederEvent::Completed("spin()".to_string())));
    feeder.end_after_queue_done();
}

#[test]
fn test_failed_save_reports_and_still_exits() {
    let dir = tempfile::tempdir().unwrap();
    let terminal = Arc::new(MemoryTerminal::new());
    let (exit, exits) = recording_exit();
    let handler = ShutdownHandler::new(
        Arc::new(Calculator::default()),
        dir.path().join("no-such-dir").join("init.can"),
        terminal.clone(),
        exit,
    );

    handler.terminate(0);

    assert!(terminal.output().contains(SAVE_FAILED_MESSAGE));
    assert_eq!(exits.lock().unwrap().as_slice(), &[0]);
}

#[test]
fn test_saved_state_reloads_definitions() {
    let dir = tempfile::tempdir().unwrap();
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);
    let first = Arc::new(Calculator::default());
    first
        .eval(
            "let rate = 0.25; let label = \"say \\\"hi\\\"\"; let on = true",
            EvalMode::Direct,
            &host,
        )
        .unwrap();

    let handler = ShutdownHandler::new(
        first,
        dir.path().join("init.can"),
        Arc::new(MemoryTerminal::new()),
        recording_exit().0,
    );
    handler.save();

    let second = Calculator::default();
    second.load_script(handler.state_path(), &host).unwrap();
    assert_eq!(second.variable("rate"), Some(Value::number(0.25)));
    assert_eq!(
        second.variable("label"),
        Some(Value::Text("say \"hi\"".to_string()))
    );
    assert_eq!(second.variable("on"), Some(Value::Bool(true)));
}

#[cfg(unix)]
#[test]
fn test_termination_signal_saves_and_exits() {
    use cantus_console::batch::{BatchJob, BatchRunner};
    use nix::sys::signal::{raise, Signal};

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("init.can");
    let script = dir.path().join("setup.can");
    fs::write(&script, "let total = 7\nreturn total").unwrap();

    let (exit, exits) = recording_exit();
    let calculator = Arc::new(Calculator::default());
    let terminal = Arc::new(MemoryTerminal::new());
    let handler = Arc::new(ShutdownHandler::new(
        calculator.clone(),
        state.clone(),
        terminal.clone(),
        exit,
    ));

    // Installed before a batch run, the way the binary starts
    let listener = cantus_console::platform::install_termination_handler(handler.clone()).unwrap();
    let job = BatchJob {
        scripts: vec![script],
        expression: None,
    };
    let failures = BatchRunner::new(calculator, terminal.clone(), handler.clone(), "ada")
        .run(&job)
        .unwrap();
    assert_eq!(failures, 0);
    assert!(!handler.is_saved());

    raise(Signal::SIGHUP).unwrap();
    listener.join().unwrap();

    assert!(handler.is_saved());
    assert_eq!(fs::read_to_string(&state).unwrap(), "let total = 7\n");
    assert_eq!(exits.lock().unwrap().as_slice(), &[0]);
}
