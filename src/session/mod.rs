//! Interactive session
//!
//! The [`SessionController`] owns the foreground read loop. Lines are either
//! evaluated directly (normal mode) or handed to the feeder worker one at a
//! time (block mode), in which case the loop waits for the worker before
//! reading the next line. A pump thread consumes feeder notifications and
//! renders completed blocks.
//!
//! ```text
//! terminal ──> read loop ──┬─> evaluator (normal mode)
//!                          └─> coordinator ──> feeder worker ──> evaluator
//!                                   ^                 │
//!                                   └──── pump <──────┘ FeederEvent
//! ```

pub mod host;
pub mod state;

pub use host::ConsoleHost;
pub use state::{Prompt, SessionMode, SessionState};

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::{ConsolePaths, DEFAULT_BLOCK_MARKER};
use crate::engine::{EngineHost, EvalMode, Evaluator, NullHost};
use crate::error::{Error, Result};
use crate::execution::{ExecutionCoordinator, ExecutionRequest, FeederEvent, ScriptFeeder};
use crate::shutdown::ShutdownHandler;
use crate::terminal::{Renderer, Terminal};

/// How a session behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Name shown in the prompt
    pub user: String,
    /// Line suffix that opens a block
    pub block_marker: String,
    /// Every line goes to the feeder; blank lines do not leave block mode
    pub always_block: bool,
    /// Exit after the first block completes
    pub exit_after_complete: bool,
    /// Print the welcome line before the first prompt
    pub banner: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user: crate::platform::user_name().to_string(),
            block_marker: DEFAULT_BLOCK_MARKER.to_string(),
            always_block: false,
            exit_after_complete: false,
            banner: true,
        }
    }
}

/// Foreground loop of an interactive console session
pub struct SessionController {
    state: Arc<SessionState>,
    terminal: Arc<dyn Terminal>,
    renderer: Arc<Renderer>,
    evaluator: Arc<dyn Evaluator>,
    host: Arc<dyn EngineHost>,
    shutdown: Arc<ShutdownHandler>,
    block_marker: String,
    banner: bool,
}

impl SessionController {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        terminal: Arc<dyn Terminal>,
        shutdown: Arc<ShutdownHandler>,
        options: SessionOptions,
    ) -> Self {
        let state = Arc::new(SessionState::new(
            options.user,
            options.always_block,
            options.exit_after_complete,
        ));
        let renderer = Arc::new(Renderer::new(Arc::clone(&terminal)));
        let host: Arc<dyn EngineHost> = Arc::new(ConsoleHost::new(
            Arc::clone(&state),
            Arc::clone(&renderer),
            Arc::clone(&shutdown),
        ));

        Self {
            state,
            terminal,
            renderer,
            evaluator,
            host,
            shutdown,
            block_marker: options.block_marker,
            banner: options.banner,
        }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Run until the terminal reports end of input, then drain the worker
    /// and save state.
    pub fn run(self) -> Result<()> {
        if self.banner {
            self.renderer
                .write_line(&format!("Welcome to Cantus Console v{}", crate::VERSION))?;
        }

        let (feeder, events) =
            ScriptFeeder::start(Arc::clone(&self.evaluator), Arc::clone(&self.host))?;
        let coordinator = Arc::new(ExecutionCoordinator::new(Box::new(feeder)));

        let pump = Pump {
            coordinator: Arc::clone(&coordinator),
            state: Arc::clone(&self.state),
            renderer: Arc::clone(&self.renderer),
            shutdown: Arc::clone(&self.shutdown),
        }
        .spawn(events)?;

        coordinator.begin_execution();
        self.prompt();
        self.read_loop(&coordinator);

        info!("End of input, draining queued work");
        coordinator.end_after_queue_done();
        if pump.join().is_err() {
            error!("Notification pump panicked");
        }

        self.shutdown.save();
        Ok(())
    }

    fn read_loop(&self, coordinator: &ExecutionCoordinator) {
        loop {
            self.state.set_prompted(false);
            let line = match self.terminal.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read from terminal: {}", e);
                    break;
                }
            };
            self.renderer.mark_line_terminated();

            let fragment = self.strip_block_marker(&line);
            let outcome = match self.state.mode() {
                SessionMode::Block => coordinator.append(ExecutionRequest::blocking(fragment)),
                SessionMode::Normal => self.evaluate_direct(&fragment),
            };
            if let Err(e) = outcome {
                self.report(&e);
            }

            if line.trim().is_empty() {
                self.state.leave_block();
            }
            if !self.state.is_prompted() {
                self.prompt();
            }
        }
    }

    /// A line ending in the marker opens a block; the marker is not source
    fn strip_block_marker(&self, line: &str) -> String {
        match line.strip_suffix(self.block_marker.as_str()) {
            Some(fragment) => {
                self.state.enter_block();
                fragment.to_string()
            }
            None => line.to_string(),
        }
    }

    fn evaluate_direct(&self, line: &str) -> Result<()> {
        let result = self.evaluator.eval(line, EvalMode::Direct, &self.host)?;
        if !result.is_empty() {
            self.renderer.write_line(&result)?;
        }
        Ok(())
    }

    fn report(&self, e: &Error) {
        if let Err(write_err) = self.renderer.write_error_line(&e.to_string()) {
            warn!("Failed to report error '{}': {}", e, write_err);
        }
    }

    fn prompt(&self) {
        if let Err(e) = self.renderer.print_prompt(&self.state) {
            warn!("Failed to print prompt: {}", e);
        }
    }
}

/// Single consumer of feeder notifications
struct Pump {
    coordinator: Arc<ExecutionCoordinator>,
    state: Arc<SessionState>,
    renderer: Arc<Renderer>,
    shutdown: Arc<ShutdownHandler>,
}

impl Pump {
    fn spawn(self, events: UnboundedReceiver<FeederEvent>) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("cantus-pump".to_string())
            .spawn(move || self.run(events))?;
        Ok(handle)
    }

    fn run(self, mut events: UnboundedReceiver<FeederEvent>) {
        while let Some(event) = events.blocking_recv() {
            match event {
                FeederEvent::Completed(result) => {
                    let shown = self.renderer.print_result(&result, &self.state);
                    self.finish_block(shown);
                }
                FeederEvent::Failed(message) => {
                    let shown = self.renderer.print_failure(&message, &self.state);
                    self.finish_block(shown);
                }
                FeederEvent::Waiting => self.coordinator.on_waiting(),
            }
        }
        debug!("Feeder event stream closed");
    }

    /// Return to the resting mode, re-issue the prompt and resume the worker
    fn finish_block(&self, shown: Result<()>) {
        if let Err(e) = shown {
            warn!("Failed to render block outcome: {}", e);
        }

        self.state.reset_after_completion();
        if self.state.exit_after_complete() {
            self.shutdown.terminate(0);
        }

        if let Err(e) = self.renderer.print_prompt(&self.state) {
            warn!("Failed to print prompt: {}", e);
        }
        self.coordinator.begin_execution();
    }
}

/// Reload saved definitions and run startup scripts.
///
/// Runs `init.can`, then every script in `init/` in name order. A failing
/// script does not stop the others; every failure is returned.
pub fn reinitialize(evaluator: &dyn Evaluator, paths: &ConsolePaths) -> Vec<Error> {
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);

    let mut scripts: Vec<PathBuf> = Vec::new();
    let saved = paths.init_script();
    if saved.is_file() {
        scripts.push(saved);
    }
    scripts.extend(paths.init_scripts());

    scripts
        .into_iter()
        .filter_map(|script| {
            debug!("Running startup script {}", script.display());
            evaluator.load_script(&script, &host).err()
        })
        .collect()
}
