//! Test Utilities
//!
//! Shared fixtures for driving a console against an in-memory terminal.

#![allow(dead_code)]

use std::fs;
use std::sync::{Arc, Mutex};

use cantus_console::engine::Calculator;
use cantus_console::shutdown::{ExitHook, ShutdownHandler};
use cantus_console::terminal::MemoryTerminal;
use cantus_console::{EngineConfig, SessionController, SessionOptions};
use tempfile::TempDir;

/// Exit hook that records status codes instead of exiting
pub fn recording_exit() -> (ExitHook, Arc<Mutex<Vec<i32>>>) {
    let exits = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&exits);
    let hook: ExitHook = Arc::new(move |code| sink.lock().unwrap().push(code));
    (hook, exits)
}

/// A calculator, a scripted terminal and a shutdown handler writing into a
/// temporary install directory
pub struct ConsoleFixture {
    pub terminal: Arc<MemoryTerminal>,
    pub calculator: Arc<Calculator>,
    pub shutdown: Arc<ShutdownHandler>,
    pub exits: Arc<Mutex<Vec<i32>>>,
    pub dir: TempDir,
}

impl ConsoleFixture {
    pub fn new(input: &[&str]) -> Self {
        Self::with_config(input, EngineConfig::default())
    }

    pub fn with_config(input: &[&str], config: EngineConfig) -> Self {
        Self::build(MemoryTerminal::new(), input, config)
    }

    /// Same, on a terminal without cursor control
    pub fn plain(input: &[&str]) -> Self {
        Self::build(MemoryTerminal::plain(), input, EngineConfig::default())
    }

    fn build(terminal: MemoryTerminal, input: &[&str], config: EngineConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let terminal = Arc::new(terminal.with_input(input.iter().copied()));
        let calculator = Arc::new(Calculator::new(config));
        let (exit, exits) = recording_exit();
        let shutdown = Arc::new(ShutdownHandler::new(
            calculator.clone(),
            dir.path().join("init.can"),
            terminal.clone(),
            exit,
        ));

        Self {
            terminal,
            calculator,
            shutdown,
            exits,
            dir,
        }
    }

    /// Session options with a fixed user and no banner
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            user: "ada".to_string(),
            banner: false,
            ..SessionOptions::default()
        }
    }

    /// Run a session until the scripted input runs out
    pub fn run(&self, options: SessionOptions) {
        SessionController::new(
            self.calculator.clone(),
            self.terminal.clone(),
            self.shutdown.clone(),
            options,
        )
        .run()
        .unwrap();
    }

    pub fn exits(&self) -> Vec<i32> {
        self.exits.lock().unwrap().clone()
    }

    /// Contents of the saved state file, if one was written
    pub fn saved_state(&self) -> Option<String> {
        fs::read_to_string(self.shutdown.state_path()).ok()
    }
}
