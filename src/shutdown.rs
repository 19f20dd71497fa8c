//! Saving evaluator state on the way out
//!
//! Every exit path (termination signals, `exit()` from evaluated code,
//! script-mode completion, end of input) funnels into
//! [`ShutdownHandler::save`]. The save runs at most once; callers that race
//! it wait for the first one to finish.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use crate::engine::Evaluator;
use crate::error::{Error, Result};
use crate::terminal::Terminal;

/// Printed when the state file cannot be written
pub const SAVE_FAILED_MESSAGE: &str =
    "Error: Failed to save user data. Variable, function, and class definitions may be lost.";

/// Ends the process with a status code. Swappable so tests can observe exits.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Exit hook that terminates the process
pub fn process_exit() -> ExitHook {
    Arc::new(|code| std::process::exit(code))
}

pub struct ShutdownHandler {
    evaluator: Arc<dyn Evaluator>,
    state_path: PathBuf,
    terminal: Arc<dyn Terminal>,
    exit: ExitHook,
    saved: Once,
}

impl std::fmt::Debug for ShutdownHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandler")
            .field("state_path", &self.state_path)
            .field("saved", &self.saved.is_completed())
            .finish()
    }
}

impl ShutdownHandler {
    /// # Arguments
    ///
    /// * `evaluator` - whose definitions are saved
    /// * `state_path` - the `init.can` file to write
    /// * `terminal` - where a failed save is reported
    /// * `exit` - called by [`terminate`](Self::terminate) after saving
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        state_path: impl Into<PathBuf>,
        terminal: Arc<dyn Terminal>,
        exit: ExitHook,
    ) -> Self {
        Self {
            evaluator,
            state_path: state_path.into(),
            terminal,
            exit,
            saved: Once::new(),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Whether the state has been saved
    pub fn is_saved(&self) -> bool {
        self.saved.is_completed()
    }

    /// Persist the evaluator's definitions. Failures are reported and
    /// swallowed.
    pub fn save(&self) {
        self.saved.call_once(|| match self.write_state() {
            Ok(()) => info!("Saved session state to {}", self.state_path.display()),
            Err(e) => {
                error!("{}", e);
                // Nothing more to do if even this fails
                let _ = self.terminal.write_raw(&format!("{}\n", SAVE_FAILED_MESSAGE));
            }
        });
    }

    /// Save, then exit with `code`
    pub fn terminate(&self, code: i32) {
        self.save();
        debug!("Exiting with status {}", code);
        (self.exit)(code);
    }

    fn write_state(&self) -> Result<()> {
        let script = self.evaluator.to_script();
        let failed = |e: std::io::Error| Error::StateSaveFailed {
            path: self.state_path.clone(),
            reason: e.to_string(),
        };

        // Sibling temp file so a crash mid-write never truncates the old state
        let staging = self.state_path.with_extension("can.tmp");
        fs::write(&staging, script).map_err(failed)?;
        fs::rename(&staging, &self.state_path).map_err(failed)
    }
}
