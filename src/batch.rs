//! Non-interactive execution of script files and command line expressions

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::ConsoleArgs;
use crate::engine::{EngineHost, EvalMode, Evaluator};
use crate::error::{Error, Result};
use crate::session::{ConsoleHost, SessionState};
use crate::shutdown::ShutdownHandler;
use crate::terminal::{Renderer, Terminal};

/// What to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchJob {
    /// Script files, each evaluated for its returned value
    pub scripts: Vec<PathBuf>,
    /// Expression assembled from leftover command line words
    pub expression: Option<String>,
}

impl From<&ConsoleArgs> for BatchJob {
    fn from(args: &ConsoleArgs) -> Self {
        Self {
            scripts: args.scripts.clone(),
            expression: args.expression_text(),
        }
    }
}

/// Runs a [`BatchJob`] against an evaluator, printing results to the
/// terminal and errors to its error stream
pub struct BatchRunner {
    evaluator: Arc<dyn Evaluator>,
    renderer: Arc<Renderer>,
    host: Arc<dyn EngineHost>,
}

impl BatchRunner {
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        terminal: Arc<dyn Terminal>,
        shutdown: Arc<ShutdownHandler>,
        user: &str,
    ) -> Self {
        let renderer = Arc::new(Renderer::new(terminal));
        let session = Arc::new(SessionState::new(user, false, false));
        let host: Arc<dyn EngineHost> = Arc::new(ConsoleHost::new(
            session,
            Arc::clone(&renderer),
            shutdown,
        ));
        Self {
            evaluator,
            renderer,
            host,
        }
    }

    /// Run every script, then the expression. Returns how many failed;
    /// failures never stop the remaining work.
    pub fn run(&self, job: &BatchJob) -> Result<usize> {
        let mut failures = 0;

        for script in &job.scripts {
            debug!("Running script {}", script.display());
            let outcome = fs::read_to_string(script)
                .map_err(Error::from)
                .and_then(|source| self.evaluate(&source, EvalMode::ReturnedOnly));
            if !self.show(outcome)? {
                failures += 1;
            }
        }

        if let Some(expression) = &job.expression {
            // Statement separators mean a small program: show only its value
            let mode = if expression.contains(';') {
                EvalMode::ReturnedOnly
            } else {
                EvalMode::Direct
            };
            let outcome = self.evaluate(expression, mode);
            if !self.show(outcome)? {
                failures += 1;
            }
        }

        Ok(failures)
    }

    fn evaluate(&self, source: &str, mode: EvalMode) -> Result<String> {
        Ok(self.evaluator.eval(source, mode, &self.host)?)
    }

    fn show(&self, outcome: Result<String>) -> Result<bool> {
        match outcome {
            Ok(result) => {
                if !result.is_empty() {
                    self.renderer.write_line(&result)?;
                }
                Ok(true)
            }
            Err(e) => {
                self.renderer.write_error_line(&e.to_string())?;
                Ok(false)
            }
        }
    }
}
