//! Evaluation engine contract
//!
//! The console drives any [`Evaluator`]; evaluators talk back through an
//! [`EngineHost`] handed to every call. Notifications (text output, clear
//! requests, exit requests) are one-way; input requests are synchronous and
//! run on whichever thread is evaluating.
//!
//! [`Calculator`] is the bundled evaluator.

pub mod calculator;
mod lexer;
mod parser;
mod pool;
pub mod value;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;

pub use calculator::Calculator;
pub use value::{Number, Value};

/// How the value of a fragment is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Report the value of every statement, one per line
    Direct,
    /// Report only the returned (or final) value
    ReturnedOnly,
}

/// One-way notifications raised by an evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Text to show; may or may not end with a line terminator
    Output(String),
    /// Clear the whole visible terminal
    ClearConsole,
    /// The evaluated code asked the process to exit
    ExitRequested,
}

/// Accepted answers for a confirmation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmVocabulary {
    /// `yes`/`y` and `no`/`n`
    YesNo,
    /// `ok`/`y` and `cancel`/`n`
    OkCancel,
}

impl ConfirmVocabulary {
    /// Interpret a token, ignoring surrounding whitespace and case
    pub fn interpret(self, token: &str) -> Option<bool> {
        let token = token.trim().to_lowercase();
        match (self, token.as_str()) {
            (ConfirmVocabulary::YesNo, "yes" | "y") => Some(true),
            (ConfirmVocabulary::YesNo, "no" | "n") => Some(false),
            (ConfirmVocabulary::OkCancel, "ok" | "y") => Some(true),
            (ConfirmVocabulary::OkCancel, "cancel" | "n") => Some(false),
            _ => None,
        }
    }

    /// Hint shown before every confirmation attempt
    pub fn usage_hint(self) -> &'static str {
        match self {
            ConfirmVocabulary::YesNo => "Please enter 'Y', 'N', 'yes', or 'no'",
            ConfirmVocabulary::OkCancel => "Please enter 'Y', 'N', 'ok', or 'cancel'",
        }
    }
}

/// Kinds of terminal input an evaluator can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRequest {
    ReadLine,
    ReadChar,
    ReadWord,
    Confirm(ConfirmVocabulary),
}

/// Answer to an [`InputRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValue {
    Text(String),
    Char(char),
    Bool(bool),
}

/// Receiver of evaluator notifications and input requests
pub trait EngineHost: Send + Sync {
    /// Deliver a notification. Called on the evaluating thread.
    fn notify(&self, event: EngineEvent);

    /// Answer an input request, blocking until input is available
    fn request_input(&self, request: InputRequest) -> crate::Result<InputValue>;
}

/// Host that drops notifications and has no input.
///
/// Used while running startup scripts, before any terminal is attached.
#[derive(Debug, Default)]
pub struct NullHost;

impl EngineHost for NullHost {
    fn notify(&self, event: EngineEvent) {
        trace!("Dropping engine event without a host: {:?}", event);
    }

    fn request_input(&self, _request: InputRequest) -> crate::Result<InputValue> {
        Err(crate::Error::InputClosed)
    }
}

/// An expression/script evaluation engine
pub trait Evaluator: Send + Sync {
    /// Evaluate `source` and render its value as text
    fn eval(&self, source: &str, mode: EvalMode, host: &Arc<dyn EngineHost>)
        -> Result<String, EvalError>;

    /// Serialize current definitions to a script that recreates them
    fn to_script(&self) -> String;

    /// Current settings
    fn config(&self) -> EngineConfig;

    /// Replace settings
    fn set_config(&self, config: EngineConfig);

    /// Run a script file for its side effects
    fn load_script(&self, path: &Path, host: &Arc<dyn EngineHost>) -> crate::Result<()> {
        let source = fs::read_to_string(path)?;
        self.eval(&source, EvalMode::ReturnedOnly, host)?;
        Ok(())
    }
}

/// Errors raised while evaluating a fragment
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Variable '{0}' is not defined")]
    Undefined(String),

    #[error("Variable '{0}' must be declared with 'let' in explicit mode")]
    Undeclared(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("Type error: {0}")]
    Type(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Input error: {0}")]
    Input(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
