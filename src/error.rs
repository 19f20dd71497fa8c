//! Error types and Result aliases for the Cantus console

use std::fmt;
use std::path::PathBuf;

use crate::engine::EvalError;

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Cantus console
#[derive(Debug)]
pub enum Error {
    // === Evaluation errors ===
    /// A fragment failed to evaluate
    Eval(EvalError),

    // === Terminal errors ===
    /// The terminal input stream reached end-of-file while input was required
    InputClosed,

    /// Writing to or positioning on the terminal failed
    TerminalWriteFailed {
        reason: String,
    },

    // === Execution errors ===
    /// The feeder worker is gone and can no longer signal completion
    WorkerStopped,

    /// The feeder no longer accepts fragments (drain was requested)
    FeederClosed,

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    /// A configuration value was not one of the accepted choices
    InvalidSetting {
        setting: String,
        value: String,
    },

    // === Persistence errors ===
    /// Failed to write the saved evaluator state
    StateSaveFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to register OS termination signal listeners
    SignalRegistrationFailed {
        signal: String,
        reason: String,
    },

    // === I/O errors ===
    /// I/O errors
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The evaluator's own message is what users expect on the error stream
            Error::Eval(err) => write!(f, "{}", err),

            Error::InputClosed => {
                write!(f, "Input stream closed")
            }
            Error::TerminalWriteFailed { reason } => {
                write!(f, "Failed to write to terminal: {}", reason)
            }

            Error::WorkerStopped => {
                write!(f, "Execution worker stopped unexpectedly")
            }
            Error::FeederClosed => {
                write!(f, "Execution queue is closed")
            }

            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::InvalidSetting { setting, value } => {
                write!(f, "Invalid value '{}' for setting '{}'", value, setting)
            }

            Error::StateSaveFailed { path, reason } => {
                write!(f, "Failed to save state to '{}': {}", path.display(), reason)
            }
            Error::SignalRegistrationFailed { signal, reason } => {
                write!(f, "Failed to register handler for '{}': {}", signal, reason)
            }

            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Eval(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Error::Eval(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
