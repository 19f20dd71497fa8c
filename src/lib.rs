//! Cantus Console - interactive front end for the Cantus expression evaluator
//!
//! This library provides the session machinery behind the `cantus` binary:
//! a line-oriented console that evaluates input directly or, in block mode,
//! hands it to a background worker while keeping the prompt, asynchronous
//! output and input requests from the evaluated code coherent on one
//! terminal.
//!
//! ## Module Organization
//!
//! - [`session`] - Read loop, session state, notification pump, engine host
//! - [`execution`] - Feeder worker and the blocking submission handshake
//! - [`terminal`] - Terminal backends, prompt-aware renderer, input mediator
//! - [`engine`] - Evaluator contract and the bundled [`Calculator`]
//! - [`shutdown`] - Idempotent state save on every exit path
//! - [`platform`] - OS termination signals and account name lookup
//! - [`config`] - `console.toml`, engine settings, install layout
//! - [`cli`] - Command line flags and help text
//! - [`batch`] - Script-file and one-shot expression runs
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Threads
//!
//! - **Foreground:** reads terminal lines, evaluates normal-mode input
//! - **Feeder worker:** runs block-mode input; may block on terminal input
//! - **Pump:** consumes feeder notifications (`tokio::sync::mpsc`) and
//!   renders finished blocks
//! - **Signals:** a current-thread tokio runtime waiting for termination
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cantus_console::{init, ConsoleArgs, ConsolePaths, SessionController};
//! use cantus_console::shutdown::{process_exit, ShutdownHandler};
//! use cantus_console::terminal::{StdTerminal, Terminal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = ConsoleArgs::from_env()?;
//! let paths = ConsolePaths::discover();
//! let startup = init(&paths, &args);
//!
//! let terminal: Arc<dyn Terminal> = Arc::new(StdTerminal::new());
//! let shutdown = Arc::new(ShutdownHandler::new(
//!     startup.evaluator.clone(),
//!     paths.init_script(),
//!     terminal.clone(),
//!     process_exit(),
//! ));
//! let options = startup.session_options(&args);
//! SessionController::new(startup.evaluator, terminal, shutdown, options).run()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod platform;
pub mod session;
pub mod shutdown;
pub mod terminal;

use std::sync::Arc;

pub use cli::ConsoleArgs;
pub use config::{ConfigLoader, ConsoleConfig, ConsolePaths, EngineConfig};
pub use engine::{Calculator, Evaluator};
pub use error::{Error, Result};
pub use session::{SessionController, SessionOptions};

/// The current version of Cantus Console from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CANTUS_LOG";

/// Configured evaluator, ready for a session or batch run
pub struct Startup {
    pub config: ConsoleConfig,
    pub evaluator: Arc<dyn Evaluator>,
    /// Startup scripts that failed; the console still starts
    pub init_errors: Vec<Error>,
}

impl Startup {
    /// Session options from the config file and command line
    pub fn session_options(&self, args: &ConsoleArgs) -> SessionOptions {
        let mut options = SessionOptions {
            block_marker: self.config.block_marker.clone(),
            always_block: args.always_block,
            exit_after_complete: args.exit_after_complete,
            ..SessionOptions::default()
        };
        if let Some(user) = &self.config.prompt_user {
            options.user = user.clone();
        }
        options
    }
}

/// Build the evaluator for a console run
///
/// Settings are layered: built-in defaults, then `console.toml`, then
/// command line flags. Unless `--bare` is given, saved definitions and
/// `init/` scripts are loaded in between and the install folders are
/// created.
///
/// # Examples
///
/// ```no_run
/// use cantus_console::{init, ConsoleArgs, ConsolePaths};
///
/// let args = ConsoleArgs::parse(["--bare", "--sigfigs"]).unwrap();
/// let startup = init(&ConsolePaths::discover(), &args);
/// assert!(startup.evaluator.config().significant_figures);
/// ```
pub fn init(paths: &ConsolePaths, args: &ConsoleArgs) -> Startup {
    info!("Initializing {} v{} in {}", NAME, VERSION, paths.root().display());

    let config = ConfigLoader::in_dir(paths.root()).load_or_default();
    let evaluator: Arc<dyn Evaluator> = Arc::new(Calculator::new(config.engine.clone()));

    let mut init_errors = Vec::new();
    if !args.bare {
        init_errors = session::reinitialize(evaluator.as_ref(), paths);
        paths.bootstrap();
    }

    let mut engine = evaluator.config();
    args.apply(&mut engine);
    evaluator.set_config(engine);

    Startup {
        config,
        evaluator,
        init_errors,
    }
}

/// Message shown for a startup script failure
pub fn initialization_error_message(error: &Error) -> String {
    format!("Initialization Error:\n{}", error)
}
