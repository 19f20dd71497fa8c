//! Cantus Console - interactive front end for the Cantus expression evaluator

use std::env;
use std::io::{self, IsTerminal};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::SetTitle;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cantus_console::batch::{BatchJob, BatchRunner};
use cantus_console::cli::help_text;
use cantus_console::platform;
use cantus_console::shutdown::{process_exit, ShutdownHandler};
use cantus_console::terminal::{StdTerminal, Terminal};
use cantus_console::{init, initialization_error_message, ConsoleArgs, ConsolePaths};
use cantus_console::{SessionController, LOG_ENV};

fn init_logging() {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = ConsoleArgs::from_env().unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprint!("{}", help_text());
        process::exit(2);
    });
    if args.show_help {
        print!("{}", help_text());
        return Ok(());
    }

    let paths = ConsolePaths::discover();
    let startup = init(&paths, &args);
    for e in &startup.init_errors {
        eprintln!("{}", initialization_error_message(e));
    }

    let terminal: Arc<dyn Terminal> = Arc::new(StdTerminal::new());
    let shutdown = Arc::new(ShutdownHandler::new(
        Arc::clone(&startup.evaluator),
        paths.init_script(),
        Arc::clone(&terminal),
        process_exit(),
    ));

    // Batch runs can be long; a signal during one still saves state
    if let Err(e) = platform::install_termination_handler(Arc::clone(&shutdown)) {
        warn!("{}; state will only be saved on normal exit", e);
    }

    if args.runs_batch() {
        let options = startup.session_options(&args);
        let failures = BatchRunner::new(startup.evaluator, terminal, shutdown, &options.user)
            .run(&BatchJob::from(&args))
            .context("batch run failed")?;
        debug!("Batch run finished with {} failure(s)", failures);
        return Ok(());
    }

    if io::stdout().is_terminal() {
        let _ = execute!(io::stdout(), SetTitle("Cantus Console"));
    }

    let options = startup.session_options(&args);
    SessionController::new(startup.evaluator, terminal, shutdown, options)
        .run()
        .context("console session failed")?;
    Ok(())
}
