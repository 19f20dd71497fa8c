//! Integration Tests for Batch Runs and Startup
//!
//! Script-file and expression arguments, plus the startup sequence that
//! layers `console.toml`, saved state, `init/` scripts and CLI flags.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::fs;
use std::sync::Arc;

use cantus_console::batch::{BatchJob, BatchRunner};
use cantus_console::config::OutputFormat;
use cantus_console::engine::{EngineHost, EvalMode, NullHost};
use cantus_console::terminal::MemoryTerminal;
use cantus_console::{init, initialization_error_message, ConsoleArgs, ConsolePaths, Error};
use test_utils::recording_exit;

fn runner(terminal: &Arc<MemoryTerminal>) -> BatchRunner {
    let dir = tempfile::tempdir().unwrap();
    let calculator = Arc::new(cantus_console::Calculator::default());
    let (exit, _) = recording_exit();
    let shutdown = Arc::new(cantus_console::shutdown::ShutdownHandler::new(
        calculator.clone(),
        dir.path().join("init.can"),
        terminal.clone(),
        exit,
    ));
    BatchRunner::new(calculator, terminal.clone(), shutdown, "ada")
}

#[test]
fn test_script_prints_only_returned_value() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("area.can");
    fs::write(&script, "let w = 3\nlet h = 4\nprint(\"computing\")\nreturn w * h\n").unwrap();

    let terminal = Arc::new(MemoryTerminal::plain());
    let job = BatchJob {
        scripts: vec![script],
        expression: None,
    };
    let failures = runner(&terminal).run(&job).unwrap();

    assert_eq!(failures, 0);
    assert_eq!(terminal.output(), "computing\n12\n");
}

#[test]
fn test_expression_with_separator_shows_final_value() {
    let terminal = Arc::new(MemoryTerminal::plain());
    let job = BatchJob {
        scripts: Vec::new(),
        expression: Some("let x = 2; x + 1".to_string()),
    };
    runner(&terminal).run(&job).unwrap();

    assert_eq!(terminal.output(), "3\n");
}

#[test]
fn test_plain_expression_is_evaluated_directly() {
    let terminal = Arc::new(MemoryTerminal::plain());
    let job = BatchJob {
        scripts: Vec::new(),
        expression: Some("2 ^ 10".to_string()),
    };
    runner(&terminal).run(&job).unwrap();

    assert_eq!(terminal.output(), "1024\n");
}

#[test]
fn test_failures_are_counted_and_do_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.can");
    fs::write(&broken, "return 1 / 0").unwrap();
    let missing = dir.path().join("missing.can");

    let terminal = Arc::new(MemoryTerminal::plain());
    let job = BatchJob {
        scripts: vec![broken, missing],
        expression: Some("40 + 2".to_string()),
    };
    let failures = runner(&terminal).run(&job).unwrap();

    assert_eq!(failures, 2);
    assert!(terminal.errors().starts_with("Division by zero\n"));
    assert_eq!(terminal.output(), "42\n");
}

#[test]
fn test_job_from_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("job.can");
    fs::write(&script, "return 1").unwrap();
    let without_ext = dir.path().join("job");

    let args = ConsoleArgs::parse([
        without_ext.to_str().unwrap(),
        "--sigfigs",
        "1",
        "+",
        "1",
    ])
    .unwrap();
    let job = BatchJob::from(&args);

    assert_eq!(job.scripts, vec![script]);
    assert_eq!(job.expression.as_deref(), Some("1 + 1"));
}

#[test]
fn test_init_layers_saved_state_and_init_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConsolePaths::new(dir.path());
    fs::write(paths.init_script(), "let saved = 9\n").unwrap();
    fs::create_dir_all(paths.init_dir()).unwrap();
    fs::write(paths.init_dir().join("01-extra.can"), "let extra = saved + 1").unwrap();
    fs::write(paths.init_dir().join("02-broken.can"), "let = 1").unwrap();

    let startup = init(&paths, &ConsoleArgs::default());

    assert_eq!(startup.init_errors.len(), 1);
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);
    let extra = startup.evaluator.eval("extra", EvalMode::Direct, &host).unwrap();
    assert_eq!(extra, "10");
    for folder in paths.required_folders() {
        assert!(folder.is_dir(), "{} missing", folder.display());
    }
}

#[test]
fn test_bare_skips_state_and_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConsolePaths::new(dir.path());
    fs::write(paths.init_script(), "let saved = 9\n").unwrap();

    let args = ConsoleArgs::parse(["--bare"]).unwrap();
    let startup = init(&paths, &args);

    assert!(startup.init_errors.is_empty());
    let host: Arc<dyn EngineHost> = Arc::new(NullHost);
    assert!(startup.evaluator.eval("saved", EvalMode::Direct, &host).is_err());
    assert!(!paths.init_dir().exists());
}

#[test]
fn test_command_line_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ConsolePaths::new(dir.path());
    fs::write(
        dir.path().join("console.toml"),
        "prompt_user = \"grace\"\nblock_marker = \"::\"\n\n[engine]\noutput = \"sci\"\nexplicit = true\n",
    )
    .unwrap();

    let args = ConsoleArgs::parse(["--bare", "--output=math", "--block"]).unwrap();
    let startup = init(&paths, &args);
    let engine = startup.evaluator.config();

    assert_eq!(engine.output, OutputFormat::Math);
    assert!(engine.explicit);
    assert_eq!(engine.max_threads, None);

    let options = startup.session_options(&args);
    assert_eq!(options.user, "grace");
    assert_eq!(options.block_marker, "::");
    assert!(options.always_block);
    assert!(!options.exit_after_complete);
}

#[test]
fn test_initialization_error_message() {
    let message = initialization_error_message(&Error::InputClosed);
    assert_eq!(message, "Initialization Error:\nInput stream closed");
}
