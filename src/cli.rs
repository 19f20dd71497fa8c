//! Command line arguments

use std::env;
use std::path::PathBuf;

use crate::config::{paths::resolve_script, AngleMode, EngineConfig, OutputFormat};
use crate::error::Result;

/// Parsed command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsoleArgs {
    /// `-h`/`--help`
    pub show_help: bool,
    /// `--bare`: no startup scripts, no folder bootstrap
    pub bare: bool,
    /// `-b`/`--block` (also implied by `--script`)
    pub always_block: bool,
    /// `-s`/`--script`
    pub exit_after_complete: bool,
    pub significant_figures: Option<bool>,
    pub explicit: Option<bool>,
    pub angle: Option<AngleMode>,
    pub output: Option<OutputFormat>,
    /// Existing script files, in command line order
    pub scripts: Vec<PathBuf>,
    /// Remaining words, evaluated as one expression
    pub expression: Vec<String>,
}

impl ConsoleArgs {
    /// Parse the process arguments
    pub fn from_env() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    /// Parse arguments, not including the program name.
    ///
    /// Flags may appear anywhere. An argument naming an existing file (with
    /// or without the `.can` extension) is a script; anything else becomes
    /// part of the expression.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = ConsoleArgs::default();

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "-h" | "--help" => parsed.show_help = true,
                "--bare" => parsed.bare = true,
                "--sigfigs" => parsed.significant_figures = Some(true),
                "--nosigfigs" => parsed.significant_figures = Some(false),
                "--explicit" => parsed.explicit = Some(true),
                "--implicit" => parsed.explicit = Some(false),
                "-b" | "--block" => parsed.always_block = true,
                "-s" | "--script" => {
                    parsed.always_block = true;
                    parsed.exit_after_complete = true;
                }
                _ => {
                    if let Some(value) = arg.strip_prefix("--anglerepr=") {
                        parsed.angle = Some(value.parse()?);
                    } else if let Some(value) = arg.strip_prefix("--output=") {
                        parsed.output = Some(value.parse()?);
                    } else if let Some(path) = resolve_script(arg) {
                        parsed.scripts.push(path);
                    } else {
                        parsed.expression.push(arg.to_string());
                    }
                }
            }
        }

        Ok(parsed)
    }

    /// Whether the console runs scripts/expressions instead of a session
    pub fn runs_batch(&self) -> bool {
        !self.scripts.is_empty() || !self.expression.is_empty()
    }

    /// Expression words joined with single spaces
    pub fn expression_text(&self) -> Option<String> {
        if self.expression.is_empty() {
            None
        } else {
            Some(self.expression.join(" "))
        }
    }

    /// Overlay command line settings onto engine settings
    pub fn apply(&self, config: &mut EngineConfig) {
        if let Some(sigfigs) = self.significant_figures {
            config.significant_figures = sigfigs;
        }
        if let Some(explicit) = self.explicit {
            config.explicit = explicit;
        }
        if let Some(angle) = self.angle {
            config.angle = angle;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.always_block {
            // Whole input runs without cooperative pauses
            config.max_threads = None;
        }
    }
}

/// Usage text for `--help`
pub fn help_text() -> String {
    let rows = [
        ("[file1] [file2]...", "Run scripts at the specified paths"),
        (
            "-b --block",
            "Run in block mode (execute entire block, only print result on return)",
        ),
        (
            "-s --script",
            "Run in script mode (block mode + exit on first return)",
        ),
        ("--bare", "Do not load any plugins or initialization scripts"),
        ("", ""),
        ("--sigfigs/--nosigfigs", "SigFig mode on/off"),
        ("--explicit/--implicit", "Explicit mode on/off"),
        ("--anglerepr=[deg/rad/grad]", "Set angle representation"),
        ("--output=[raw/math/sci]", "Set output format"),
        ("", ""),
        ("-h --help", "Show this help"),
    ];

    let mut text = String::from("Available commands:\n");
    for (flag, description) in rows {
        if flag.is_empty() {
            text.push('\n');
        } else {
            text.push_str(&format!("{:<29}\t{}\n", flag, description));
        }
    }
    text.push_str("\nEnvironment:\n");
    text.push_str(&format!(
        "{:<29}\tInstall directory (init.can, plugin/, include/, init/)\n",
        crate::config::paths::HOME_ENV
    ));
    text.push_str(&format!(
        "{:<29}\tLog filter, e.g. debug (default: warn)\n",
        crate::LOG_ENV
    ));
    text
}
