//! Configuration management for the Cantus console
//!
//! Engine settings (significant figures, explicit mode, angle and output
//! representation, background pool bound), console settings (prompt user,
//! block marker), and the on-disk locations the console reads and writes.

pub mod loader;
pub mod paths;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use loader::ConfigLoader;
pub use paths::ConsolePaths;

/// Background pool bound used for interactive sessions, small enough to
/// keep the console responsive.
pub const INTERACTIVE_MAX_THREADS: usize = 5;

/// Marker that opens a multi-line block when it ends an input line
pub const DEFAULT_BLOCK_MARKER: &str = ":";

/// Main configuration structure, read from `console.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// User name shown in the prompt; detected from the OS when unset
    pub prompt_user: Option<String>,

    /// Line suffix that opens a multi-line block
    pub block_marker: String,

    /// Evaluator defaults
    pub engine: EngineConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt_user: None,
            block_marker: DEFAULT_BLOCK_MARKER.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Track and round to significant figures
    pub significant_figures: bool,

    /// Require `let` before a name can be assigned
    pub explicit: bool,

    /// Unit used by trigonometric functions
    pub angle: AngleMode,

    /// How numeric results are rendered
    pub output: OutputFormat,

    /// Upper bound on concurrently running background evaluations.
    /// `None` means unbounded.
    pub max_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            significant_figures: false,
            explicit: false,
            angle: AngleMode::Radian,
            output: OutputFormat::Raw,
            max_threads: Some(INTERACTIVE_MAX_THREADS),
        }
    }
}

impl EngineConfig {
    /// Check the values a config file can get wrong
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_threads == Some(0) {
            return Err(Error::ConfigValidationFailed {
                field: "engine.max_threads".to_string(),
                reason: "must be at least 1 (omit it for unbounded)".to_string(),
            });
        }
        Ok(())
    }
}

/// Angle representation for trigonometric functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleMode {
    #[serde(rename = "deg")]
    Degree,
    #[default]
    #[serde(rename = "rad")]
    Radian,
    #[serde(rename = "grad")]
    Gradian,
}

impl AngleMode {
    /// Convert an angle in this representation to radians
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleMode::Degree => value.to_radians(),
            AngleMode::Radian => value,
            AngleMode::Gradian => value * std::f64::consts::PI / 200.0,
        }
    }

    /// Convert radians to this representation
    pub fn from_radians(self, value: f64) -> f64 {
        match self {
            AngleMode::Degree => value.to_degrees(),
            AngleMode::Radian => value,
            AngleMode::Gradian => value * 200.0 / std::f64::consts::PI,
        }
    }
}

impl FromStr for AngleMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deg" | "degree" => Ok(AngleMode::Degree),
            "rad" | "radian" => Ok(AngleMode::Radian),
            "grad" | "gradian" => Ok(AngleMode::Gradian),
            other => Err(Error::InvalidSetting {
                setting: "anglerepr".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AngleMode::Degree => "deg",
            AngleMode::Radian => "rad",
            AngleMode::Gradian => "grad",
        };
        f.write_str(name)
    }
}

/// Output format for numeric results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Shortest decimal representation
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// Simple fractions where a small denominator fits exactly
    #[serde(rename = "math")]
    Math,
    /// Scientific notation
    #[serde(rename = "sci")]
    Scientific,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "math" => Ok(OutputFormat::Math),
            "sci" | "scientific" => Ok(OutputFormat::Scientific),
            other => Err(Error::InvalidSetting {
                setting: "output".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Raw => "raw",
            OutputFormat::Math => "math",
            OutputFormat::Scientific => "sci",
        };
        f.write_str(name)
    }
}
