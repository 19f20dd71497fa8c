//! Configuration File Loading
//!
//! Reads `console.toml` from the install directory, falling back to
//! defaults when the file is missing or unusable.

use std::fs;
use std::path::{Path, PathBuf};

use super::ConsoleConfig;
use crate::error::{Error, Result};

/// Name of the configuration file inside the install directory
pub const CONFIG_FILE_NAME: &str = "console.toml";

/// Configuration file loader
pub struct ConfigLoader {
    /// Path of the configuration file
    path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the configuration file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Path this loader reads from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration.
    ///
    /// A missing file yields the defaults; unreadable, malformed or invalid
    /// files are errors.
    pub fn load(&self) -> Result<ConsoleConfig> {
        if !self.path.exists() {
            debug!("No config at {}, using defaults", self.path.display());
            return Ok(ConsoleConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::ConfigLoadFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let config = Self::parse(&content)?;
        Self::validate(&config)?;
        info!("Loaded configuration from {}", self.path.display());
        Ok(config)
    }

    /// Load the configuration, logging and falling back to defaults on error
    pub fn load_or_default(&self) -> ConsoleConfig {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("{}. Using defaults", e);
                ConsoleConfig::default()
            }
        }
    }

    /// Parse TOML configuration text
    pub fn parse(content: &str) -> Result<ConsoleConfig> {
        toml::from_str(content).map_err(|e| Error::ConfigParseFailed {
            format: "TOML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate configuration
    fn validate(config: &ConsoleConfig) -> Result<()> {
        if config.block_marker.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "block_marker".to_string(),
                reason: "Block marker cannot be empty".to_string(),
            });
        }

        if let Some(user) = &config.prompt_user {
            if user.chars().any(char::is_control) {
                return Err(Error::ConfigValidationFailed {
                    field: "prompt_user".to_string(),
                    reason: "Prompt user cannot contain control characters".to_string(),
                });
            }
        }

        config.engine.validate()
    }
}
