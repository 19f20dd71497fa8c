//! Install-directory layout
//!
//! The console keeps its saved state and startup scripts beside the
//! executable (or under `CANTUS_HOME` when that is set).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the install directory
pub const HOME_ENV: &str = "CANTUS_HOME";

/// Saved evaluator state, rewritten on every shutdown
pub const INIT_SCRIPT: &str = "init.can";

/// Extension appended when a script argument names no existing file
pub const SCRIPT_EXTENSION: &str = "can";

/// Locations of everything the console reads or writes on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolePaths {
    root: PathBuf,
}

impl ConsolePaths {
    /// Use `root` as the install directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the install directory: `CANTUS_HOME`, then the executable's
    /// directory, then the platform data directory, then the working directory.
    pub fn discover() -> Self {
        if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::new(home);
        }

        if let Some(dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            return Self::new(dir);
        }

        if let Some(data) = dirs::data_dir() {
            return Self::new(data.join("cantus"));
        }

        Self::new(env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Install directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saved evaluator state
    pub fn init_script(&self) -> PathBuf {
        self.root.join(INIT_SCRIPT)
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.root.join("plugin")
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    /// Directory of extra startup scripts, run after `init.can`
    pub fn init_dir(&self) -> PathBuf {
        self.root.join("init")
    }

    /// Folders created on startup when missing
    pub fn required_folders(&self) -> [PathBuf; 3] {
        [self.plugin_dir(), self.include_dir(), self.init_dir()]
    }

    /// Create the required folders. Failures are logged and ignored.
    pub fn bootstrap(&self) {
        for dir in self.required_folders() {
            if dir.is_dir() {
                continue;
            }
            match fs::create_dir_all(&dir) {
                Ok(()) => debug!("Created {}", dir.display()),
                Err(e) => debug!("Could not create {}: {}", dir.display(), e),
            }
        }
    }

    /// Startup scripts in `init/`, sorted by file name
    pub fn init_scripts(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.init_dir()) else {
            return Vec::new();
        };

        let mut scripts: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION)
            })
            .collect();
        scripts.sort();
        scripts
    }
}

/// Resolve a script argument: the path itself, or the path with `.can` appended
pub fn resolve_script(arg: &str) -> Option<PathBuf> {
    let direct = PathBuf::from(arg);
    if direct.is_file() {
        return Some(direct);
    }

    let with_ext = PathBuf::from(format!("{}.{}", arg, SCRIPT_EXTENSION));
    with_ext.is_file().then_some(with_ext)
}
