//! Platform abstraction layer
//!
//! Termination-signal listeners and account-name lookup. The rest of the
//! console is platform independent.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as os;
#[cfg(windows)]
use windows as os;

use std::env;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::shutdown::ShutdownHandler;

/// Shown when no account name can be found
const FALLBACK_USER: &str = "user";

static USER_NAME: Lazy<String> = Lazy::new(detect_user_name);

/// Name of the account running the console, as shown in the prompt
pub fn user_name() -> &'static str {
    &USER_NAME
}

fn detect_user_name() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .or_else(os::account_name)
        .unwrap_or_else(|| FALLBACK_USER.to_string())
}

/// Save state and exit when the OS asks the process to stop.
///
/// Listeners are registered before this returns, so a signal that arrives
/// afterwards is never missed. The returned thread runs until a signal is
/// received.
///
/// # Errors
///
/// Returns [`Error::SignalRegistrationFailed`](crate::Error::SignalRegistrationFailed)
/// if a listener cannot be installed.
pub fn install_termination_handler(shutdown: Arc<ShutdownHandler>) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut signals = {
        let _context = runtime.enter();
        os::TerminationSignals::register()?
    };
    debug!("Termination signal listeners registered");

    let handle = thread::Builder::new()
        .name("cantus-signals".to_string())
        .spawn(move || {
            let signal = runtime.block_on(signals.recv());
            info!("Received {}, saving state before exit", signal);
            shutdown.terminate(0);
        })?;
    Ok(handle)
}
