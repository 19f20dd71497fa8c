//! Windows console control events

use tokio::signal::windows::{ctrl_c, ctrl_close, ctrl_logoff, ctrl_shutdown};
use tokio::signal::windows::{CtrlC, CtrlClose, CtrlLogoff, CtrlShutdown};

use crate::error::{Error, Result};

/// Listeners for console close, logoff, shutdown and ctrl-c
pub(crate) struct TerminationSignals {
    close: CtrlClose,
    logoff: CtrlLogoff,
    shutdown: CtrlShutdown,
    interrupt: CtrlC,
}

fn registration_failed(name: &str, e: std::io::Error) -> Error {
    Error::SignalRegistrationFailed {
        signal: name.to_string(),
        reason: e.to_string(),
    }
}

impl TerminationSignals {
    /// Must be called inside a tokio runtime context
    pub(crate) fn register() -> Result<Self> {
        Ok(Self {
            close: ctrl_close().map_err(|e| registration_failed("CTRL_CLOSE", e))?,
            logoff: ctrl_logoff().map_err(|e| registration_failed("CTRL_LOGOFF", e))?,
            shutdown: ctrl_shutdown().map_err(|e| registration_failed("CTRL_SHUTDOWN", e))?,
            interrupt: ctrl_c().map_err(|e| registration_failed("CTRL_C", e))?,
        })
    }

    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.close.recv() => "CTRL_CLOSE",
            _ = self.logoff.recv() => "CTRL_LOGOFF",
            _ = self.shutdown.recv() => "CTRL_SHUTDOWN",
            _ = self.interrupt.recv() => "CTRL_C",
        }
    }
}
