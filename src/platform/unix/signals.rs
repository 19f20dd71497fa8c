//! Unix termination signals

use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::error::{Error, Result};

/// Listeners for the signals that end an interactive session
pub(crate) struct TerminationSignals {
    hangup: Signal,
    terminate: Signal,
    interrupt: Signal,
}

fn listen(kind: SignalKind, name: &str) -> Result<Signal> {
    signal(kind).map_err(|e| Error::SignalRegistrationFailed {
        signal: name.to_string(),
        reason: e.to_string(),
    })
}

impl TerminationSignals {
    /// Must be called inside a tokio runtime context
    pub(crate) fn register() -> Result<Self> {
        Ok(Self {
            hangup: listen(SignalKind::hangup(), "SIGHUP")?,
            terminate: listen(SignalKind::terminate(), "SIGTERM")?,
            interrupt: listen(SignalKind::interrupt(), "SIGINT")?,
        })
    }

    /// Wait for the first termination signal and name it
    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }
}
