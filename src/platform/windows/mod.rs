//! Windows-specific platform implementations

mod signals;

pub(super) use signals::TerminationSignals;

/// Windows exposes the account through `USERNAME`, already consulted
pub(super) fn account_name() -> Option<String> {
    None
}
