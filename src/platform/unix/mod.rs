//! Unix-specific platform implementations

mod signals;
mod user;

pub(super) use signals::TerminationSignals;
pub(super) use user::account_name;
