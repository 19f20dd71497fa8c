//! Account lookup through the password database

use nix::unistd::{getuid, User};

pub(crate) fn account_name() -> Option<String> {
    match User::from_uid(getuid()) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => None,
        Err(e) => {
            debug!("Password database lookup failed: {}", e);
            None
        }
    }
}
