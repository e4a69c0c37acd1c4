//! OS keyring as a source for the LastPass master password.
//!
//! Stores and retrieves the master password from the operating system's
//! secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! Lookups fail soft: callers treat an error like a missing entry and
//! fall back to the next password source.

use crate::errors::{LpassCredError, Result};

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "lpass-cred";

/// Keyring entries are keyed by LastPass account.
fn entry_key(username: &str) -> String {
    format!("lastpass:{username}")
}

fn entry(username: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(SERVICE_NAME, &entry_key(username))
        .map_err(|e| LpassCredError::KeyringError(format!("failed to create keyring entry: {e}")))
}

/// Store the master password for `username`.
pub fn store_password(username: &str, password: &str) -> Result<()> {
    entry(username)?.set_password(password).map_err(|e| {
        LpassCredError::KeyringError(format!("failed to store password in keyring: {e}"))
    })
}

/// Retrieve the master password for `username`.
///
/// Returns `None` if nothing is stored (rather than an error).
pub fn get_password(username: &str) -> Result<Option<String>> {
    match entry(username)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(LpassCredError::KeyringError(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Remove a stored master password. Missing entries are not an error.
pub fn delete_password(username: &str) -> Result<()> {
    match entry(username)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(LpassCredError::KeyringError(format!(
            "failed to delete from keyring: {e}"
        ))),
    }
}
