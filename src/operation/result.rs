//! Operation outcome in the shape automation controllers expect.

use std::fmt;

use serde::{Serialize, Serializer};
use zeroize::Zeroizing;

use crate::errors::{ErrorKind, LpassCredError};

/// Fixed `original_message` value controllers already key on.
pub const ORIGINAL_MESSAGE: &str = "Input parameters received";

/// Result of one operation. Never carries a password unless a `get`
/// succeeded.
#[derive(Serialize)]
pub struct OperationResult {
    /// `true` iff the vault was mutated.
    pub changed: bool,

    pub failed: bool,

    pub original_message: &'static str,

    pub message: String,

    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_secret"
    )]
    pub password: Option<Zeroizing<String>>,

    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_kind")]
    pub error_kind: Option<ErrorKind>,
}

impl OperationResult {
    pub fn retrieved(password: &str) -> Self {
        Self {
            changed: false,
            failed: false,
            original_message: ORIGINAL_MESSAGE,
            message: "Password retrieved successfully.".into(),
            password: Some(Zeroizing::new(password.to_string())),
            error_kind: None,
        }
    }

    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            failed: false,
            original_message: ORIGINAL_MESSAGE,
            message: message.into(),
            password: None,
            error_kind: None,
        }
    }

    /// Any failure reports `changed = false`.
    pub fn failure(err: &LpassCredError) -> Self {
        Self {
            changed: false,
            failed: true,
            original_message: ORIGINAL_MESSAGE,
            message: err.to_string(),
            password: None,
            error_kind: Some(err.kind()),
        }
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    pub fn to_json(&self) -> String {
        // Only strings and bools; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"failed\":true}"))
    }
}

impl fmt::Debug for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationResult")
            .field("changed", &self.changed)
            .field("failed", &self.failed)
            .field("original_message", &self.original_message)
            .field("message", &self.message)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("error_kind", &self.error_kind)
            .finish()
    }
}

fn serialize_secret<S: Serializer>(
    value: &Option<Zeroizing<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(v),
        None => serializer.serialize_none(),
    }
}

fn serialize_kind<S: Serializer>(
    value: &Option<ErrorKind>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(kind) => serializer.serialize_str(kind.as_str()),
        None => serializer.serialize_none(),
    }
}
