use thiserror::Error;

/// All errors that can occur in lpass-cred.
#[derive(Debug, Error)]
pub enum LpassCredError {
    // --- Operation taxonomy ---
    #[error("validation error: {0}")]
    Validation(String),

    #[error("login error: {0}")]
    Login(String),

    #[error("operation error: {0}")]
    Operation(String),

    #[error("environment error: {0}")]
    Environment(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Coarse classification reported alongside a failed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Login,
    Operation,
    Environment,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Login => "login",
            ErrorKind::Operation => "operation",
            ErrorKind::Environment => "environment",
            ErrorKind::Internal => "internal",
        }
    }
}

impl LpassCredError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LpassCredError::Validation(_) => ErrorKind::Validation,
            LpassCredError::Login(_) => ErrorKind::Login,
            LpassCredError::Operation(_) => ErrorKind::Operation,
            LpassCredError::Environment(_) => ErrorKind::Environment,
            _ => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for lpass-cred results.
pub type Result<T> = std::result::Result<T, LpassCredError>;
