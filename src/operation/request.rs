//! Operation inputs: the requested action plus credentials and entry.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{LpassCredError, Result};

/// What to do with the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Print the entry's password
    Get,
    /// Replace the entry's password
    Update,
    /// Add a new entry
    Create,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Get => "get",
            Action::Update => "update",
            Action::Create => "create",
        })
    }
}

/// One fully-sourced request. Secrets are wiped from memory on drop.
#[derive(Clone)]
pub struct OperationRequest {
    pub username: Zeroizing<String>,
    pub master_password: Zeroizing<String>,
    pub entry: String,
    pub action: Action,
    pub new_password: Option<Zeroizing<String>>,
    pub secret_password: Option<Zeroizing<String>>,
    pub secret_user: Option<String>,
}

impl OperationRequest {
    pub fn new(username: &str, master_password: &str, entry: &str, action: Action) -> Self {
        Self {
            username: Zeroizing::new(username.to_string()),
            master_password: Zeroizing::new(master_password.to_string()),
            entry: entry.to_string(),
            action,
            new_password: None,
            secret_password: None,
            secret_user: None,
        }
    }

    pub fn with_new_password(mut self, password: &str) -> Self {
        self.new_password = Some(Zeroizing::new(password.to_string()));
        self
    }

    pub fn with_secret_password(mut self, password: &str) -> Self {
        self.secret_password = Some(Zeroizing::new(password.to_string()));
        self
    }

    pub fn with_secret_user(mut self, user: &str) -> Self {
        self.secret_user = Some(user.to_string());
        self
    }

    /// Check the request before anything touches the vault CLI.
    pub fn validate(&self) -> Result<()> {
        require("username", Some(self.username.as_str()))?;
        require("password", Some(self.master_password.as_str()))?;

        if self.entry.trim().is_empty() {
            return Err(LpassCredError::Validation("entry is required".into()));
        }
        if self.entry.contains('\n') {
            return Err(LpassCredError::Validation(
                "entry must not contain a newline".into(),
            ));
        }

        match self.action {
            Action::Get => {}
            Action::Update => {
                require("new_password", self.new_password.as_deref().map(String::as_str))?;
            }
            Action::Create => {
                require(
                    "secret_password",
                    self.secret_password.as_deref().map(String::as_str),
                )?;
                if let Some(user) = &self.secret_user {
                    require("secret_user", Some(user.as_str()))?;
                }
            }
        }

        if self.secret_user.is_some() && self.action != Action::Create {
            tracing::warn!(action = %self.action, "secret_user is only used by create, ignoring");
        }

        Ok(())
    }
}

/// Reject empty values and values lpass would split at a line break.
fn require(name: &str, value: Option<&str>) -> Result<()> {
    match value {
        None | Some("") => Err(LpassCredError::Validation(format!(
            "{name} must be provided"
        ))),
        Some(v) if v.contains('\n') || v.contains('\r') => Err(LpassCredError::Validation(
            format!("{name} must not contain line breaks"),
        )),
        Some(_) => Ok(()),
    }
}

impl fmt::Debug for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        f.debug_struct("OperationRequest")
            .field("username", &REDACTED)
            .field("master_password", &REDACTED)
            .field("entry", &self.entry)
            .field("action", &self.action)
            .field("new_password", &self.new_password.as_ref().map(|_| REDACTED))
            .field(
                "secret_password",
                &self.secret_password.as_ref().map(|_| REDACTED),
            )
            .field("secret_user", &self.secret_user)
            .finish()
    }
}

/// Module arguments as handed over by an automation controller in a
/// JSON args file. Unknown keys (controller internals) are ignored.
#[derive(Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ModuleArgs {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub entry: Option<String>,
    #[serde(default)]
    #[zeroize(skip)]
    pub action: Option<Action>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub secret_password: Option<String>,
    #[serde(default)]
    pub secret_user: Option<String>,
}

impl fmt::Debug for ModuleArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "<redacted>";
        f.debug_struct("ModuleArgs")
            .field("username", &self.username.as_ref().map(|_| REDACTED))
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("entry", &self.entry)
            .field("action", &self.action)
            .field("new_password", &self.new_password.as_ref().map(|_| REDACTED))
            .field(
                "secret_password",
                &self.secret_password.as_ref().map(|_| REDACTED),
            )
            .field("secret_user", &self.secret_user)
            .finish()
    }
}

impl ModuleArgs {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            LpassCredError::Validation(format!("invalid module arguments: {e}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            LpassCredError::Validation(format!("failed to read {}: {e}", path.display()))
        })?);
        Self::from_json(&contents)
    }
}
