//! CLI module: Clap argument parser, secret sourcing, and output helpers.

pub mod output;
pub mod run;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{LpassCredError, Result};
use crate::operation::{Action, ModuleArgs, OperationRequest};

/// Environment variable holding the LastPass master password.
pub const PASSWORD_ENV: &str = "LPASS_CRED_PASSWORD";
/// Environment variable holding the new password for `update`.
pub const NEW_PASSWORD_ENV: &str = "LPASS_CRED_NEW_PASSWORD";
/// Environment variable holding the entry password for `create`.
pub const SECRET_PASSWORD_ENV: &str = "LPASS_CRED_SECRET_PASSWORD";

/// lpass-cred: manage LastPass entries through lastpass-cli.
///
/// Secrets are never accepted as flags. They come from an args file,
/// the LPASS_CRED_* environment variables, or an interactive prompt.
#[derive(Parser)]
#[command(
    name = "lpass-cred",
    about = "Retrieve, update, or create LastPass entries via lastpass-cli",
    version
)]
pub struct Cli {
    /// LastPass account username
    #[arg(short, long, env = "LPASS_CRED_USERNAME")]
    pub username: Option<String>,

    /// Entry path (e.g. "Shared-Ops/Service-Accounts/deploy")
    #[arg(short, long)]
    pub entry: Option<String>,

    /// Action to perform
    #[arg(short, long, value_enum)]
    pub action: Option<Action>,

    /// Username to store on a newly created entry
    #[arg(long)]
    pub secret_user: Option<String>,

    /// JSON file with module arguments (username, password, entry, action, ...)
    #[arg(long)]
    pub args_file: Option<PathBuf>,

    /// Config file (default: ./.lpass-cred.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// lastpass-cli binary
    #[arg(long, env = "LPASS_CRED_BIN")]
    pub lpass_bin: Option<String>,

    /// Timeout for each lpass call, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory lpass uses for its session data (LPASS_HOME)
    #[arg(long)]
    pub lpass_home: Option<PathBuf>,

    /// Skip `lpass sync` after update/create
    #[arg(long)]
    pub no_sync: bool,

    /// Leave the lpass session logged in afterwards
    #[arg(long)]
    pub keep_session: bool,

    /// Ask lpass to trust this device on login
    #[arg(long)]
    pub trust: bool,

    /// Save the master password to the OS keyring after success
    /// (needs the `keyring-store` feature)
    #[arg(long)]
    pub remember: bool,

    /// Remove the master password from the OS keyring afterwards
    /// (needs the `keyring-store` feature)
    #[arg(long, conflicts_with = "remember")]
    pub forget: bool,

    /// Result format on stdout
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object
    Json,
    /// Human-readable lines
    Text,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load settings and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_file(path)?,
        None => Settings::load(&std::env::current_dir()?)?,
    };

    if let Some(bin) = &cli.lpass_bin {
        settings.lpass_bin = bin.clone();
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            return Err(LpassCredError::ConfigError(
                "--timeout must be greater than zero".into(),
            ));
        }
        settings.timeout_secs = secs;
    }
    if let Some(dir) = &cli.lpass_home {
        settings.lpass_home = Some(dir.clone());
    }
    if cli.no_sync {
        settings.sync_after_write = false;
    }
    if cli.keep_session {
        settings.logout_after = false;
    }
    if cli.trust {
        settings.trust_login = true;
    }

    Ok(settings)
}

/// Assemble the request from flags, the args file, and secret sources.
///
/// Flags win over the args file. Missing values are left empty so that
/// `OperationRequest::validate` reports them uniformly.
pub fn build_request(cli: &Cli) -> Result<OperationRequest> {
    let mut args = match &cli.args_file {
        Some(path) => ModuleArgs::load(path)?,
        None => ModuleArgs::default(),
    };

    let username = Zeroizing::new(
        cli.username
            .clone()
            .or_else(|| args.username.take())
            .unwrap_or_default(),
    );
    let entry = cli
        .entry
        .clone()
        .or_else(|| args.entry.take())
        .unwrap_or_default();
    let action = cli
        .action
        .or(args.action)
        .ok_or_else(|| LpassCredError::Validation("action must be provided".into()))?;

    let master = if username.is_empty() {
        Zeroizing::new(String::new())
    } else {
        master_password(&username, args.password.take())?
    };

    let mut request = OperationRequest::new(&username, &master, &entry, action);
    request.new_password = args
        .new_password
        .take()
        .or_else(|| env_secret(NEW_PASSWORD_ENV))
        .map(Zeroizing::new);
    request.secret_password = args
        .secret_password
        .take()
        .or_else(|| env_secret(SECRET_PASSWORD_ENV))
        .map(Zeroizing::new);
    request.secret_user = cli.secret_user.clone().or_else(|| args.secret_user.take());

    Ok(request)
}

/// Get the master password, trying in order:
/// 1. the args file
/// 2. `LPASS_CRED_PASSWORD` env var
/// 3. OS keyring (if compiled with `keyring-store` feature)
/// 4. Interactive prompt, when stdin is a terminal
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn master_password(username: &str, from_args: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(pw) = from_args.filter(|p| !p.is_empty()) {
        return Ok(Zeroizing::new(pw));
    }

    if let Some(pw) = env_secret(PASSWORD_ENV) {
        return Ok(Zeroizing::new(pw));
    }

    #[cfg(feature = "keyring-store")]
    match crate::keyring::get_password(username) {
        Ok(Some(pw)) => return Ok(Zeroizing::new(pw)),
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "keyring unavailable"),
    }

    if !io::stdin().is_terminal() {
        return Err(LpassCredError::Validation(format!(
            "password must be provided (args file, {PASSWORD_ENV}, or a terminal prompt)"
        )));
    }

    let pw = dialoguer::Password::new()
        .with_prompt(format!("LastPass master password for {username}"))
        .interact()
        .map_err(|e| LpassCredError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
