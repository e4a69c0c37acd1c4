//! Typed wrapper over the `lpass` subcommands this tool uses.
//!
//! Each method builds an argument vector (entry paths and usernames are
//! always separate elements placed after `--`) and hands it to a
//! `CommandRunner`. Secrets are attached as stdin payloads only.

use super::command::{CommandOutput, CommandRunner, ExecError, Invocation};

/// Environment variable pointing lpass at its data directory.
pub const LPASS_HOME_ENV: &str = "LPASS_HOME";

/// Environment variable that makes lpass read secrets from stdin
/// instead of launching a pinentry program.
pub const DISABLE_PINENTRY_ENV: &str = "LPASS_DISABLE_PINENTRY";

/// Marker printed by `lpass status` when no session exists.
pub const NOT_LOGGED_IN: &str = "Not logged in";

/// Login state as reported by `lpass status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedIn,
    LoggedOut,
}

/// lastpass-cli client over an arbitrary runner.
#[derive(Debug, Clone)]
pub struct LpassClient<R> {
    runner: R,
    trust: bool,
}

impl<R: CommandRunner> LpassClient<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            trust: false,
        }
    }

    /// Pass `--trust` on login so lpass remembers the device.
    pub fn with_trust(mut self, trust: bool) -> Self {
        self.trust = trust;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Query the session state.
    ///
    /// `lpass status` exits non-zero when logged out, so only the stdout
    /// marker decides the state.
    pub fn status(&self) -> Result<SessionState, ExecError> {
        let out = self.runner.run(&status_invocation())?;
        if out.stdout.contains(NOT_LOGGED_IN) {
            Ok(SessionState::LoggedOut)
        } else {
            Ok(SessionState::LoggedIn)
        }
    }

    pub fn login(&self, username: &str, master_password: &str) -> Result<CommandOutput, ExecError> {
        self.runner
            .run(&login_invocation(username, self.trust).with_stdin(master_password))
    }

    pub fn show_password(&self, entry: &str) -> Result<CommandOutput, ExecError> {
        self.runner.run(&show_password_invocation(entry))
    }

    pub fn edit_password(&self, entry: &str, new_password: &str) -> Result<CommandOutput, ExecError> {
        self.runner
            .run(&edit_invocation(entry, "--password").with_stdin(new_password))
    }

    pub fn set_username(&self, entry: &str, username: &str) -> Result<CommandOutput, ExecError> {
        self.runner
            .run(&edit_invocation(entry, "--username").with_stdin(username))
    }

    pub fn add_entry(&self, entry: &str, password: &str) -> Result<CommandOutput, ExecError> {
        self.runner.run(&add_invocation(entry).with_stdin(password))
    }

    /// `lpass sync`. Outcome is logged and otherwise ignored.
    pub fn sync(&self) {
        best_effort(&self.runner, &Invocation::new(["sync"]), "sync");
    }

    /// `lpass logout --force`. Outcome is logged and otherwise ignored.
    pub fn logout(&self) {
        best_effort(&self.runner, &Invocation::new(["logout", "--force"]), "logout");
    }
}

fn best_effort<R: CommandRunner>(runner: &R, invocation: &Invocation, what: &str) {
    match runner.run(invocation) {
        Ok(out) if out.success() => tracing::debug!("{what} completed"),
        Ok(out) => tracing::debug!(diagnostic = %out.diagnostic(), "{what} failed, ignoring"),
        Err(e) => tracing::debug!(error = %e, "{what} could not run, ignoring"),
    }
}

// ── Argument vectors ─────────────────────────────────────────────────

fn status_invocation() -> Invocation {
    Invocation::new(["status"])
}

fn login_invocation(username: &str, trust: bool) -> Invocation {
    let mut args = vec!["login"];
    if trust {
        args.push("--trust");
    }
    args.extend(["--", username]);
    Invocation::new(args)
}

fn show_password_invocation(entry: &str) -> Invocation {
    Invocation::new(["show", "--password", "--", entry])
}

fn edit_invocation(entry: &str, field: &str) -> Invocation {
    Invocation::new(["edit", field, "--non-interactive", "--", entry])
}

fn add_invocation(entry: &str) -> Invocation {
    Invocation::new(["add", "--password", "--non-interactive", "--", entry])
}
