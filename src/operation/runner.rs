//! The credential operation: bootstrap, session, dispatch, teardown.
//!
//! `execute` never returns an error. Every failure becomes a failed
//! `OperationResult` carrying the error kind and lpass's own stderr.
//! `sync` and `logout` are best-effort and never affect the result.

use std::path::PathBuf;

use crate::errors::{LpassCredError, Result};
use crate::lpass::{home, CommandOutput, CommandRunner, ExecError, LpassClient, SessionState};

use super::request::{Action, OperationRequest};
use super::result::OperationResult;

/// Runs one get / update / create against lpass.
pub struct VaultCredentialOperation<R> {
    client: LpassClient<R>,
    home_dir: Option<PathBuf>,
    sync_after_write: bool,
    logout_after: bool,
}

impl<R: CommandRunner> VaultCredentialOperation<R> {
    pub fn new(client: LpassClient<R>) -> Self {
        Self {
            client,
            home_dir: None,
            sync_after_write: true,
            logout_after: true,
        }
    }

    /// Create this directory (mode 0700) before the first lpass call.
    pub fn bootstrap_home(mut self, dir: Option<PathBuf>) -> Self {
        self.home_dir = dir;
        self
    }

    pub fn sync_after_write(mut self, enabled: bool) -> Self {
        self.sync_after_write = enabled;
        self
    }

    pub fn logout_after(mut self, enabled: bool) -> Self {
        self.logout_after = enabled;
        self
    }

    pub fn client(&self) -> &LpassClient<R> {
        &self.client
    }

    /// Run the request to completion and describe the outcome.
    pub fn execute(&self, request: &OperationRequest) -> OperationResult {
        let span = tracing::info_span!("lpass_operation", action = %request.action, entry = %request.entry);
        let _guard = span.enter();

        match self.run_steps(request) {
            Ok(result) => {
                self.teardown();
                tracing::info!(changed = result.changed, "operation succeeded");
                result
            }
            Err(e) => self.abort(&e),
        }
    }

    /// Report a failure that stopped the operation, ending the session
    /// like `execute` does.
    pub fn abort(&self, err: &LpassCredError) -> OperationResult {
        self.teardown();
        tracing::warn!(kind = err.kind().as_str(), error = %err, "operation failed");
        OperationResult::failure(err)
    }

    fn teardown(&self) {
        if self.logout_after {
            self.client.logout();
        }
    }

    fn run_steps(&self, request: &OperationRequest) -> Result<OperationResult> {
        request.validate()?;

        if let Some(dir) = &self.home_dir {
            home::ensure(dir)?;
        }

        self.ensure_session(request)?;

        match request.action {
            Action::Get => self.get(request),
            Action::Update => self.update(request),
            Action::Create => self.create(request),
        }
    }

    fn ensure_session(&self, request: &OperationRequest) -> Result<()> {
        let state = self.client.status().map_err(|e| {
            LpassCredError::Login(format!("failed to query session status: {e}"))
        })?;

        if state == SessionState::LoggedIn {
            tracing::debug!("reusing existing lpass session");
            return Ok(());
        }

        tracing::info!("no lpass session, logging in");
        let out = self
            .client
            .login(&request.username, &request.master_password)
            .map_err(|e| LpassCredError::Login(format!("failed to log in: {e}")))?;
        check(out, "failed to log in", LpassCredError::Login)?;
        Ok(())
    }

    fn get(&self, request: &OperationRequest) -> Result<OperationResult> {
        let out = self.client.show_password(&request.entry);
        let out = operation_output(out, "failed to retrieve password")?;
        Ok(OperationResult::retrieved(out.stdout.trim()))
    }

    fn update(&self, request: &OperationRequest) -> Result<OperationResult> {
        let new_password = request
            .new_password
            .as_deref()
            .ok_or_else(|| LpassCredError::Validation("new_password must be provided".into()))?;

        let out = self.client.edit_password(&request.entry, new_password);
        operation_output(out, "failed to update password")?;

        self.sync();
        Ok(OperationResult::changed("Password updated successfully."))
    }

    fn create(&self, request: &OperationRequest) -> Result<OperationResult> {
        let secret = request.secret_password.as_deref().ok_or_else(|| {
            LpassCredError::Validation("secret_password must be provided".into())
        })?;

        let out = self.client.add_entry(&request.entry, secret);
        operation_output(out, "failed to create entry")?;

        if let Some(user) = &request.secret_user {
            let out = self.client.set_username(&request.entry, user);
            operation_output(out, "entry created but setting its username failed")?;
        }

        self.sync();
        Ok(OperationResult::changed("Entry created successfully."))
    }

    fn sync(&self) {
        if self.sync_after_write {
            self.client.sync();
        }
    }
}

fn operation_output(
    out: std::result::Result<CommandOutput, ExecError>,
    context: &str,
) -> Result<CommandOutput> {
    let out = out.map_err(|e| LpassCredError::Operation(format!("{context}: {e}")))?;
    check(out, context, LpassCredError::Operation)
}

/// Turn a non-zero exit into `wrap("<context>: <stderr>")`.
fn check(
    out: CommandOutput,
    context: &str,
    wrap: fn(String) -> LpassCredError,
) -> Result<CommandOutput> {
    if out.success() {
        Ok(out)
    } else {
        Err(wrap(format!("{context}: {}", out.diagnostic())))
    }
}
