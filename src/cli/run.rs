//! Wire the parsed CLI to a `VaultCredentialOperation` backed by the
//! real `lpass` binary.

use crate::cli::{build_request, load_settings, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::lpass::client::{DISABLE_PINENTRY_ENV, LPASS_HOME_ENV};
use crate::lpass::{home, LpassClient, ProcessRunner};
use crate::operation::{OperationRequest, OperationResult, VaultCredentialOperation};

/// Execute the requested operation. Every failure, including bad
/// configuration, comes back as a failed result.
pub fn execute(cli: &Cli) -> OperationResult {
    match prepare(cli) {
        Ok((settings, request)) => {
            let result = run(&settings, &request);
            update_keyring(cli, &request, &result);
            result
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not prepare operation");
            OperationResult::failure(&e)
        }
    }
}

fn prepare(cli: &Cli) -> Result<(Settings, OperationRequest)> {
    let settings = load_settings(cli)?;
    let request = build_request(cli)?;
    Ok((settings, request))
}

fn run(settings: &Settings, request: &OperationRequest) -> OperationResult {
    let home_dir = home::resolve(settings.lpass_home.as_deref());

    let mut runner =
        ProcessRunner::new(&settings.lpass_bin, settings.timeout()).env(DISABLE_PINENTRY_ENV, "1");
    if let Ok(dir) = &home_dir {
        runner = runner.env(LPASS_HOME_ENV, dir.to_string_lossy());
    }
    tracing::debug!(
        program = runner.program(),
        env = ?runner.env_overlay(),
        timeout_secs = settings.timeout_secs,
        "lpass runner ready"
    );

    let client = LpassClient::new(runner).with_trust(settings.trust_login);
    let operation = VaultCredentialOperation::new(client)
        .sync_after_write(settings.sync_after_write)
        .logout_after(settings.logout_after);

    match home_dir {
        Ok(dir) => operation
            .bootstrap_home(settings.bootstrap_home.then_some(dir))
            .execute(request),
        Err(e) => operation.abort(&e),
    }
}

#[cfg(feature = "keyring-store")]
fn update_keyring(cli: &Cli, request: &OperationRequest, result: &OperationResult) {
    use crate::cli::output;

    if cli.remember && !result.failed {
        match crate::keyring::store_password(&request.username, &request.master_password) {
            Ok(()) => tracing::info!("master password saved to keyring"),
            Err(e) => output::warning(&e.to_string()),
        }
    }
    if cli.forget {
        if let Err(e) = crate::keyring::delete_password(&request.username) {
            output::warning(&e.to_string());
        }
    }
}

#[cfg(not(feature = "keyring-store"))]
fn update_keyring(cli: &Cli, _request: &OperationRequest, _result: &OperationResult) {
    if cli.remember || cli.forget {
        crate::cli::output::warning(
            "--remember/--forget need a build with the `keyring-store` feature; ignoring",
        );
    }
}
