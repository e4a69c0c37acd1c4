//! Integration tests for `VaultCredentialOperation` against a scripted
//! lpass runner.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use lpass_cred::errors::{ErrorKind, LpassCredError};
use lpass_cred::lpass::{CommandOutput, CommandRunner, ExecError, Invocation, LpassClient};
use lpass_cred::operation::{Action, OperationRequest, VaultCredentialOperation};
use tempfile::TempDir;

const USER: &str = "ops@example.com";
const MASTER: &str = "m4ster-pw";

enum Reply {
    Exit(i32, &'static str, &'static str),
    Hang,
}

/// Records every invocation and answers by subcommand name.
/// Subcommands without a scripted reply succeed silently.
#[derive(Default)]
struct ScriptedRunner {
    calls: RefCell<Vec<Invocation>>,
    replies: HashMap<&'static str, Reply>,
}

impl ScriptedRunner {
    fn logged_in() -> Self {
        Self::default().reply("status", Reply::Exit(0, "Logged in as ops@example.com.\n", ""))
    }

    fn logged_out() -> Self {
        Self::default().reply("status", Reply::Exit(1, "Not logged in.\n", ""))
    }

    fn reply(mut self, subcommand: &'static str, reply: Reply) -> Self {
        self.replies.insert(subcommand, reply);
        self
    }

    fn subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|inv| inv.args[0].clone())
            .collect()
    }

    fn count(&self, subcommand: &str) -> usize {
        self.subcommands().iter().filter(|s| *s == subcommand).count()
    }

    fn call(&self, subcommand: &str) -> Option<Invocation> {
        self.calls
            .borrow()
            .iter()
            .find(|inv| inv.args[0] == subcommand)
            .cloned()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        self.calls.borrow_mut().push(invocation.clone());
        match self.replies.get(invocation.args[0].as_str()) {
            Some(Reply::Exit(code, out, err)) => Ok(CommandOutput::new(*code, out, err)),
            Some(Reply::Hang) => Err(ExecError::TimedOut(Duration::from_secs(30))),
            None => Ok(CommandOutput::new(0, "", "")),
        }
    }
}

fn operation(runner: &ScriptedRunner) -> VaultCredentialOperation<&ScriptedRunner> {
    VaultCredentialOperation::new(LpassClient::new(runner))
}

fn request(action: Action) -> OperationRequest {
    OperationRequest::new(USER, MASTER, "Shared-IAM/Service-Accounts/deploy", action)
}

// ---------------------------------------------------------------------------
// Validation happens before any vault call
// ---------------------------------------------------------------------------

#[test]
fn update_without_new_password_issues_no_edit() {
    let runner = ScriptedRunner::logged_in();
    let result = operation(&runner).execute(&request(Action::Update));

    assert!(result.failed);
    assert!(!result.changed);
    assert_eq!(result.error_kind, Some(ErrorKind::Validation));
    assert_eq!(runner.count("edit"), 0);
    assert_eq!(runner.count("status"), 0);
}

#[test]
fn create_without_secret_password_issues_no_add() {
    let runner = ScriptedRunner::logged_in();
    let req = request(Action::Create).with_secret_user("svc-deploy");
    let result = operation(&runner).execute(&req);

    assert!(result.failed);
    assert_eq!(result.error_kind, Some(ErrorKind::Validation));
    assert_eq!(runner.count("add"), 0);
}

// ---------------------------------------------------------------------------
// Session handling
// ---------------------------------------------------------------------------

#[test]
fn logged_out_session_logs_in_once_before_action() {
    let runner = ScriptedRunner::logged_out().reply("show", Reply::Exit(0, "S3cr3t\n", ""));
    let result = operation(&runner).execute(&request(Action::Get));

    assert!(!result.failed, "{}", result.message);
    assert_eq!(runner.subcommands(), vec!["status", "login", "show", "logout"]);

    let login = runner.call("login").unwrap();
    assert_eq!(login.args.last().map(String::as_str), Some(USER));
    assert_eq!(login.stdin(), Some("m4ster-pw\n"));
}

#[test]
fn logged_in_session_skips_login() {
    let runner = ScriptedRunner::logged_in().reply("show", Reply::Exit(0, "S3cr3t\n", ""));
    operation(&runner).execute(&request(Action::Get));

    assert_eq!(runner.count("login"), 0);
    assert_eq!(runner.count("show"), 1);
}

#[test]
fn failed_login_reports_login_error_and_stops() {
    let runner = ScriptedRunner::logged_out().reply(
        "login",
        Reply::Exit(1, "", "Error: Invalid username or password.\n"),
    );
    let result = operation(&runner).execute(&request(Action::Get));

    assert!(result.failed);
    assert!(!result.changed);
    assert_eq!(result.error_kind, Some(ErrorKind::Login));
    assert!(result.message.contains("Invalid username or password."));
    assert_eq!(runner.count("show"), 0);
    assert_eq!(runner.count("logout"), 1);
}

#[test]
fn hung_status_is_a_login_error() {
    let runner = ScriptedRunner::default().reply("status", Reply::Hang);
    let result = operation(&runner).execute(&request(Action::Get));

    assert_eq!(result.error_kind, Some(ErrorKind::Login));
    assert!(result.message.contains("timed out"));
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[test]
fn get_returns_trimmed_password() {
    let runner = ScriptedRunner::logged_in().reply("show", Reply::Exit(0, "S3cr3t\n", ""));
    let result = operation(&runner).execute(&request(Action::Get));

    assert!(!result.failed);
    assert!(!result.changed);
    assert_eq!(result.password(), Some("S3cr3t"));
    assert_eq!(result.message, "Password retrieved successfully.");
}

#[test]
fn get_failure_passes_stderr_through() {
    let runner = ScriptedRunner::logged_in().reply(
        "show",
        Reply::Exit(1, "", "Error: Could not find specified account(s).\n"),
    );
    let result = operation(&runner).execute(&request(Action::Get));

    assert!(result.failed);
    assert_eq!(result.error_kind, Some(ErrorKind::Operation));
    assert!(result.password().is_none());
    assert!(result
        .message
        .contains("Could not find specified account(s)."));
}

#[test]
fn update_pipes_new_password_and_syncs() {
    let runner = ScriptedRunner::logged_in();
    let req = request(Action::Update).with_new_password("n3w-pw");
    let result = operation(&runner).execute(&req);

    assert!(!result.failed, "{}", result.message);
    assert!(result.changed);
    assert_eq!(runner.subcommands(), vec!["status", "edit", "sync", "logout"]);

    let edit = runner.call("edit").unwrap();
    assert_eq!(
        edit.args,
        vec![
            "edit",
            "--password",
            "--non-interactive",
            "--",
            "Shared-IAM/Service-Accounts/deploy"
        ]
    );
    assert_eq!(edit.stdin(), Some("n3w-pw\n"));
}

#[test]
fn failed_edit_reports_locked_and_is_unchanged() {
    let runner = ScriptedRunner::logged_in().reply("edit", Reply::Exit(1, "", "locked"));
    let req = request(Action::Update).with_new_password("n3w-pw");
    let result = operation(&runner).execute(&req);

    assert!(result.failed);
    assert!(!result.changed);
    assert!(result.message.contains("locked"));
    assert_eq!(runner.count("sync"), 0);
}

#[test]
fn failed_sync_does_not_fail_update() {
    let runner = ScriptedRunner::logged_in().reply("sync", Reply::Exit(1, "", "network down"));
    let req = request(Action::Update).with_new_password("n3w-pw");
    let result = operation(&runner).execute(&req);

    assert!(!result.failed);
    assert!(result.changed);
}

#[test]
fn sync_can_be_disabled() {
    let runner = ScriptedRunner::logged_in();
    let req = request(Action::Update).with_new_password("n3w-pw");
    operation(&runner).sync_after_write(false).execute(&req);

    assert_eq!(runner.count("sync"), 0);
}

#[test]
fn create_adds_entry_then_sets_username() {
    let runner = ScriptedRunner::logged_in();
    let req = request(Action::Create)
        .with_secret_password("s3cret")
        .with_secret_user("svc-deploy");
    let result = operation(&runner).execute(&req);

    assert!(!result.failed, "{}", result.message);
    assert!(result.changed);
    assert_eq!(result.message, "Entry created successfully.");
    assert_eq!(
        runner.subcommands(),
        vec!["status", "add", "edit", "sync", "logout"]
    );

    let add = runner.call("add").unwrap();
    assert_eq!(add.stdin(), Some("s3cret\n"));
    let edit = runner.call("edit").unwrap();
    assert_eq!(edit.args[1], "--username");
    assert_eq!(edit.stdin(), Some("svc-deploy\n"));
}

#[test]
fn create_failure_is_operation_error() {
    let runner =
        ScriptedRunner::logged_in().reply("add", Reply::Exit(1, "", "Error: entry exists"));
    let req = request(Action::Create).with_secret_password("s3cret");
    let result = operation(&runner).execute(&req);

    assert!(result.failed);
    assert!(!result.changed);
    assert_eq!(result.error_kind, Some(ErrorKind::Operation));
    assert!(result.message.contains("entry exists"));
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[test]
fn logout_runs_once_last_on_success_and_failure() {
    let ok = ScriptedRunner::logged_in().reply("show", Reply::Exit(0, "pw\n", ""));
    operation(&ok).execute(&request(Action::Get));
    assert_eq!(ok.count("logout"), 1);
    assert_eq!(ok.subcommands().last().map(String::as_str), Some("logout"));

    let failing = ScriptedRunner::logged_in().reply("show", Reply::Exit(1, "", "boom"));
    operation(&failing).execute(&request(Action::Get));
    assert_eq!(failing.count("logout"), 1);
    assert_eq!(
        failing.subcommands().last().map(String::as_str),
        Some("logout")
    );

    let logout = ok.call("logout").unwrap();
    assert_eq!(logout.args, vec!["logout", "--force"]);
}

#[test]
fn failing_logout_does_not_change_result() {
    let runner = ScriptedRunner::logged_in()
        .reply("show", Reply::Exit(0, "S3cr3t\n", ""))
        .reply("logout", Reply::Exit(1, "", "logout exploded"));
    let result = operation(&runner).execute(&request(Action::Get));

    assert!(!result.failed);
    assert_eq!(result.password(), Some("S3cr3t"));
    assert!(!result.message.contains("logout"));
}

#[test]
fn keep_session_skips_logout() {
    let runner = ScriptedRunner::logged_in().reply("show", Reply::Exit(0, "pw\n", ""));
    operation(&runner)
        .logout_after(false)
        .execute(&request(Action::Get));
    assert_eq!(runner.count("logout"), 0);
}

// ---------------------------------------------------------------------------
// Secret hygiene
// ---------------------------------------------------------------------------

#[test]
fn secrets_never_appear_in_arguments() {
    let runner = ScriptedRunner::logged_out();
    let req = request(Action::Create)
        .with_secret_password("s3cret-entry-pw")
        .with_secret_user("svc-deploy");
    operation(&runner).execute(&req);

    for inv in runner.calls.borrow().iter() {
        for arg in &inv.args {
            assert!(!arg.contains(MASTER), "master password leaked in {arg}");
            assert!(!arg.contains("s3cret-entry-pw"), "secret leaked in {arg}");
        }
    }
    assert_eq!(runner.call("login").unwrap().stdin(), Some("m4ster-pw\n"));
}

// ---------------------------------------------------------------------------
// Home bootstrap
// ---------------------------------------------------------------------------

#[test]
fn bootstrap_creates_missing_home() {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join(".local/share/lpass");
    let runner = ScriptedRunner::logged_in().reply("show", Reply::Exit(0, "pw\n", ""));

    let result = operation(&runner)
        .bootstrap_home(Some(home.clone()))
        .execute(&request(Action::Get));

    assert!(!result.failed);
    assert!(home.is_dir());
}

#[test]
fn bootstrap_failure_is_environment_error() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("lpass");
    std::fs::write(&blocker, "file in the way").unwrap();
    let runner = ScriptedRunner::logged_in();

    let result = operation(&runner)
        .bootstrap_home(Some(blocker))
        .execute(&request(Action::Get));

    assert!(result.failed);
    assert_eq!(result.error_kind, Some(ErrorKind::Environment));
    assert_eq!(runner.count("status"), 0);
}

#[test]
fn unresolvable_home_still_logs_out() {
    let runner = ScriptedRunner::logged_in();
    let err = LpassCredError::Environment("cannot determine the user data directory".into());

    let result = operation(&runner).abort(&err);

    assert!(result.failed);
    assert!(!result.changed);
    assert_eq!(result.error_kind, Some(ErrorKind::Environment));
    assert_eq!(runner.subcommands(), vec!["logout"]);
}

#[test]
fn abort_respects_keep_session() {
    let runner = ScriptedRunner::logged_in();
    let err = LpassCredError::Environment("cannot determine the user data directory".into());

    let result = operation(&runner).logout_after(false).abort(&err);

    assert!(result.failed);
    assert!(runner.subcommands().is_empty());
}
