//! Process seam. Runs the vault CLI with an argument vector, an explicit
//! environment overlay, optional stdin payload, and a hard timeout.
//!
//! Nothing here goes through a shell. Secrets only ever reach the child
//! through its stdin pipe, so they never show up in `ps` output or in
//! logged argument lists.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use zeroize::Zeroizing;

/// Error raised when a child process could not be run to completion.
///
/// A child that ran and exited non-zero is *not* an `ExecError`; that is
/// reported through `CommandOutput::status`.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("'{0}' not found (install lastpass-cli or set lpass_bin)")]
    NotFound(String),

    #[error("failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("I/O error talking to child process: {0}")]
    Io(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// One call of the vault CLI: its arguments and optional stdin payload.
#[derive(Clone, Default)]
pub struct Invocation {
    pub args: Vec<String>,
    stdin: Option<Zeroizing<String>>,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    /// Attach a payload written to the child's stdin, newline-terminated.
    pub fn with_stdin(mut self, payload: &str) -> Self {
        let mut buf = Zeroizing::new(String::with_capacity(payload.len() + 1));
        buf.push_str(payload);
        buf.push('\n');
        self.stdin = Some(buf);
        self
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Captured result of a child that ran to completion.
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: Zeroizing<String>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(status: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            status: Some(status),
            stdout: Zeroizing::new(stdout.to_string()),
            stderr: stderr.to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Text to surface to the operator when the call failed.
    ///
    /// The CLI's stderr is passed through verbatim (trimmed).
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

impl fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOutput")
            .field("status", &self.status)
            .field("stdout", &format_args!("<{} bytes>", self.stdout.len()))
            .field("stderr", &self.stderr)
            .finish()
    }
}

/// Something that can execute a vault CLI invocation.
///
/// `ProcessRunner` is the real implementation; tests substitute a
/// scripted runner.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    env: BTreeMap<String, String>,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            env: BTreeMap::new(),
            timeout,
        }
    }

    /// Add a variable to the overlay applied to every child.
    ///
    /// The calling process's own environment is never modified.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn env_overlay(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        tracing::debug!(program = %self.program, args = ?invocation.args, "spawning");

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(|e| ExecError::Io(format!("failed to start runtime: {e}")))?;

        let output = rt.block_on(self.run_bounded(invocation))?;

        tracing::debug!(program = %self.program, status = ?output.status.code(), "child exited");

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ProcessRunner {
    /// Spawn, feed stdin, and collect output under a single deadline.
    ///
    /// The deadline covers draining stdout and stderr, so a background
    /// process that inherits the pipes cannot hold the call open. The
    /// child is killed when the future is dropped.
    async fn run_bounded(&self, invocation: &Invocation) -> Result<Output, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&invocation.args)
            .envs(&self.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExecError::NotFound(self.program.clone()),
            _ => ExecError::Spawn {
                program: self.program.clone(),
                reason: e.to_string(),
            },
        })?;

        let stdin = child.stdin.take();
        let feed = async move {
            let (Some(payload), Some(mut pipe)) = (invocation.stdin(), stdin) else {
                return Ok(());
            };
            // A child that exits without reading closes the pipe early;
            // its exit status tells the real story. Dropping the pipe
            // sends EOF.
            match pipe.write_all(payload.as_bytes()).await {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };

        let work = async { tokio::join!(feed, child.wait_with_output()) };
        match tokio::time::timeout(self.timeout, work).await {
            Ok((Ok(()), Ok(output))) => Ok(output),
            Ok((Err(e), _)) | Ok((_, Err(e))) => Err(ExecError::Io(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    args = ?invocation.args,
                    timeout = ?self.timeout,
                    "child process timed out, killed"
                );
                Err(ExecError::TimedOut(self.timeout))
            }
        }
    }
}
