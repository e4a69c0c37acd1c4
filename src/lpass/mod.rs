//! lastpass-cli integration.
//!
//! This module provides:
//! - the process seam with timeouts and stdin-only secret delivery (`command`)
//! - typed `lpass` subcommand wrappers (`client`)
//! - `LPASS_HOME` resolution and bootstrap (`home`)

pub mod client;
pub mod command;
pub mod home;

// Re-export the most commonly used items.
pub use client::{LpassClient, SessionState};
pub use command::{CommandOutput, CommandRunner, ExecError, Invocation, ProcessRunner};
