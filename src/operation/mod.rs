//! Credential operation: request, result, and the runner tying them to lpass.

pub mod request;
pub mod result;
pub mod runner;

pub use request::{Action, ModuleArgs, OperationRequest};
pub use result::OperationResult;
pub use runner::VaultCredentialOperation;
