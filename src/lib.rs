pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod lpass;
pub mod operation;

#[cfg(feature = "keyring-store")]
pub mod keyring;
