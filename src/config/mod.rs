//! Configuration loaded from `.lpass-cred.toml`.

pub mod settings;

pub use settings::Settings;
