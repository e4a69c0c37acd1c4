use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LpassCredError, Result};

/// Tool configuration, loaded from `.lpass-cred.toml`.
///
/// Every field has a default so lpass-cred runs without any config
/// file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Program name or path of the lastpass-cli binary.
    #[serde(default = "default_lpass_bin")]
    pub lpass_bin: String,

    /// Upper bound for each external call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Explicit `LPASS_HOME`. When unset it is derived from the
    /// effective user (see `lpass::home`).
    #[serde(default)]
    pub lpass_home: Option<PathBuf>,

    /// Create the `LPASS_HOME` directory before talking to lpass.
    #[serde(default = "default_true")]
    pub bootstrap_home: bool,

    /// Run `lpass sync` after a successful update or create.
    #[serde(default = "default_true")]
    pub sync_after_write: bool,

    /// Run `lpass logout --force` when the operation finishes.
    #[serde(default = "default_true")]
    pub logout_after: bool,

    /// Pass `--trust` on login so the device is remembered.
    #[serde(default)]
    pub trust_login: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_lpass_bin() -> String {
    "lpass".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            lpass_bin: default_lpass_bin(),
            timeout_secs: default_timeout_secs(),
            lpass_home: None,
            bootstrap_home: true,
            sync_after_write: true,
            logout_after: true,
            trust_login: false,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".lpass-cred.toml";

    /// Load settings from `<dir>/.lpass-cred.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_file(&config_path)
    }

    /// Load settings from an explicit file. A missing file is an error.
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LpassCredError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            LpassCredError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if settings.timeout_secs == 0 {
            return Err(LpassCredError::ConfigError(format!(
                "timeout_secs in {} must be greater than zero",
                path.display()
            )));
        }

        Ok(settings)
    }

    /// Per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.lpass_bin, "lpass");
        assert_eq!(s.timeout(), Duration::from_secs(30));
        assert!(s.lpass_home.is_none());
        assert!(s.bootstrap_home);
        assert!(s.sync_after_write);
        assert!(s.logout_after);
        assert!(!s.trust_login);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.lpass_bin, "lpass");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
lpass_bin = "/opt/lastpass/bin/lpass"
timeout_secs = 90
lpass_home = "/var/lib/lpass"
bootstrap_home = false
sync_after_write = false
logout_after = false
trust_login = true
"#;
        fs::write(tmp.path().join(".lpass-cred.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.lpass_bin, "/opt/lastpass/bin/lpass");
        assert_eq!(settings.timeout_secs, 90);
        assert_eq!(settings.lpass_home, Some(PathBuf::from("/var/lib/lpass")));
        assert!(!settings.bootstrap_home);
        assert!(!settings.sync_after_write);
        assert!(!settings.logout_after);
        assert!(settings.trust_login);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lpass-cred.toml"), "timeout_secs = 5\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.timeout_secs, 5);
        // Rest should be defaults
        assert_eq!(settings.lpass_bin, "lpass");
        assert!(settings.logout_after);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lpass-cred.toml"), "not valid {{toml").unwrap();

        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_zero_timeout() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".lpass-cred.toml"), "timeout_secs = 0\n").unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn load_file_errors_when_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(Settings::load_file(&tmp.path().join("nope.toml")).is_err());
    }
}
