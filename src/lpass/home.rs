//! `LPASS_HOME` resolution and bootstrap.
//!
//! lastpass-cli keeps its session, agent socket, and blob cache under
//! `LPASS_HOME`. When that directory is missing, `lpass login` fails
//! with an unhelpful message, so we create it up front with owner-only
//! permissions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{LpassCredError, Result};

/// Home used when running as root, regardless of `$HOME`.
const ROOT_LPASS_HOME: &str = "/root/.local/share/lpass";

/// Pick the `LPASS_HOME` for this process.
///
/// An explicit override wins. Otherwise root always gets
/// `/root/.local/share/lpass` (sudo frequently keeps the invoking
/// user's `$HOME`), and everyone else gets `<data_dir>/lpass`.
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if is_root() {
        return Ok(PathBuf::from(ROOT_LPASS_HOME));
    }

    dirs::data_dir()
        .map(|d| d.join("lpass"))
        .ok_or_else(|| {
            LpassCredError::Environment("cannot determine the user data directory".into())
        })
}

/// Create `dir` (and parents) with mode `0700` if it does not exist yet.
///
/// An existing directory is left alone, permissions included.
pub fn ensure(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if dir.exists() {
        return Err(LpassCredError::Environment(format!(
            "{} exists but is not a directory",
            dir.display()
        )));
    }

    fs::create_dir_all(dir).map_err(|e| {
        LpassCredError::Environment(format!("failed to create {}: {e}", dir.display()))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o700);
        fs::set_permissions(dir, perms).map_err(|e| {
            LpassCredError::Environment(format!(
                "failed to set permissions on {}: {e}",
                dir.display()
            ))
        })?;
    }

    tracing::info!(path = %dir.display(), "created LPASS_HOME");
    Ok(())
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
