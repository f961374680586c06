//! Work-directory layout for aptly and gpg state.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ToolsError};

pub const APTLY_DIR: &str = "aptly";
pub const APTLY_CONFIG: &str = "aptly.json";
pub const GNUPG_DIR: &str = "gnupg";
pub const GPG_CONF: &str = "gpg.conf";
pub const TRUSTED_KEYRING: &str = "trustedkeys.gpg";
pub const GNUPGHOME_VAR: &str = "GNUPGHOME";

pub fn aptly_root(work_dir: &Path) -> PathBuf {
    work_dir.join(APTLY_DIR)
}

pub fn aptly_config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(APTLY_CONFIG)
}

pub fn gnupg_home(work_dir: &Path) -> PathBuf {
    work_dir.join(GNUPG_DIR)
}

pub fn gpg_conf_path(work_dir: &Path) -> PathBuf {
    gnupg_home(work_dir).join(GPG_CONF)
}

/// Create `path` (and parents) if missing. `private` restricts a newly
/// created directory to mode `0700`; existing directories are left alone.
pub fn ensure_dir(path: &Path, private: bool) -> Result<PathBuf, ToolsError> {
    if !path.is_dir() {
        tracing::info!("+ mkdir -p {}", path.display());
        std::fs::create_dir_all(path).map_err(|e| io_err(path, e))?;
        if private {
            set_private_permissions(path)?;
        }
    }
    Ok(path.to_path_buf())
}

/// Write `default_content` to `path` unless the file already exists.
pub fn ensure_config(path: &Path, default_content: &str) -> Result<PathBuf, ToolsError> {
    if !path.exists() {
        tracing::info!("> {}", path.display());
        std::fs::write(path, default_content).map_err(|e| io_err(path, e))?;
    }
    Ok(path.to_path_buf())
}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> Result<(), ToolsError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> Result<(), ToolsError> {
    Ok(())
}
