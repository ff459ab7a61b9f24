use crate::error::{Result, StoreError};
use chrono::Utc;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "settle";
const DB_FILENAME: &str = "settle.sqlite3";
const BACKUP_DIR: &str = "backups";

/// Data directory: `$XDG_DATA_HOME/settle`, else `~/.local/share/settle`.
pub fn data_dir() -> Result<PathBuf> {
    match env::var_os("XDG_DATA_HOME") {
        Some(dir) => non_empty(dir).map(|path| path.join(APP_DIR)),
        None => {
            let home = dirs::home_dir().ok_or(StoreError::MissingHomeDir)?;
            Ok(home.join(".local").join("share").join(APP_DIR))
        }
    }
}

/// `--db-path` if given (its parent directory is created), else
/// `settle.sqlite3` under the data dir.
pub fn resolve_db_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            let path = non_empty(path.into_os_string())?;
            ensure_parent_dir(&path)?;
            Ok(path)
        }
        None => {
            let dir = data_dir()?;
            ensure_private_dir(&dir)?;
            Ok(dir.join(DB_FILENAME))
        }
    }
}

/// Timestamped snapshot path, e.g. `backups/settle-20301015-134500.sqlite3`.
pub fn backup_path() -> Result<PathBuf> {
    let dir = data_dir()?.join(BACKUP_DIR);
    ensure_private_dir(&dir)?;
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    Ok(dir.join(format!("{}-{}.sqlite3", APP_DIR, stamp)))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            ensure_private_dir(parent)
        }
        _ => Ok(()),
    }
}

fn non_empty(raw: OsString) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidDataPath(path));
    }
    Ok(path)
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    restrict_dir_permissions(dir)
}

#[cfg(unix)]
fn restrict_dir_permissions(dir: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_dir: &Path) -> Result<()> {
    Ok(())
}
