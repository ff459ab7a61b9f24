use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use settle_core::rules::cooldown::{DEFAULT_COOLDOWN_HOURS, MAX_COOLDOWN_HOURS};
use settle_core::rules::transitions::{DEFAULT_MAX_EVIDENCE_IMAGES, MAX_EVIDENCE_IMAGES};
use settle_core::rules::LifecyclePolicy;
use thiserror::Error;

const APP_DIR: &str = "settle";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_BLOB_PREFIX: &str = "bookings";
pub const DEFAULT_ORPHAN_AFTER_HOURS: i64 = 24;
pub const MAX_ORPHAN_AFTER_HOURS: i64 = 720;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub lifecycle: LifecycleConfig,
    pub uploads: UploadsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub cooldown_hours: i64,
    pub max_evidence_images: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: DEFAULT_COOLDOWN_HOURS,
            max_evidence_images: DEFAULT_MAX_EVIDENCE_IMAGES,
        }
    }
}

impl LifecycleConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            cooldown_secs: self.cooldown_hours * 3_600,
            max_evidence_images: self.max_evidence_images,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsConfig {
    pub blob_prefix: String,
    pub orphan_after_hours: i64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            blob_prefix: DEFAULT_BLOB_PREFIX.to_string(),
            orphan_after_hours: DEFAULT_ORPHAN_AFTER_HOURS,
        }
    }
}

impl UploadsConfig {
    pub fn orphan_after_secs(&self) -> i64 {
        self.orphan_after_hours * 3_600
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid lifecycle.cooldown_hours value: {0}")]
    InvalidCooldownHours(i64),
    #[error("invalid lifecycle.max_evidence_images value: {0}")]
    InvalidMaxEvidenceImages(usize),
    #[error("invalid uploads.blob_prefix value: {0:?}")]
    InvalidBlobPrefix(String),
    #[error("invalid uploads.orphan_after_hours value: {0}")]
    InvalidOrphanAfterHours(i64),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    lifecycle: Option<LifecycleFile>,
    uploads: Option<UploadsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LifecycleFile {
    cooldown_hours: Option<i64>,
    max_evidence_images: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UploadsFile {
    blob_prefix: Option<String>,
    orphan_after_hours: Option<i64>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(lifecycle) = parsed.lifecycle {
        if let Some(hours) = lifecycle.cooldown_hours {
            if hours <= 0 || hours > MAX_COOLDOWN_HOURS {
                return Err(ConfigError::InvalidCooldownHours(hours));
            }
            config.lifecycle.cooldown_hours = hours;
        }
        if let Some(max) = lifecycle.max_evidence_images {
            if max == 0 || max > MAX_EVIDENCE_IMAGES {
                return Err(ConfigError::InvalidMaxEvidenceImages(max));
            }
            config.lifecycle.max_evidence_images = max;
        }
    }

    if let Some(uploads) = parsed.uploads {
        if let Some(prefix) = uploads.blob_prefix {
            config.uploads.blob_prefix = validate_blob_prefix(&prefix)?;
        }
        if let Some(hours) = uploads.orphan_after_hours {
            if hours <= 0 || hours > MAX_ORPHAN_AFTER_HOURS {
                return Err(ConfigError::InvalidOrphanAfterHours(hours));
            }
            config.uploads.orphan_after_hours = hours;
        }
    }

    Ok(config)
}

fn validate_blob_prefix(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && !trimmed.starts_with('/')
        && !trimmed.ends_with('/')
        && !trimmed.split('/').any(|segment| segment.is_empty() || segment == "..")
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '/' | '-' | '_' | '.'));
    if !valid {
        return Err(ConfigError::InvalidBlobPrefix(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        load_at_path, merge_config, validate_blob_prefix, ConfigError, ConfigFile, LifecycleFile,
        UploadsFile,
    };
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    #[test]
    fn merge_config_applies_values() {
        let parsed = ConfigFile {
            lifecycle: Some(LifecycleFile {
                cooldown_hours: Some(24),
                max_evidence_images: Some(3),
            }),
            uploads: Some(UploadsFile {
                blob_prefix: Some("evidence/prod".to_string()),
                orphan_after_hours: Some(6),
            }),
        };
        let merged = merge_config(parsed).expect("merge");
        assert_eq!(merged.lifecycle.cooldown_hours, 24);
        assert_eq!(merged.lifecycle.policy().cooldown_secs, 24 * 3_600);
        assert_eq!(merged.lifecycle.policy().max_evidence_images, 3);
        assert_eq!(merged.uploads.blob_prefix, "evidence/prod");
        assert_eq!(merged.uploads.orphan_after_secs(), 6 * 3_600);
    }

    #[test]
    fn merge_config_rejects_out_of_range_cooldown() {
        let parsed = ConfigFile {
            lifecycle: Some(LifecycleFile {
                cooldown_hours: Some(0),
                max_evidence_images: None,
            }),
            uploads: None,
        };
        let err = merge_config(parsed).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCooldownHours(0)));
    }

    #[test]
    fn blob_prefix_validation() {
        assert_eq!(validate_blob_prefix(" bookings ").unwrap(), "bookings");
        assert!(validate_blob_prefix("/abs").is_err());
        assert!(validate_blob_prefix("a//b").is_err());
        assert!(validate_blob_prefix("a/../b").is_err());
        assert!(validate_blob_prefix("with space").is_err());
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
        assert!(load_at_path(&missing, false).expect("optional").is_none());
    }

    #[test]
    fn load_at_path_parses_toml() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[lifecycle]\ncooldown_hours = 48\n[uploads]\nblob_prefix = \"media\"\n",
        )
        .expect("write config");
        restrict_permissions(&path);

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.lifecycle.cooldown_hours, 48);
        assert_eq!(config.lifecycle.max_evidence_images, 6);
        assert_eq!(config.uploads.blob_prefix, "media");
    }

    #[test]
    fn load_at_path_rejects_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[lifecycle]\ncooldown_days = 3\n").expect("write config");
        restrict_permissions(&path);

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
