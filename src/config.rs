//! Manager configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! data_dir = "plugins/enchantable/data"
//! retention_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheError;
use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_RETENTION, MIN_RETENTION};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Settings for [`crate::EnchantableBlockManager`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Root under which `<world>/<x>_<z>.json` region files live
    pub data_dir: PathBuf,
    /// Seconds a region stays cached after its last access
    pub retention_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            retention_secs: DEFAULT_RETENTION.as_secs(),
        }
    }
}

impl ManagerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_secs = retention.as_secs();
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Cache retention, rejected when below the floor
    pub fn retention(&self) -> Result<Duration, CacheError> {
        let retention = Duration::from_secs(self.retention_secs);
        if retention < MIN_RETENTION {
            return Err(CacheError::RetentionTooShort {
                requested: retention,
                minimum: MIN_RETENTION,
            });
        }
        Ok(retention)
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        self.retention().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ManagerConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.retention().expect("default is valid"), DEFAULT_RETENTION);
    }

    #[test]
    fn test_parse_toml() {
        let config = ManagerConfig::from_toml_str("data_dir = \"/srv/blocks\"\nretention_secs = 120\n")
            .expect("valid config");
        assert_eq!(config.data_dir, PathBuf::from("/srv/blocks"));
        assert_eq!(config.retention_secs, 120);

        let partial = ManagerConfig::from_toml_str("retention_secs = 90").expect("valid config");
        assert_eq!(partial.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_rejects_short_retention() {
        let result = ManagerConfig::from_toml_str("retention_secs = 10");
        assert!(matches!(
            result,
            Err(ConfigError::Cache(CacheError::RetentionTooShort { .. }))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            ManagerConfig::from_toml_str("retention_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let path = temp_dir.path().join("blocks.toml");
        fs::write(&path, "retention_secs = 600").expect("write config");

        let config = ManagerConfig::from_toml_file(&path).expect("valid config");
        assert_eq!(config.retention_secs, 600);

        assert!(matches!(
            ManagerConfig::from_toml_file(temp_dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
