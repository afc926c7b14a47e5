//! Mount configuration.
//!
//! Read from a TOML file; every field has a default so an empty file (or no
//! file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use uorfs_logging::LogConfig;

/// Errors raised while loading or validating [`UorfsConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UorfsConfig {
    /// Seconds a file's content stays cached after its last reader leaves.
    pub cache_idle_secs: u64,

    /// Attribute cache validity reported to the kernel.
    pub attr_timeout_secs: u64,

    /// Name lookup cache validity reported to the kernel.
    pub entry_timeout_secs: u64,

    pub fsname: String,

    pub allow_other: bool,

    /// Fail the mount instead of serving a partial tree when loading fails.
    pub abort_on_load_error: bool,

    pub log: LogConfig,
}

impl Default for UorfsConfig {
    fn default() -> Self {
        Self {
            cache_idle_secs: 300,
            attr_timeout_secs: 1,
            entry_timeout_secs: 1,
            fsname: "uorfs".to_string(),
            allow_other: false,
            abort_on_load_error: false,
            log: LogConfig::default(),
        }
    }
}

impl UorfsConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: UorfsConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_idle_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache_idle_secs must be at least 1".into(),
            ));
        }
        if self.fsname.is_empty() {
            return Err(ConfigError::Invalid("fsname must not be empty".into()));
        }
        Ok(())
    }

    pub fn cache_idle(&self) -> Duration {
        Duration::from_secs(self.cache_idle_secs)
    }

    pub fn attr_timeout(&self) -> Duration {
        Duration::from_secs(self.attr_timeout_secs)
    }

    pub fn entry_timeout(&self) -> Duration {
        Duration::from_secs(self.entry_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = UorfsConfig::default();
        assert_eq!(config.cache_idle(), Duration::from_secs(300));
        assert_eq!(config.fsname, "uorfs");
        assert!(!config.abort_on_load_error);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "cache_idle_secs = 10\nabort_on_load_error = true\n\n[log]\nlevel = \"debug\""
        )
        .unwrap();

        let config = UorfsConfig::load(file.path()).unwrap();
        assert_eq!(config.cache_idle_secs, 10);
        assert!(config.abort_on_load_error);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.attr_timeout_secs, 1);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_idle_secs = 0").unwrap();
        assert!(matches!(
            UorfsConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_idle_secs = \"soon\"").unwrap();
        assert!(matches!(
            UorfsConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));

        assert!(matches!(
            UorfsConfig::load(Path::new("/nonexistent/uorfs.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
