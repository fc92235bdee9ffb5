use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Runtime settings for an [`IconService`](crate::IconService).
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration:
///
/// ```toml
/// retention_secs = 300
/// sweep_interval_ms = 1000
/// max_source_bytes = 20971520
/// output_dir = "/var/tmp/icondrop"
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How long converted artifacts stay retrievable, in seconds.
    pub retention_secs: u64,
    /// How often expired artifacts are deleted, in milliseconds.
    pub sweep_interval_ms: u64,
    /// Largest accepted source image, in bytes.
    pub max_source_bytes: usize,
    /// When set, artifacts are written to this directory instead of being
    /// kept in memory.
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            retention_secs: 5 * 60,
            sweep_interval_ms: 1000,
            max_source_bytes: 20 * 1024 * 1024,
            output_dir: None,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Config> {
        let config: Config = toml::from_str(input)
            .map_err(|err| Error::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Config::from_toml_str(&text)
    }

    /// Returns the retention window.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Returns the sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Rejects zero durations and limits.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.retention_secs == 0 {
            return Err(Error::Config("retention_secs must be positive".into()));
        }
        if self.sweep_interval_ms == 0 {
            return Err(Error::Config("sweep_interval_ms must be positive"
                .into()));
        }
        if self.max_source_bytes == 0 {
            return Err(Error::Config("max_source_bytes must be positive"
                .into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retention(), Duration::from_secs(300));
    }

    #[test]
    fn overrides() {
        let config = Config::from_toml_str("retention_secs = 10\n\
                                            output_dir = \"/tmp/icons\"\n")
            .unwrap();
        assert_eq!(config.retention_secs, 10);
        assert_eq!(config.sweep_interval_ms, 1000);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/icons")));
    }

    #[test]
    fn rejects_zero_and_unknown_fields() {
        assert!(matches!(Config::from_toml_str("retention_secs = 0"),
                         Err(Error::Config(_))));
        assert!(matches!(Config::from_toml_str("colour = \"red\""),
                         Err(Error::Config(_))));
    }
}
