//! YAML configuration loading.

use std::path::Path;

use super::error::ConfigError;
use super::types::SchedulerConfig;

/// Loads and validates [`SchedulerConfig`] from YAML.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a scheduler configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<SchedulerConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadError {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let config: SchedulerConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            worker_threads = config.worker_threads,
            queue = %config.queue,
            "Loaded scheduler configuration"
        );
        Ok(config)
    }

    /// Parse a scheduler configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<SchedulerConfig, ConfigError> {
        let config: SchedulerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}
