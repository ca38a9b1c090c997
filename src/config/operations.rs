//! Config loading, validation, and driver construction.

use super::model::Config;
use super::types::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, StorageConfig};
use crate::error::{ProcmanError, Result};
use crate::sanitize::sanitize;
use crate::storage::{FilesystemDriver, StorageDriver};
use std::path::{Path, PathBuf};
use tracing::debug;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// * `ProcmanError::Config` - unreadable file, parse error or invalid value
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProcmanError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "loaded config file");
        Self::from_yaml(&content)
    }

    /// Resolve the config to use.
    ///
    /// In order: `explicit`, the file named by `PROCMAN_CONFIG`, `procman.yaml`
    /// in the working directory, built-in defaults. An explicit or
    /// environment-named file must exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(PathBuf::from(path));
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load(local);
        }

        Ok(Self::default())
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as unit, not as an empty map.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| ProcmanError::Config(format!("failed to parse config YAML: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ProcmanError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `prefix` must contain at least one alphanumeric character
    /// - `storage.url` must not be empty for the redis backend
    pub fn validate(&self) -> Result<()> {
        let prefix = sanitize(&self.prefix);
        if prefix.is_empty() || prefix == "-" {
            return Err(ProcmanError::Config(format!(
                "config validation failed: prefix '{}' has no alphanumeric characters",
                self.prefix
            )));
        }

        if let StorageConfig::Redis { url } = &self.storage
            && url.trim().is_empty()
        {
            return Err(ProcmanError::Config(
                "config validation failed: storage.url must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory used by the filesystem backend.
    pub fn storage_dir(&self) -> PathBuf {
        match &self.storage {
            StorageConfig::Filesystem { dir: Some(dir) } => dir.clone(),
            _ => std::env::temp_dir(),
        }
    }

    /// Build the storage driver this config describes.
    pub fn build_driver(&self) -> Result<Box<dyn StorageDriver>> {
        self.validate()?;

        match &self.storage {
            StorageConfig::Filesystem { .. } => Ok(Box::new(FilesystemDriver::new(
                self.storage_dir(),
                &self.prefix,
            )?)),
            StorageConfig::Redis { url } => build_redis_driver(url, &self.prefix),
        }
    }
}

#[cfg(feature = "redis")]
fn build_redis_driver(url: &str, prefix: &str) -> Result<Box<dyn StorageDriver>> {
    use crate::storage::{KeyValueDriver, RedisStore};

    Ok(Box::new(KeyValueDriver::new(RedisStore::open(url)?, prefix)?))
}

#[cfg(not(feature = "redis"))]
fn build_redis_driver(url: &str, _prefix: &str) -> Result<Box<dyn StorageDriver>> {
    Err(ProcmanError::Config(format!(
        "storage driver 'redis' ({}) requires procman to be built with the `redis` feature",
        url
    )))
}
