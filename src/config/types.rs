//! Configuration types and defaults for procman.

use crate::storage::DEFAULT_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where coordination records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Record files in a directory (default: the system temp directory).
    Filesystem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<PathBuf>,
    },
    /// Keys on a Redis server. Requires the `redis` feature.
    Redis {
        #[serde(default = "default_redis_url")]
        url: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Filesystem { dir: None }
    }
}

impl StorageConfig {
    /// Name of the backend as written in the config file.
    pub fn driver_name(&self) -> &'static str {
        match self {
            StorageConfig::Filesystem { .. } => "filesystem",
            StorageConfig::Redis { .. } => "redis",
        }
    }
}

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "procman.yaml";

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "PROCMAN_CONFIG";

pub(crate) fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
pub(crate) fn default_capacity() -> usize {
    1
}
pub(crate) fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}
