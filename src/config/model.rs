//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration shared by every process coordinating through one location.
///
/// This struct represents the contents of `procman.yaml`. Unknown fields are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace token separating independent deployments on one storage.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Capacity applied when the caller does not choose one.
    #[serde(default = "default_capacity")]
    pub default_capacity: usize,

    /// Storage backend and its location.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            default_capacity: default_capacity(),
            storage: StorageConfig::default(),
        }
    }
}
