//! Configuration model for procman.
//!
//! This module defines the Config struct that represents `procman.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for every field, and validation of config values.
//!
//! The config is a plain value handed to whoever builds a manager; nothing
//! here is process-global.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{CONFIG_ENV_VAR, CONFIG_FILE_NAME, StorageConfig};
