//! Command implementations for procman.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the config and manager setup they share.

mod cleanup;
mod clear;
mod run;
mod status;

use crate::cli::{Command, GlobalArgs};
use crate::config::{Config, StorageConfig};
use crate::error::Result;
use crate::manager::ProcessManager;

/// Dispatch a command to its implementation.
///
/// Returns the exit code the process should end with on success.
pub fn dispatch(global: &GlobalArgs, command: Command) -> Result<i32> {
    match command {
        Command::Run(args) => run::cmd_run(global, args),
        Command::Status(args) => status::cmd_status(global, args),
        Command::Cleanup(args) => cleanup::cmd_cleanup(global, args),
        Command::Clear(args) => clear::cmd_clear(global, args),
    }
}

/// Resolve the config and apply command-line overrides.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::resolve(global.config.as_deref())?;

    if let Some(dir) = &global.dir {
        config.storage = StorageConfig::Filesystem {
            dir: Some(dir.clone()),
        };
    }
    if let Some(prefix) = &global.prefix {
        config.prefix = prefix.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Build the manager a command operates through.
pub(crate) fn open_manager(
    global: &GlobalArgs,
    domain: &str,
    capacity: Option<usize>,
) -> Result<ProcessManager> {
    let config = load_config(global)?;
    let manager = ProcessManager::from_config(domain, &config)?;

    Ok(match capacity {
        Some(capacity) => manager.with_capacity(capacity),
        None => manager,
    })
}
