//! Procman: cross-process domain locking.
//!
//! Independent processes coordinating through a shared storage location
//! (a directory or a key-value store) agree on two things per *domain*:
//!
//! - at most `capacity` of them hold a thread slot at once
//! - a *subject* inside the domain is owned by at most one live process
//!
//! Records left by crashed processes are reclaimed through a liveness probe,
//! so nothing has to be cleaned up by hand after a crash.
//!
//! ```no_run
//! use procman::{FilesystemDriver, ProcessManager};
//!
//! # fn main() -> procman::Result<()> {
//! let driver = FilesystemDriver::in_temp_dir()?;
//! let mut manager = ProcessManager::new("convert", driver)?
//!     .with_capacity(2)
//!     .with_subject("video.mp4")?;
//!
//! if let Some(output) = manager.lock_with(|_| "converted") {
//!     println!("{}", output);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod liveness;
pub mod manager;
pub mod sanitize;
pub mod storage;

pub use config::Config;
pub use error::{ProcmanError, Result};
pub use liveness::{FakeProbe, LivenessProbe, Pid, SystemProbe};
pub use manager::{CleanupReport, DomainStatus, LockGuard, ProcessManager};
pub use storage::{FilesystemDriver, KeyValueDriver, KeyValueStore, MemoryStore, StorageDriver};
