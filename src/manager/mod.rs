//! Cross-process lock orchestration.
//!
//! A [`ProcessManager`] coordinates access to a *domain* (e.g. a conversion
//! queue) among independent OS processes that share a storage location:
//! - at most `capacity` live processes hold a *thread slot* of the domain;
//! - an optional *subject* (e.g. the file being converted) is additionally
//!   owned by at most one live process.
//!
//! # Lock Protocol
//!
//! `lock()` is single shot and never waits for another process:
//! 1. subject owners whose process is gone are cleared (cleanup pass);
//! 2. a thread slot is reserved (re-entry by a holder is a no-op);
//! 3. the subject, if any, is claimed; on failure the slot is given back.
//!
//! A `false` result means "try again later". Callers that want to wait poll
//! `lock()` on their own schedule.
//!
//! # Release
//!
//! Locks stay held until `release()`, until a [`LockGuard`] is dropped, or
//! until the work passed to `lock_with` returns. Locks of processes that die
//! without releasing are reclaimed by the next locker through the liveness
//! probe; no process has to clean up after another explicitly.

mod guard;
mod process_manager;
mod status;


pub use guard::LockGuard;
pub use process_manager::ProcessManager;
pub use status::{CleanupReport, DomainStatus, SubjectEntry, ThreadEntry};
