//! Filesystem utilities for procman.
//!
//! The filesystem backend keeps coordination state in small record files that
//! other processes read concurrently, so every write goes through
//! [`atomic_write`].

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
