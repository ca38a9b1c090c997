//! Exit code constants for the procman CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Storage failure (roster/owner records unreadable or unwritable)
//! - 3: Environment failure (liveness probe cannot see the current process)
//! - 4: Lock denied (domain at capacity or subject held by a live process)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid names, or an unusable config file.
pub const USER_ERROR: i32 = 1;

/// Storage failure: the shared medium could not be read or written.
pub const STORAGE_FAILURE: i32 = 2;

/// Environment failure: process liveness cannot be determined here.
pub const ENVIRONMENT_FAILURE: i32 = 3;

/// Lock denied: the caller should try again later.
pub const LOCK_DENIED: i32 = 4;
