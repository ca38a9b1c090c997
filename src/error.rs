//! Error types for procman.
//!
//! Uses thiserror for derive macros. Lock denial is not an error for the
//! library API (`lock()` returns `false`); the `LockDenied` variant only exists
//! so the CLI can report it with its own exit code.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for procman operations.
#[derive(Error, Debug)]
pub enum ProcmanError {
    /// The liveness probe could not confirm the constructing process is running.
    #[error("process liveness cannot be determined: {0}")]
    Construction(String),

    /// A domain, subject or prefix sanitized to an empty token.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Reading or writing a roster/owner record failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The configuration file is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// User provided invalid arguments.
    #[error("{0}")]
    UserError(String),

    /// The domain is at capacity or the subject is held by a live process.
    #[error("lock denied: {0}")]
    LockDenied(String),
}

impl ProcmanError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcmanError::Construction(_) => exit_codes::ENVIRONMENT_FAILURE,
            ProcmanError::InvalidName(_) => exit_codes::USER_ERROR,
            ProcmanError::Storage(_) => exit_codes::STORAGE_FAILURE,
            ProcmanError::Config(_) => exit_codes::USER_ERROR,
            ProcmanError::UserError(_) => exit_codes::USER_ERROR,
            ProcmanError::LockDenied(_) => exit_codes::LOCK_DENIED,
        }
    }

    pub(crate) fn storage(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        ProcmanError::Storage(format!("{}: {}", context, err))
    }
}

/// Result type alias for procman operations.
pub type Result<T> = std::result::Result<T, ProcmanError>;
