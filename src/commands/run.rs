//! Implementation of the `procman run` command.
//!
//! Holds a slot of the domain (and optionally a subject) for the lifetime
//! of a child process. The lock belongs to the procman process itself, so a
//! crash of procman frees the slot just like a crash of the child would.

use super::open_manager;
use crate::cli::{GlobalArgs, RunArgs};
use crate::error::{ProcmanError, Result};
use crate::exit_codes;
use crate::manager::ProcessManager;
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Lower bound for `--poll-interval-ms`.
const MIN_POLL_INTERVAL_MS: u64 = 10;

pub fn cmd_run(global: &GlobalArgs, args: RunArgs) -> Result<i32> {
    let mut manager = open_manager(global, &args.domain, args.capacity)?;
    if let Some(subject) = &args.subject {
        manager = manager.with_subject(subject)?;
    }

    let poll_interval = Duration::from_millis(args.poll_interval_ms.max(MIN_POLL_INTERVAL_MS));
    while !manager.lock() {
        if !args.wait {
            return Err(ProcmanError::LockDenied(denial_reason(&manager)));
        }
        debug!(domain = %manager.domain(), "lock busy, waiting");
        thread::sleep(poll_interval);
    }

    let outcome = run_child(&args.command);
    let released = manager.release();

    let code = outcome?;
    released?;
    Ok(code)
}

/// Explain why `manager` was just denied.
fn denial_reason(manager: &ProcessManager) -> String {
    if let Some(subject) = manager.subject()
        && let Ok(Some(owner)) = manager.owner_of(subject)
        && owner != manager.pid()
        && manager.is_running(owner)
    {
        return format!(
            "subject '{}' of domain '{}' is owned by running process {}",
            subject,
            manager.domain(),
            owner
        );
    }

    format!(
        "domain '{}' has no free slot (capacity {})",
        manager.domain(),
        manager.capacity()
    )
}

/// Run `argv` with inherited stdio and return its exit code.
fn run_child(argv: &[String]) -> Result<i32> {
    let Some((program, rest)) = argv.split_first() else {
        return Err(ProcmanError::UserError("no command given".to_string()));
    };

    info!(program = %program, "starting child");
    let status = Command::new(program).args(rest).status().map_err(|e| {
        ProcmanError::UserError(format!(
            "failed to execute '{}': {}\n\
             Fix: ensure the command is installed and in PATH.",
            program, e
        ))
    })?;

    let code = exit_code_of(status);
    info!(program = %program, code, "child exited");
    Ok(code)
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => exit_codes::USER_ERROR,
    }
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(exit_codes::USER_ERROR)
}
