//! Implementation of the `procman status` command.

use super::open_manager;
use crate::cli::{GlobalArgs, StatusArgs};
use crate::error::{ProcmanError, Result};
use crate::exit_codes;

/// Print the roster and subject owners of a domain.
///
/// The snapshot is read-only: dead entries are shown, not pruned.
pub fn cmd_status(global: &GlobalArgs, args: StatusArgs) -> Result<i32> {
    let manager = open_manager(global, &args.domain, args.capacity)?;
    let status = manager.status()?;

    if args.json {
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| ProcmanError::UserError(format!("failed to serialize status: {}", e)))?;
        println!("{}", json);
    } else {
        println!("{}", status);
    }

    Ok(exit_codes::SUCCESS)
}
