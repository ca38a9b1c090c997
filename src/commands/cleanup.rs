//! Implementation of the `procman cleanup` command.

use super::open_manager;
use crate::cli::{CleanupArgs, GlobalArgs};
use crate::error::Result;
use crate::exit_codes;

pub fn cmd_cleanup(global: &GlobalArgs, args: CleanupArgs) -> Result<i32> {
    let manager = open_manager(global, &args.domain, None)?;
    let report = manager.cleanup()?;
    println!("{}", report);
    Ok(exit_codes::SUCCESS)
}
