//! Implementation of the `procman clear` command.

use super::open_manager;
use crate::cli::{ClearArgs, GlobalArgs};
use crate::error::{ProcmanError, Result};
use crate::exit_codes;

pub fn cmd_clear(global: &GlobalArgs, args: ClearArgs) -> Result<i32> {
    let target = match (&args.subject, args.pid) {
        (Some(subject), _) => format!("--subject {}", subject),
        (None, Some(pid)) => format!("--pid {}", pid),
        (None, None) => {
            return Err(ProcmanError::UserError(
                "nothing to clear: pass --subject or --pid".to_string(),
            ));
        }
    };

    if !args.force {
        return Err(ProcmanError::UserError(format!(
            "refusing to clear a record without --force flag.\n\n\
             Clearing a record of a live process lets a second process in.\n\
             Only clear it if you are certain its holder is gone.\n\n\
             To clear the record, run:\n  procman clear {} {} --force",
            args.domain, target
        )));
    }

    let manager = open_manager(global, &args.domain, None)?;

    if let Some(subject) = &args.subject {
        match manager.force_clear_subject(subject)? {
            Some(owner) => println!("Cleared subject '{}' (owner {})", subject, owner),
            None => println!("Subject '{}' had no owner", subject),
        }
    } else if let Some(pid) = args.pid {
        if manager.force_remove_thread(pid)? {
            println!("Removed pid {} from domain '{}'", pid, manager.domain());
        } else {
            println!("Pid {} is not in domain '{}'", pid, manager.domain());
        }
    }

    Ok(exit_codes::SUCCESS)
}
