//! Liveness probe backed by the operating system.

use super::{LivenessProbe, Pid};

/// Probes the OS process table.
///
/// On unix this sends the null signal (`kill(pid, 0)`): the process exists if
/// the call succeeds or fails with `EPERM` (it exists but belongs to someone
/// else). On Windows `tasklist` is filtered by pid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }
}

impl LivenessProbe for SystemProbe {
    fn is_running(&self, pid: Pid) -> bool {
        // pid 0 addresses the whole process group for kill(2); never a holder.
        if pid == 0 {
            return false;
        }
        is_process_alive(pid)
    }
}

#[cfg(unix)]
fn is_process_alive(pid: Pid) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid as NixPid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    match kill(NixPid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(windows)]
fn is_process_alive(pid: Pid) -> bool {
    use std::process::Command;

    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH", "/FO", "CSV"])
        .output()
        .map(|o| {
            let needle = format!("\"{}\"", pid);
            String::from_utf8_lossy(&o.stdout).contains(&needle)
        })
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn is_process_alive(_pid: Pid) -> bool {
    // No probe available: treat every recorded holder as alive.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_running() {
        assert!(SystemProbe::new().is_running(std::process::id()));
    }

    #[test]
    fn pid_zero_is_never_running() {
        assert!(!SystemProbe::new().is_running(0));
    }

    #[cfg(unix)]
    #[test]
    fn pid_outside_i32_range_is_not_running() {
        assert!(!SystemProbe::new().is_running(u32::MAX));
    }

    #[cfg(unix)]
    #[test]
    fn reaped_child_is_not_running() {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("failed to spawn `true`");
        let pid = child.id();
        child.wait().expect("failed to wait for child");

        assert!(!SystemProbe::new().is_running(pid));
    }
}
