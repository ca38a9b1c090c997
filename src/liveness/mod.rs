//! Process liveness probing.
//!
//! The manager never decides on its own whether a pid is alive; it asks a
//! [`LivenessProbe`]. [`SystemProbe`] asks the operating system, [`FakeProbe`]
//! answers from a scripted set of pids so several "processes" can be simulated
//! inside one test.

mod fake;
mod system;

pub use fake::FakeProbe;
pub use system::SystemProbe;

/// Operating-system process identifier.
pub type Pid = u32;

/// Answers "is this process currently running?".
pub trait LivenessProbe: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `pid` names a running process.
    fn is_running(&self, pid: Pid) -> bool;
}

impl<P: LivenessProbe + ?Sized> LivenessProbe for Box<P> {
    fn is_running(&self, pid: Pid) -> bool {
        (**self).is_running(pid)
    }
}
