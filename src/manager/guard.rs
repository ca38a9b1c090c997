//! RAII guard for an acquired domain lock.

use super::ProcessManager;
use crate::error::Result;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A lock held through a [`ProcessManager`].
///
/// When dropped, the subject and the thread slot are released. If releasing
/// fails during drop, a warning is logged but no panic occurs; the records
/// are reclaimed once this process exits anyway.
#[derive(Debug)]
pub struct LockGuard<'a> {
    manager: &'a mut ProcessManager,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(manager: &'a mut ProcessManager) -> Self {
        Self {
            manager,
            released: false,
        }
    }

    /// Release now and report failures instead of logging them.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.manager.release()
    }
}

impl Deref for LockGuard<'_> {
    type Target = ProcessManager;

    fn deref(&self) -> &ProcessManager {
        &*self.manager
    }
}

impl DerefMut for LockGuard<'_> {
    fn deref_mut(&mut self) -> &mut ProcessManager {
        &mut *self.manager
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.manager.release()
        {
            warn!(
                domain = %self.manager.domain(),
                pid = self.manager.pid(),
                error = %e,
                "failed to release lock on drop"
            );
        }
    }
}
