//! Per-instance reentrancy lock.
//!
//! Set atomically on entry, released when the returned token drops, so
//! every exit path (including `?` and panics) clears it.

use super::errors::EscrowError;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Held for the duration of a guarded call.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardToken<'_>, EscrowError> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EscrowError::ReentrantCall)?;
        Ok(GuardToken { guard: self })
    }

    /// Runs `body` while holding the lock.
    pub fn guarded<T>(
        &self,
        body: impl FnOnce() -> Result<T, EscrowError>,
    ) -> Result<T, EscrowError> {
        let _token = self.enter()?;
        body()
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
