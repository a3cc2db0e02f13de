// ── Non-queuing reentrancy guard ──

use std::sync::atomic::{AtomicBool, Ordering};

/// A flag that at most one caller can hold. Losers are turned away
/// instead of waiting.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub(crate) fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, including on early return or cancellation.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
