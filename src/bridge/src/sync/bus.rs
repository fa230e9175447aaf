//! The lock serializing all PS/2 line traffic.
//!
//! Both lines are bit-banged by the same CPU, so a byte transaction on one
//! device must not be preempted by I/O on the other. One [`BusLock`] is
//! shared by the keyboard and mouse pipelines; every operation that touches
//! a transport takes a [`BusGuard`] as proof that it holds the lock.

use super::{AsyncMutex, AsyncMutexGuard};

/// Mutual exclusion over all PS/2 transports.
pub struct BusLock {
    inner: AsyncMutex<()>,
}

/// Proof of holding the [`BusLock`]. The lock is released on drop.
pub struct BusGuard<'a> {
    _guard: AsyncMutexGuard<'a, ()>,
}

impl Default for BusLock {
    fn default() -> Self {
        Self::new()
    }
}

impl BusLock {
    /// Create an unlocked bus.
    pub fn new() -> Self {
        Self {
            inner: AsyncMutex::new(()),
        }
    }

    /// Wait for the bus.
    pub async fn lock(&self) -> BusGuard<'_> {
        BusGuard {
            _guard: self.inner.lock().await,
        }
    }

    /// Take the bus if nobody holds it.
    pub fn try_lock(&self) -> Option<BusGuard<'_>> {
        self.inner.try_lock().map(|guard| BusGuard { _guard: guard })
    }

    /// Returns `true` while a transaction is in flight.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_guard_releases_on_drop() {
        let bus = BusLock::new();
        {
            let _guard = bus.try_lock().expect("free bus");
            assert!(bus.is_locked());
            assert!(bus.try_lock().is_none());
        }
        assert!(!bus.is_locked());
    }
}
