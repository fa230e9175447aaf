//! Async-aware mutex for the cooperative executors.
//!
//! Waiting tasks park their waker instead of spinning, so a task blocked on
//! the bus never holds up the other task of its executor. The lock word is
//! atomic, which makes the mutex usable between executors on different
//! cores.

use core::{
    cell::UnsafeCell,
    future::Future,
    ops::{Deref, DerefMut},
    pin::Pin,
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll, Waker},
};
use crossbeam_queue::ArrayQueue;
use log::warn;

/// Maximum number of parked wakers per mutex.
const MAX_WAITERS: usize = 16;

/// An async-aware mutex that yields to the scheduler when contended.
pub struct AsyncMutex<T> {
    /// The protected data.
    data: UnsafeCell<T>,
    /// Lock state: false = unlocked, true = locked.
    locked: AtomicBool,
    /// Parked waiters, all woken on release.
    waiters: ArrayQueue<Waker>,
}

// Safety: The data is only reachable through a guard, and a guard only
// exists while `locked` is held.
unsafe impl<T: Send> Send for AsyncMutex<T> {}
unsafe impl<T: Send> Sync for AsyncMutex<T> {}

impl<T> AsyncMutex<T> {
    /// Create a new unlocked mutex protecting the given data.
    pub fn new(data: T) -> Self {
        Self {
            data: UnsafeCell::new(data),
            locked: AtomicBool::new(false),
            waiters: ArrayQueue::new(MAX_WAITERS),
        }
    }

    /// Attempt to acquire the lock without waiting.
    pub fn try_lock(&self) -> Option<AsyncMutexGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(AsyncMutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Acquire the lock asynchronously.
    pub fn lock(&self) -> AsyncMutexLockFuture<'_, T> {
        AsyncMutexLockFuture { mutex: self }
    }

    /// Returns `true` if some guard is alive.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    // Parked wakers may be stale, so all of them are woken.
    fn wake_waiters(&self) {
        while let Some(waker) = self.waiters.pop() {
            waker.wake();
        }
    }
}

/// RAII guard that releases the mutex when dropped.
pub struct AsyncMutexGuard<'a, T> {
    mutex: &'a AsyncMutex<T>,
}

impl<T> Deref for AsyncMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Safety: We hold the lock, so we have exclusive access.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for AsyncMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: We hold the lock, so we have exclusive access.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for AsyncMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.locked.store(false, Ordering::Release);
        self.mutex.wake_waiters();
    }
}

/// Future returned by [`AsyncMutex::lock`].
pub struct AsyncMutexLockFuture<'a, T> {
    mutex: &'a AsyncMutex<T>,
}

impl<'a, T> Future for AsyncMutexLockFuture<'a, T> {
    type Output = AsyncMutexGuard<'a, T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mutex = self.mutex;
        if let Some(guard) = mutex.try_lock() {
            return Poll::Ready(guard);
        }

        // Park on every pending poll: a wakeup may have been consumed by a
        // waiter that lost the race for the lock.
        if mutex.waiters.push(cx.waker().clone()).is_err() {
            warn!("mutex waiter queue full; spinning through the executor");
            cx.waker().wake_by_ref();
        }

        // Double-check after registration to avoid lost wakeup
        match mutex.try_lock() {
            Some(guard) => Poll::Ready(guard),
            None => Poll::Pending,
        }
    }
}
