//! Timed suspension against the platform clock.
//!
//! A sleeping task is parked in a [`TimerQueue`] with its deadline. The
//! executor owning the queue wakes it once the clock passes the deadline, so
//! an executor whose tasks are all asleep has nothing to poll.

use alloc::vec::Vec;
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll, Waker},
};
use ps2bridge_hal::Clock;
use spin::Mutex;

/// Deadlines of parked sleepers.
#[derive(Default)]
pub struct TimerQueue {
    sleepers: Mutex<Vec<(u64, Waker)>>,
}

impl TimerQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, deadline: u64, waker: &Waker) {
        let mut sleepers = self.sleepers.lock();
        if sleepers
            .iter()
            .any(|(at, parked)| *at == deadline && parked.will_wake(waker))
        {
            return;
        }
        sleepers.push((deadline, waker.clone()));
    }

    /// Wake every sleeper whose deadline is at or before `now_us`.
    ///
    /// Returns the number of tasks woken.
    pub fn wake_expired(&self, now_us: u64) -> usize {
        let expired: Vec<Waker> = {
            let mut sleepers = self.sleepers.lock();
            let mut expired = Vec::new();
            sleepers.retain(|(deadline, waker)| {
                if *deadline <= now_us {
                    expired.push(waker.clone());
                    false
                } else {
                    true
                }
            });
            expired
        };
        let woken = expired.len();
        for waker in expired {
            waker.wake();
        }
        woken
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.sleepers.lock().iter().map(|(deadline, _)| *deadline).min()
    }

    /// Number of parked sleepers.
    pub fn len(&self) -> usize {
        self.sleepers.lock().len()
    }

    /// Returns `true` if nobody is asleep.
    pub fn is_empty(&self) -> bool {
        self.sleepers.lock().is_empty()
    }
}

/// Suspend the current task for at least `us` microseconds.
///
/// The task is parked in `timers` until the executor that owns the queue
/// sees `clock` pass the deadline.
pub fn sleep<'a, C: Clock>(timers: &'a TimerQueue, clock: &'a C, us: u64) -> Sleep<'a, C> {
    Sleep {
        deadline: clock.now_us().saturating_add(us),
        timers,
        clock,
    }
}

/// Future returned by [`sleep`].
pub struct Sleep<'a, C> {
    timers: &'a TimerQueue,
    clock: &'a C,
    deadline: u64,
}

impl<C: Clock> Future for Sleep<'_, C> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now_us() >= self.deadline {
            Poll::Ready(())
        } else {
            self.timers.register(self.deadline, cx.waker());
            Poll::Pending
        }
    }
}
