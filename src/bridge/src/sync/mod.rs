//! Synchronization primitives for the bridge executors.
//!
//! # Primitives
//!
//! - [`AsyncMutex<T>`]: Exclusive lock that yields when contended
//! - [`BusLock`]: the single lock over all PS/2 line traffic
//!
//! Device state itself sits behind a `spin::Mutex` inside its pipeline and
//! is only ever locked for the duration of one synchronous step, never
//! across an `.await`.

mod bus;
mod mutex;

pub use bus::{BusGuard, BusLock};
pub use mutex::{AsyncMutex, AsyncMutexGuard, AsyncMutexLockFuture};
