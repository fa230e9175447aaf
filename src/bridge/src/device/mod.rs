//! Emulated PS/2 devices.
//!
//! Each device is a command interpreter that *holds* a [`Port`] rather than
//! being one, so a scripted transport can drive it in tests.
//!
//! - [`Keyboard`]: AT keyboard command set, LED state
//! - [`Mouse`]: standard and Intellimouse command set, modes, reports

pub mod keyboard;
pub mod mouse;
mod port;

pub use keyboard::Keyboard;
pub use mouse::{Mode, Mouse, Scaling};
pub use port::{Port, RetryPolicy};

/// Acknowledge byte sent after every accepted command.
pub const ACK: u8 = 0xFA;

/// Basic assurance test passed, sent after a reset.
pub const SELF_TEST_PASSED: u8 = 0xAA;

/// Retry policy of the post-reset handshake: wait for the host, 1 ms apart.
pub const RESET_HANDSHAKE: RetryPolicy = RetryPolicy::Forever { backoff_us: 1_000 };
