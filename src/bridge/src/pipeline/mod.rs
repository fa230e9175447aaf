//! Per-device-class bridging pipelines.
//!
//! A pipeline bundles one emulated device, its [`BridgeQueue`], its
//! configuration and a handle to the shared [`BusLock`](crate::sync::BusLock).
//! The tasks in [`crate::task::workers`] drive it; every step that touches
//! the line takes a [`BusGuard`](crate::sync::BusGuard).

mod keyboard;
mod mouse;
mod queue;

pub use keyboard::KeyboardPipeline;
pub use mouse::MousePipeline;
pub use queue::{BridgeQueue, HeadFrame, NextFrame};

use ps2bridge_common::{BusError, FrameError};

/// Outcome of one forwarding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    /// Nothing was queued.
    Idle,
    /// The frame reached the host.
    Written,
    /// The host has reporting disabled; the frame was discarded.
    Dropped,
    /// Motion was accumulated for a later READ_DATA poll.
    Held,
    /// The frame failed re-validation.
    Rejected(FrameError),
    /// The host interrupted the write.
    Failed(BusError),
}
