//! PS/2 keyboard and mouse emulation bridged from network events.
//!
//! # Architecture
//!
//! The crate is structured into the following modules:
//! - `device`: keyboard and mouse state machines answering host commands
//! - `protocol`: datagram framing and routing into the bridging queues
//! - `pipeline`: per-class queue, device state and forwarding steps
//! - `sync`: the async mutex and the shared bus lock
//! - `task`: priority executor, sleeps and the per-class task loops
//! - `net`: smoltcp UDP receive path
//! - `runtime`: wires the above into a [`Bridge`]
//! - `testutil`: scripted transport, clock and indicator fakes
//!
//! The bit-level line driver, clock, delay and LED output come from the
//! platform through the `ps2bridge-hal` traits.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod device;
pub mod net;
pub mod pipeline;
pub mod protocol;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod testutil;

pub use runtime::Bridge;
