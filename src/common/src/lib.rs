//! Types shared by the PS/2 bridge, its HAL and the sender SDK.
//!
//! - [`error`]: error taxonomy for bus, framing and configuration failures
//! - [`flags`]: bit layouts of the mouse packet and status bytes
//! - [`frame`]: the network bridging frame and the typed mouse report
//! - [`config`]: operator-facing configuration knobs

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod flags;
pub mod frame;

pub use config::{BridgeConfig, DeviceConfig};
pub use error::{BusError, ConfigError, FrameError, NetError};
pub use flags::{PacketFlags, StatusFlags};
pub use frame::{Buttons, DeviceKind, EventFrame, MouseReport, MAX_PAYLOAD};
