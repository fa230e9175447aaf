//! PS/2 bridge Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines traits that abstract away the platform: the bit-banged
//! PS/2 line driver, the time base and the LED indicator.

#![no_std]

pub use ps2bridge_common::BusError;

/// A PS/2 device-side line driver for one clock/data pair.
///
/// Each call is one complete byte transaction (start bit, data, parity,
/// stop bit). Implementations are not reentrant; callers serialize access.
pub trait Transport {
    /// Sends a byte to the host.
    ///
    /// Fails if the host inhibited or interrupted the transfer.
    fn write_byte(&mut self, byte: u8) -> Result<(), BusError>;
    /// Receives a byte the host is clocking in.
    fn read_byte(&mut self) -> Result<u8, BusError>;
    /// Returns `true` if the host is requesting to send.
    fn available(&mut self) -> bool;
}

/// Trait for a monotonic time base.
pub trait Clock {
    /// Returns the number of microseconds since an arbitrary fixed epoch.
    fn now_us(&self) -> u64;
}

/// Trait for blocking delays.
pub trait Delay {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
}

/// Trait for the indicator driven by the keyboard LED state.
pub trait Indicator {
    /// Shows the LED byte last sent by the host (bit0 scroll, bit1 num, bit2 caps).
    fn set_leds(&mut self, leds: u8);
}
