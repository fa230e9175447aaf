//! Byte-level access to one PS/2 line.

use log::trace;
use ps2bridge_common::BusError;
use ps2bridge_hal::{Delay, Transport};

use super::ACK;

/// How often a write is attempted before the failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Single attempt; a failure is returned to the caller.
    Once,
    /// Retry until the host accepts the byte, sleeping between attempts.
    Forever {
        /// Delay between attempts.
        backoff_us: u32,
    },
}

/// A transport plus the delay used for write retries.
pub struct Port<T, D> {
    transport: T,
    delay: D,
}

impl<T: Transport, D: Delay> Port<T, D> {
    /// Wrap a transport.
    pub fn new(transport: T, delay: D) -> Self {
        Self { transport, delay }
    }

    /// Returns `true` if the host has a byte for us.
    pub fn available(&mut self) -> bool {
        self.transport.available()
    }

    /// Read one byte from the host.
    pub fn read(&mut self) -> Result<u8, BusError> {
        self.transport.read_byte()
    }

    /// Write one byte, single attempt.
    pub fn write(&mut self, byte: u8) -> Result<(), BusError> {
        self.transport.write_byte(byte)
    }

    /// Write one byte under the given retry policy.
    pub fn write_with(&mut self, byte: u8, policy: RetryPolicy) -> Result<(), BusError> {
        match policy {
            RetryPolicy::Once => self.write(byte),
            RetryPolicy::Forever { backoff_us } => {
                let mut retries = 0u32;
                while self.transport.write_byte(byte).is_err() {
                    retries = retries.saturating_add(1);
                    self.delay.delay_us(backoff_us);
                }
                if retries > 0 {
                    trace!("byte 0x{:02X} accepted after {} retries", byte, retries);
                }
                Ok(())
            }
        }
    }

    /// Write a byte sequence, stopping at the first failed byte.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        bytes.iter().try_for_each(|&b| self.write(b))
    }

    /// Send the acknowledge byte.
    pub fn ack(&mut self) -> Result<(), BusError> {
        self.write(ACK)
    }
}
