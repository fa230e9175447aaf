//! Emulated AT keyboard.
//!
//! The keyboard has a single operating mode. Host commands are answered
//! from [`Keyboard::handle`]; key output queued from the network is written
//! with [`Keyboard::write_frame`].

use log::{debug, info, warn};
use ps2bridge_common::BusError;
use ps2bridge_hal::{Delay, Transport};

use super::{Port, RESET_HANDSHAKE, SELF_TEST_PASSED};

/// Host-to-keyboard command bytes.
pub mod command {
    /// Reset and run the self test.
    pub const RESET: u8 = 0xFF;
    /// Resend the last byte.
    pub const RESEND: u8 = 0xFE;
    /// Restore default parameters.
    pub const SET_DEFAULTS: u8 = 0xF6;
    /// Stop scanning.
    pub const DISABLE_REPORTING: u8 = 0xF5;
    /// Start scanning.
    pub const ENABLE_REPORTING: u8 = 0xF4;
    /// Set typematic rate and delay (one parameter byte).
    pub const SET_TYPEMATIC: u8 = 0xF3;
    /// Identify.
    pub const GET_DEVICE_ID: u8 = 0xF2;
    /// Get/set scan code set (one parameter byte).
    pub const SET_SCAN_CODE_SET: u8 = 0xF0;
    /// Echo.
    pub const ECHO: u8 = 0xEE;
    /// Set LED state (one parameter byte).
    pub const SET_LEDS: u8 = 0xED;
}

/// Identification bytes of an MF2 AT keyboard.
pub const DEVICE_ID: [u8; 2] = [0xAB, 0x83];

/// Emulated keyboard state machine.
pub struct Keyboard<T, D> {
    port: Port<T, D>,
    data_reporting: bool,
    leds: Option<u8>,
}

impl<T: Transport, D: Delay> Keyboard<T, D> {
    /// Create a keyboard on the given line.
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            port: Port::new(transport, delay),
            data_reporting: false,
            leds: None,
        }
    }

    /// Service at most one pending host command.
    ///
    /// Returns the LED byte when the host just set the LED state. A failed
    /// reply is returned as an error; the host recovers through its own
    /// resend logic.
    pub fn handle(&mut self) -> Result<Option<u8>, BusError> {
        if !self.port.available() {
            return Ok(None);
        }
        match self.port.read() {
            Ok(cmd) => self.reply(cmd),
            Err(e) => {
                debug!("keyboard: command read failed: {}", e);
                Ok(None)
            }
        }
    }

    fn reply(&mut self, cmd: u8) -> Result<Option<u8>, BusError> {
        match cmd {
            command::RESET => {
                info!("keyboard: reset");
                let ack = self.port.ack();
                self.port.write_with(SELF_TEST_PASSED, RESET_HANDSHAKE)?;
                self.data_reporting = false;
                ack.map(|_| None)
            }
            command::RESEND | command::SET_DEFAULTS => self.port.ack().map(|_| None),
            command::DISABLE_REPORTING => {
                self.data_reporting = false;
                self.port.ack().map(|_| None)
            }
            command::ENABLE_REPORTING => {
                self.data_reporting = true;
                self.port.ack().map(|_| None)
            }
            command::SET_TYPEMATIC | command::SET_SCAN_CODE_SET => {
                let ack = self.port.ack();
                match self.port.read() {
                    // The parameter is accepted but has no effect here.
                    Ok(_) => ack.and(self.port.ack()).map(|_| None),
                    Err(_) => ack.map(|_| None),
                }
            }
            command::GET_DEVICE_ID => {
                let ack = self.port.ack();
                ack.and(self.port.write_all(&DEVICE_ID)).map(|_| None)
            }
            command::ECHO => self.port.write(command::ECHO).map(|_| None),
            command::SET_LEDS => {
                let ack = self.port.ack();
                let leds = match self.port.read() {
                    Ok(leds) => leds,
                    Err(_) => return ack.map(|_| None),
                };
                debug!("keyboard: LEDs 0x{:02X}", leds);
                self.leds = Some(leds);
                ack.and(self.port.ack()).map(|_| Some(leds))
            }
            other => {
                warn!("keyboard: unknown command 0x{:02X}", other);
                Ok(None)
            }
        }
    }

    /// Write a scancode sequence from the network verbatim.
    pub fn write_frame(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.port.write_all(bytes)
    }

    /// Whether the host enabled scanning.
    pub fn data_reporting_enabled(&self) -> bool {
        self.data_reporting
    }

    /// Most recent LED byte set by the host.
    pub fn leds(&self) -> Option<u8> {
        self.leds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ACK;
    use crate::testutil::{FakeDelay, FakeTransport};

    fn keyboard() -> (Keyboard<FakeTransport, FakeDelay>, FakeTransport) {
        let bus = FakeTransport::new();
        (Keyboard::new(bus.clone(), FakeDelay::new()), bus)
    }

    #[test]
    fn test_idle_line_does_nothing() {
        let (mut kbd, bus) = keyboard();
        assert_eq!(kbd.handle(), Ok(None));
        assert!(bus.written().is_empty());
    }

    #[test]
    fn test_reset_acks_then_self_test() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::ENABLE_REPORTING]);
        kbd.handle().unwrap();
        assert!(kbd.data_reporting_enabled());
        bus.take_written();

        bus.host_sends(&[command::RESET]);
        assert_eq!(kbd.handle(), Ok(None));
        assert_eq!(bus.written(), [ACK, SELF_TEST_PASSED]);
        assert!(!kbd.data_reporting_enabled());
    }

    #[test]
    fn test_reset_handshake_retries_until_accepted() {
        let bus = FakeTransport::new();
        let delay = FakeDelay::new();
        let mut kbd = Keyboard::new(bus.clone(), delay.clone());

        bus.host_sends(&[command::RESET]);
        // ACK goes through, the host then holds the clock for three attempts.
        bus.fail_writes_after(1, 3);
        assert_eq!(kbd.handle(), Ok(None));
        assert_eq!(bus.written(), [ACK, SELF_TEST_PASSED]);
        assert_eq!(delay.total_us(), 3_000);
    }

    #[test]
    fn test_get_device_id() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::GET_DEVICE_ID]);
        kbd.handle().unwrap();
        assert_eq!(bus.written(), [ACK, 0xAB, 0x83]);
    }

    #[test]
    fn test_echo_has_no_ack() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::ECHO]);
        kbd.handle().unwrap();
        assert_eq!(bus.written(), [0xEE]);
    }

    #[test]
    fn test_set_leds_reports_state() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::SET_LEDS, 0x04]);
        assert_eq!(kbd.handle(), Ok(Some(0x04)));
        assert_eq!(bus.written(), [ACK, ACK]);
        assert_eq!(kbd.leds(), Some(0x04));
    }

    #[test]
    fn test_parameter_commands_double_ack() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::SET_TYPEMATIC, 0x20, command::SET_SCAN_CODE_SET, 0x02]);
        kbd.handle().unwrap();
        kbd.handle().unwrap();
        assert_eq!(bus.written(), [ACK, ACK, ACK, ACK]);
        assert_eq!(bus.pending_inbound(), 0);
    }

    #[test]
    fn test_missing_parameter_aborts_second_ack() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::SET_LEDS]);
        assert_eq!(kbd.handle(), Ok(None));
        assert_eq!(bus.written(), [ACK]);
        assert_eq!(kbd.leds(), None);
    }

    #[test]
    fn test_enable_disable_reporting() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::ENABLE_REPORTING]);
        kbd.handle().unwrap();
        assert!(kbd.data_reporting_enabled());

        bus.host_sends(&[command::DISABLE_REPORTING]);
        kbd.handle().unwrap();
        assert!(!kbd.data_reporting_enabled());
        assert_eq!(bus.written(), [ACK, ACK]);
    }

    #[test]
    fn test_unknown_command_is_ignored() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[0x42]);
        assert_eq!(kbd.handle(), Ok(None));
        assert!(bus.written().is_empty());
    }

    #[test]
    fn test_failed_ack_is_reported() {
        let (mut kbd, bus) = keyboard();
        bus.host_sends(&[command::RESEND]);
        bus.fail_next_writes(1);
        assert_eq!(kbd.handle(), Err(BusError::WriteAborted));
    }

    #[test]
    fn test_write_frame_verbatim() {
        let (mut kbd, bus) = keyboard();
        kbd.write_frame(&[0x1C, 0xF0, 0x1C]).unwrap();
        assert_eq!(bus.written(), [0x1C, 0xF0, 0x1C]);
    }
}
