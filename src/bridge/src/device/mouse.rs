//! Emulated PS/2 mouse with optional Intellimouse wheel.
//!
//! Motion arriving from the network is folded into the movement counters
//! with [`Mouse::accumulate`] and sent with [`Mouse::send_report`]. Host
//! commands are served by [`Mouse::handle`].

use log::{debug, info, warn};
use ps2bridge_common::{Buttons, BusError, MouseReport, PacketFlags, StatusFlags};
use ps2bridge_hal::{Delay, Transport};

use super::{Port, RESET_HANDSHAKE, SELF_TEST_PASSED};

/// Host-to-mouse command bytes.
pub mod command {
    /// Reset and run the self test.
    pub const RESET: u8 = 0xFF;
    /// Resend the last packet.
    pub const RESEND: u8 = 0xFE;
    /// Restore default parameters.
    pub const SET_DEFAULTS: u8 = 0xF6;
    /// Disable data reporting.
    pub const DISABLE_REPORTING: u8 = 0xF5;
    /// Enable data reporting.
    pub const ENABLE_REPORTING: u8 = 0xF4;
    /// Set sample rate (one parameter byte).
    pub const SET_SAMPLE_RATE: u8 = 0xF3;
    /// Identify.
    pub const GET_DEVICE_ID: u8 = 0xF2;
    /// Enter remote mode.
    pub const SET_REMOTE_MODE: u8 = 0xF0;
    /// Enter wrap (echo) mode.
    pub const SET_WRAP_MODE: u8 = 0xEE;
    /// Leave wrap mode.
    pub const RESET_WRAP_MODE: u8 = 0xEC;
    /// Poll one movement packet.
    pub const READ_DATA: u8 = 0xEB;
    /// Enter stream mode.
    pub const SET_STREAM_MODE: u8 = 0xEA;
    /// Status request.
    pub const STATUS_REQUEST: u8 = 0xE9;
    /// Set resolution (one parameter byte).
    pub const SET_RESOLUTION: u8 = 0xE8;
    /// Set 2:1 scaling.
    pub const SET_SCALING_2_1: u8 = 0xE7;
    /// Set 1:1 scaling.
    pub const SET_SCALING_1_1: u8 = 0xE6;
}

/// Device id of a standard PS/2 mouse.
pub const ID_STANDARD: u8 = 0x00;
/// Device id of an Intellimouse with scroll wheel.
pub const ID_INTELLIMOUSE: u8 = 0x03;

/// Sample-rate sequence that unlocks the wheel.
pub const INTELLIMOUSE_KNOCK: [u8; 3] = [200, 100, 80];

/// Default sample rate in reports per second.
pub const DEFAULT_SAMPLE_RATE: u8 = 100;
/// Default resolution code (4 counts/mm).
pub const DEFAULT_RESOLUTION: u8 = 2;

const MAX_RESOLUTION: u8 = 3;

/// Mouse operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reports are pushed as motion arrives.
    Stream,
    /// Reports are sent only on a READ_DATA poll.
    Remote,
    /// Diagnostic loopback.
    Wrap,
}

/// Movement scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Linear.
    OneToOne,
    /// Non-linear acceleration table.
    TwoToOne,
}

/// Apply the 2:1 scaling table to one axis, preserving the sign.
pub fn scale_2_to_1(value: i16) -> i16 {
    let scaled = match value.unsigned_abs() as i32 {
        0 => 0,
        1 | 2 => 1,
        3 => 3,
        4 => 6,
        5 => 9,
        n => n * 2,
    };
    let signed = if value < 0 { -scaled } else { scaled };
    signed.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Emulated mouse state machine.
pub struct Mouse<T, D> {
    port: Port<T, D>,
    mode: Mode,
    previous_mode: Mode,
    has_wheel: bool,
    sample_rate: u8,
    min_report_interval_us: u32,
    rate_history: [u8; 3],
    resolution: u8,
    scaling: Scaling,
    data_reporting: bool,
    count_x: i16,
    count_y: i16,
    count_z: i8,
    overflow_x: bool,
    overflow_y: bool,
    buttons: Buttons,
}

impl<T: Transport, D: Delay> Mouse<T, D> {
    /// Create a mouse on the given line, in the power-on configuration.
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            port: Port::new(transport, delay),
            mode: Mode::Stream,
            previous_mode: Mode::Stream,
            has_wheel: false,
            sample_rate: DEFAULT_SAMPLE_RATE,
            min_report_interval_us: interval_for(DEFAULT_SAMPLE_RATE),
            rate_history: [0; 3],
            resolution: DEFAULT_RESOLUTION,
            scaling: Scaling::OneToOne,
            data_reporting: false,
            count_x: 0,
            count_y: 0,
            count_z: 0,
            overflow_x: false,
            overflow_y: false,
            buttons: Buttons::default(),
        }
    }

    /// Service at most one pending host command.
    ///
    /// Returns `true` if a command byte was read and processed.
    pub fn handle(&mut self) -> Result<bool, BusError> {
        if !self.port.available() {
            return Ok(false);
        }
        match self.port.read() {
            Ok(cmd) => self.reply(cmd).map(|_| true),
            Err(e) => {
                debug!("mouse: command read failed: {}", e);
                Ok(false)
            }
        }
    }

    fn reply(&mut self, cmd: u8) -> Result<(), BusError> {
        if self.mode == Mode::Wrap {
            return self.reply_wrapped(cmd);
        }

        match cmd {
            command::RESET => {
                info!("mouse: reset");
                let ack = self.port.ack();
                self.port.write_with(SELF_TEST_PASSED, RESET_HANDSHAKE)?;
                self.port.write_with(ID_STANDARD, RESET_HANDSHAKE)?;
                self.has_wheel = false;
                self.rate_history = [0; 3];
                self.restore_defaults();
                ack
            }
            command::RESEND => self.port.ack(),
            command::SET_DEFAULTS => {
                let ack = self.port.ack();
                self.restore_defaults();
                ack
            }
            command::DISABLE_REPORTING => {
                let ack = self.port.ack();
                self.data_reporting = false;
                self.clear_counters();
                ack
            }
            command::ENABLE_REPORTING => {
                let ack = self.port.ack();
                self.data_reporting = true;
                self.clear_counters();
                ack
            }
            command::SET_SAMPLE_RATE => {
                let ack = self.port.ack();
                let Ok(rate) = self.port.read() else {
                    return ack;
                };
                self.set_sample_rate(rate);
                let ack = ack.and(self.port.ack());
                self.clear_counters();
                ack
            }
            command::GET_DEVICE_ID => {
                let ack = self.port.ack();
                self.has_wheel = self.rate_history == INTELLIMOUSE_KNOCK;
                let id = if self.has_wheel {
                    info!("mouse: identifying as Intellimouse");
                    ID_INTELLIMOUSE
                } else {
                    ID_STANDARD
                };
                let ack = ack.and(self.port.write(id));
                self.clear_counters();
                ack
            }
            command::SET_REMOTE_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                self.set_mode(Mode::Remote);
                ack
            }
            command::SET_WRAP_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                self.set_mode(Mode::Wrap);
                ack
            }
            command::RESET_WRAP_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                ack
            }
            command::READ_DATA => {
                let ack = self.port.ack();
                ack.and(self.send_report())
            }
            command::SET_STREAM_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                self.set_mode(Mode::Stream);
                ack
            }
            command::STATUS_REQUEST => {
                let ack = self.port.ack();
                let status = self.status();
                ack.and(self.port.write_all(&status))
            }
            command::SET_RESOLUTION => {
                let ack = self.port.ack();
                let Ok(code) = self.port.read() else {
                    return ack;
                };
                if code <= MAX_RESOLUTION {
                    self.resolution = code;
                } else {
                    warn!("mouse: ignoring resolution code 0x{:02X}", code);
                }
                let ack = ack.and(self.port.ack());
                self.clear_counters();
                ack
            }
            command::SET_SCALING_2_1 => {
                self.scaling = Scaling::TwoToOne;
                self.port.ack()
            }
            command::SET_SCALING_1_1 => {
                self.scaling = Scaling::OneToOne;
                self.port.ack()
            }
            other => {
                warn!("mouse: unknown command 0x{:02X}", other);
                Ok(())
            }
        }
    }

    fn reply_wrapped(&mut self, cmd: u8) -> Result<(), BusError> {
        match cmd {
            command::SET_WRAP_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                ack
            }
            command::RESET_WRAP_MODE => {
                let ack = self.port.ack();
                self.clear_counters();
                self.set_mode(self.previous_mode);
                ack
            }
            echo => self.port.write(echo),
        }
    }

    fn set_sample_rate(&mut self, rate: u8) {
        let effective = if rate == 0 { DEFAULT_SAMPLE_RATE } else { rate };
        debug!("mouse: sample rate {}", effective);
        self.sample_rate = effective;
        self.min_report_interval_us = interval_for(effective);
        self.rate_history = [self.rate_history[1], self.rate_history[2], rate];
    }

    fn set_mode(&mut self, mode: Mode) {
        self.previous_mode = self.mode;
        self.mode = mode;
    }

    /// Everything SET_DEFAULTS restores; the wheel identity survives.
    fn restore_defaults(&mut self) {
        self.sample_rate = DEFAULT_SAMPLE_RATE;
        self.min_report_interval_us = interval_for(DEFAULT_SAMPLE_RATE);
        self.resolution = DEFAULT_RESOLUTION;
        self.scaling = Scaling::OneToOne;
        self.data_reporting = false;
        self.set_mode(Mode::Stream);
        self.clear_counters();
    }

    fn clear_counters(&mut self) {
        self.count_x = 0;
        self.count_y = 0;
        self.count_z = 0;
        self.overflow_x = false;
        self.overflow_y = false;
    }

    /// Fold a relative motion report into the movement counters.
    ///
    /// Button state is replaced, deltas are added.
    pub fn accumulate(&mut self, report: &MouseReport) {
        self.count_x = self.count_x.saturating_add(report.dx);
        self.count_y = self.count_y.saturating_add(report.dy);
        self.count_z = self.count_z.saturating_add(report.dz);
        self.overflow_x |=
            report.flags.contains(PacketFlags::X_OVERFLOW) || !(-255..=255).contains(&self.count_x);
        self.overflow_y |=
            report.flags.contains(PacketFlags::Y_OVERFLOW) || !(-255..=255).contains(&self.count_y);
        self.buttons = report.buttons();
    }

    /// Movement packet for the current counters.
    ///
    /// Returns the packet and its length: 4 bytes with a wheel, else 3.
    pub fn packet(&self) -> ([u8; 4], usize) {
        let (mut x, mut y) = (self.count_x, self.count_y);
        if self.scaling == Scaling::TwoToOne {
            x = scale_2_to_1(x);
            y = scale_2_to_1(y);
        }

        let mut flags = PacketFlags::ALWAYS_ONE;
        flags.set(PacketFlags::LEFT, self.buttons.left);
        flags.set(PacketFlags::RIGHT, self.buttons.right);
        flags.set(PacketFlags::MIDDLE, self.buttons.middle);
        flags.set(PacketFlags::X_SIGN, x < 0);
        flags.set(PacketFlags::Y_SIGN, y < 0);
        flags.set(
            PacketFlags::X_OVERFLOW,
            self.overflow_x || !(-256..=255).contains(&x),
        );
        flags.set(
            PacketFlags::Y_OVERFLOW,
            self.overflow_y || !(-256..=255).contains(&y),
        );

        let x = x.clamp(-256, 255);
        let y = y.clamp(-256, 255);
        let packet = [
            flags.bits(),
            x as u8,
            y as u8,
            (self.count_z as u8) & 0x0F,
        ];
        let len = if self.has_wheel { 4 } else { 3 };
        (packet, len)
    }

    /// Send one movement packet and clear the counters.
    ///
    /// The counters are cleared even if the host interrupted the packet;
    /// stale motion is not resent.
    pub fn send_report(&mut self) -> Result<(), BusError> {
        let (packet, len) = self.packet();
        let result = self.port.write_all(&packet[..len]);
        self.clear_counters();
        result
    }

    /// Reply bytes of the STATUS_REQUEST command.
    pub fn status(&self) -> [u8; 3] {
        let mut flags = StatusFlags::empty();
        flags.set(StatusFlags::LEFT, self.buttons.left);
        flags.set(StatusFlags::MIDDLE, self.buttons.middle);
        flags.set(StatusFlags::RIGHT, self.buttons.right);
        flags.set(StatusFlags::SCALING_2_1, self.scaling == Scaling::TwoToOne);
        flags.set(StatusFlags::REPORTING, self.data_reporting);
        flags.set(StatusFlags::REMOTE, self.mode == Mode::Remote);
        [flags.bits(), self.resolution, self.sample_rate]
    }

    /// Current operating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the host unlocked the wheel.
    pub fn has_wheel(&self) -> bool {
        self.has_wheel
    }

    /// Reports per second negotiated by the host.
    pub fn sample_rate(&self) -> u8 {
        self.sample_rate
    }

    /// Minimum spacing of stream reports.
    pub fn min_report_interval_us(&self) -> u32 {
        self.min_report_interval_us
    }

    /// Resolution code, 0..=3 for 1, 2, 4, 8 counts/mm.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Current scaling.
    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// Whether the host enabled data reporting.
    pub fn data_reporting_enabled(&self) -> bool {
        self.data_reporting
    }

    /// Pending movement: (x, y, wheel).
    pub fn counters(&self) -> (i16, i16, i8) {
        (self.count_x, self.count_y, self.count_z)
    }
}

fn interval_for(rate: u8) -> u32 {
    1_000_000 / rate.max(1) as u32
}
