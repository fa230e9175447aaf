//! Network bridging frames.
//!
//! Wire format of one frame:
//!
//! ```text
//! [tag:1][len:1][payload:len]
//! ```
//!
//! `tag` is `K` (keyboard), `M` (mouse) or `W` (wait). Several frames may be
//! concatenated in one datagram.

use crate::error::FrameError;
use crate::flags::PacketFlags;

/// Payload capacity of a single frame.
pub const MAX_PAYLOAD: usize = 16;

/// Tag of a keyboard frame.
pub const TAG_KEYBOARD: u8 = b'K';
/// Tag of a mouse frame.
pub const TAG_MOUSE: u8 = b'M';
/// Tag of a wait frame. Its payload is consumed and ignored.
pub const TAG_WAIT: u8 = b'W';

/// Length of a mouse relative-motion report.
pub const MOUSE_REPORT_LEN: usize = 4;

/// Device class a frame is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Payload is written verbatim to the keyboard bus.
    Keyboard,
    /// Payload is a 4-byte relative motion report.
    Mouse,
}

impl DeviceKind {
    /// Wire tag of this device class.
    pub fn tag(self) -> u8 {
        match self {
            DeviceKind::Keyboard => TAG_KEYBOARD,
            DeviceKind::Mouse => TAG_MOUSE,
        }
    }

    /// Device class for a wire tag, if the tag names one.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_KEYBOARD => Some(DeviceKind::Keyboard),
            TAG_MOUSE => Some(DeviceKind::Mouse),
            _ => None,
        }
    }
}

/// One parsed unit of the bridging protocol.
///
/// Immutable once built; the payload is stored inline so frames can be
/// queued without allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFrame {
    kind: DeviceKind,
    len: u8,
    payload: [u8; MAX_PAYLOAD],
}

impl EventFrame {
    /// Builds a frame, rejecting payloads longer than [`MAX_PAYLOAD`].
    pub fn new(kind: DeviceKind, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::LengthTooLarge(
                payload.len().min(u8::MAX as usize) as u8,
            ));
        }
        let mut buf = [0u8; MAX_PAYLOAD];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            kind,
            len: payload.len() as u8,
            payload: buf,
        })
    }

    /// Builds a mouse frame carrying `report`.
    pub fn mouse(report: &MouseReport) -> Self {
        let mut payload = [0u8; MAX_PAYLOAD];
        payload[..MOUSE_REPORT_LEN].copy_from_slice(&report.to_bytes());
        Self {
            kind: DeviceKind::Mouse,
            len: MOUSE_REPORT_LEN as u8,
            payload,
        }
    }

    /// Device class of this frame.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` for a frame without payload.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }

    /// Checks the per-class content rules.
    ///
    /// Keyboard payloads are forwarded verbatim and always pass.
    pub fn validate(&self) -> Result<(), FrameError> {
        match self.kind {
            DeviceKind::Keyboard => Ok(()),
            DeviceKind::Mouse => MouseReport::parse(self.payload()).map(|_| ()),
        }
    }

    /// Typed view of a mouse frame.
    pub fn mouse_report(&self) -> Result<MouseReport, FrameError> {
        match self.kind {
            DeviceKind::Keyboard => Err(FrameError::NotMouse),
            DeviceKind::Mouse => MouseReport::parse(self.payload()),
        }
    }
}

/// Mouse button state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Buttons {
    /// Left button pressed.
    pub left: bool,
    /// Right button pressed.
    pub right: bool,
    /// Middle button pressed.
    pub middle: bool,
}

/// A validated relative motion report.
///
/// `dx`/`dy` are the 9-bit two's complement values rebuilt from the data
/// bytes and the sign bits of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseReport {
    /// Raw status byte, always containing [`PacketFlags::ALWAYS_ONE`].
    pub flags: PacketFlags,
    /// Horizontal movement, -256..=255.
    pub dx: i16,
    /// Vertical movement, -256..=255.
    pub dy: i16,
    /// Wheel movement, -8..=7.
    pub dz: i8,
}

impl MouseReport {
    /// Parses and validates a 4-byte report payload.
    pub fn parse(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() != MOUSE_REPORT_LEN {
            return Err(FrameError::MouseLength(
                payload.len().min(u8::MAX as usize) as u8,
            ));
        }
        let flags = PacketFlags::from_bits_retain(payload[0]);
        if !flags.contains(PacketFlags::ALWAYS_ONE) {
            return Err(FrameError::MissingSyncBit);
        }
        let dz = payload[3] as i8;
        if !(-8..=7).contains(&dz) {
            return Err(FrameError::WheelOutOfRange(dz));
        }
        Ok(Self {
            flags,
            dx: sign_extend(payload[1], flags.contains(PacketFlags::X_SIGN)),
            dy: sign_extend(payload[2], flags.contains(PacketFlags::Y_SIGN)),
            dz,
        })
    }

    /// Builds a report from raw motion, saturating out-of-range deltas.
    ///
    /// Deltas beyond the 9-bit range are clamped and flagged as overflow.
    pub fn from_motion(dx: i32, dy: i32, dz: i32, buttons: Buttons) -> Self {
        let mut flags = PacketFlags::ALWAYS_ONE;
        flags.set(PacketFlags::LEFT, buttons.left);
        flags.set(PacketFlags::RIGHT, buttons.right);
        flags.set(PacketFlags::MIDDLE, buttons.middle);
        flags.set(PacketFlags::X_OVERFLOW, !(-256..=255).contains(&dx));
        flags.set(PacketFlags::Y_OVERFLOW, !(-256..=255).contains(&dy));
        let dx = dx.clamp(-256, 255) as i16;
        let dy = dy.clamp(-256, 255) as i16;
        flags.set(PacketFlags::X_SIGN, dx < 0);
        flags.set(PacketFlags::Y_SIGN, dy < 0);
        Self {
            flags,
            dx,
            dy,
            dz: dz.clamp(-8, 7) as i8,
        }
    }

    /// Button state carried in the status byte.
    pub fn buttons(&self) -> Buttons {
        Buttons {
            left: self.flags.contains(PacketFlags::LEFT),
            right: self.flags.contains(PacketFlags::RIGHT),
            middle: self.flags.contains(PacketFlags::MIDDLE),
        }
    }

    /// Wire encoding of the report.
    pub fn to_bytes(&self) -> [u8; MOUSE_REPORT_LEN] {
        [
            self.flags.bits(),
            self.dx as u8,
            self.dy as u8,
            self.dz as u8,
        ]
    }
}

fn sign_extend(low: u8, negative: bool) -> i16 {
    if negative {
        low as i16 - 256
    } else {
        low as i16
    }
}
