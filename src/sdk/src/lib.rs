//! Sender-side helpers for the PS/2 bridge datagram format.
//!
//! A datagram is a sequence of `tag, len, payload[len]` frames. The builder
//! produces only frames the bridge accepts: keyboard sequences are split
//! into payloads of at most 16 bytes, and large motions are split into
//! several in-range mouse reports.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use ps2bridge_common::frame::TAG_WAIT;
use ps2bridge_common::{Buttons, DeviceKind, EventFrame, FrameError, MouseReport, MAX_PAYLOAD};

/// Motion range of one report without overflow.
const MAX_STEP: i32 = 255;
const MIN_STEP: i32 = -256;

/// Builds one bridge datagram.
#[derive(Debug, Clone, Default)]
pub struct DatagramBuilder {
    bytes: Vec<u8>,
}

impl DatagramBuilder {
    /// Start an empty datagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prepared frame.
    pub fn frame(&mut self, frame: &EventFrame) -> &mut Self {
        self.bytes.push(frame.kind().tag());
        self.bytes.push(frame.len() as u8);
        self.bytes.extend_from_slice(frame.payload());
        self
    }

    /// Append scancodes, split into as many keyboard frames as needed.
    pub fn keys(&mut self, scancodes: &[u8]) -> &mut Self {
        for chunk in scancodes.chunks(MAX_PAYLOAD) {
            // Chunks never exceed MAX_PAYLOAD, so the frame always builds.
            if let Ok(frame) = EventFrame::new(DeviceKind::Keyboard, chunk) {
                self.frame(&frame);
            }
        }
        self
    }

    /// Append one mouse report.
    pub fn report(&mut self, report: &MouseReport) -> &mut Self {
        self.frame(&EventFrame::mouse(report))
    }

    /// Append relative motion, split into reports that do not overflow.
    ///
    /// The wheel delta and buttons travel with the first report.
    pub fn motion(&mut self, dx: i32, dy: i32, dz: i32, buttons: Buttons) -> &mut Self {
        let (mut rest_x, mut rest_y) = (dx, dy);
        let mut wheel = dz;
        loop {
            let step_x = rest_x.clamp(MIN_STEP, MAX_STEP);
            let step_y = rest_y.clamp(MIN_STEP, MAX_STEP);
            self.report(&MouseReport::from_motion(step_x, step_y, wheel, buttons));
            rest_x -= step_x;
            rest_y -= step_y;
            wheel = 0;
            if rest_x == 0 && rest_y == 0 {
                return self;
            }
        }
    }

    /// Append a wait frame with `len` padding bytes.
    pub fn wait(&mut self, len: u8) -> Result<&mut Self, FrameError> {
        if len as usize > MAX_PAYLOAD {
            return Err(FrameError::LengthTooLarge(len));
        }
        self.bytes.push(TAG_WAIT);
        self.bytes.push(len);
        self.bytes.resize(self.bytes.len() + len as usize, 0);
        Ok(self)
    }

    /// Encoded size so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The encoded datagram so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded datagram.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_frame() {
        let mut builder = DatagramBuilder::new();
        builder.keys(&[0x1C, 0xF0, 0x1C]);
        assert_eq!(builder.finish(), [b'K', 3, 0x1C, 0xF0, 0x1C]);
    }

    #[test]
    fn test_long_key_sequence_is_split() {
        let codes: Vec<u8> = (0..20).collect();
        let mut builder = DatagramBuilder::new();
        builder.keys(&codes);
        let bytes = builder.finish();
        assert_eq!(bytes.len(), 2 + 16 + 2 + 4);
        assert_eq!(&bytes[..2], [b'K', 16]);
        assert_eq!(&bytes[18..20], [b'K', 4]);
    }

    #[test]
    fn test_small_motion_is_one_report() {
        let mut builder = DatagramBuilder::new();
        builder.motion(5, -6, 0, Buttons::default());
        assert_eq!(builder.finish(), [b'M', 4, 0x28, 0x05, 0xFA, 0x00]);
    }

    #[test]
    fn test_large_motion_is_split() {
        let mut builder = DatagramBuilder::new();
        builder.motion(600, 0, -1, Buttons::default());
        let bytes = builder.finish();
        // 255 + 255 + 90
        assert_eq!(bytes.len(), 3 * 6);
        assert_eq!(&bytes[0..6], [b'M', 4, 0x08, 0xFF, 0x00, 0xFF]);
        assert_eq!(&bytes[6..12], [b'M', 4, 0x08, 0xFF, 0x00, 0x00]);
        assert_eq!(&bytes[12..18], [b'M', 4, 0x08, 90, 0x00, 0x00]);
    }

    #[test]
    fn test_wait_frame() {
        let mut builder = DatagramBuilder::new();
        builder.wait(2).unwrap().keys(&[0x29]);
        assert_eq!(builder.as_bytes(), [b'W', 2, 0, 0, b'K', 1, 0x29]);
        assert_eq!(
            DatagramBuilder::new().wait(17).err(),
            Some(FrameError::LengthTooLarge(17))
        );
    }
}
