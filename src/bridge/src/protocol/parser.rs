//! Frame-by-frame parsing of bridging datagrams.

use ps2bridge_common::frame::{TAG_KEYBOARD, TAG_MOUSE, TAG_WAIT};
use ps2bridge_common::{DeviceKind, EventFrame, FrameError, MAX_PAYLOAD};

/// One unit of a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// An admissible device event.
    Event(EventFrame),
    /// A pacing frame; the payload of this many bytes was skipped.
    Wait(u8),
}

/// Iterator over the frames of one datagram.
///
/// A validation error only rejects the current frame. A framing error
/// (unknown tag, oversized or truncated frame) is yielded once and ends the
/// iteration: without a trustworthy length the rest of the datagram cannot
/// be resynchronized.
pub struct FrameParser<'a> {
    rest: &'a [u8],
    done: bool,
}

impl<'a> FrameParser<'a> {
    /// Parse `datagram` from its first byte.
    pub fn new(datagram: &'a [u8]) -> Self {
        Self {
            rest: datagram,
            done: false,
        }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    fn fail(&mut self, error: FrameError) -> Option<Result<Frame, FrameError>> {
        self.done = true;
        self.rest = &[];
        Some(Err(error))
    }
}

impl Iterator for FrameParser<'_> {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (&tag, after_tag) = self.rest.split_first()?;
        if !matches!(tag, TAG_KEYBOARD | TAG_MOUSE | TAG_WAIT) {
            return self.fail(FrameError::UnknownTag(tag));
        }
        let Some((&len, body)) = after_tag.split_first() else {
            return self.fail(FrameError::MissingLength);
        };
        let declared = len as usize;
        if declared > MAX_PAYLOAD {
            return self.fail(FrameError::LengthTooLarge(len));
        }
        if body.len() < declared {
            return self.fail(FrameError::Truncated {
                declared,
                available: body.len(),
            });
        }

        let (payload, rest) = body.split_at(declared);
        self.rest = rest;

        let Some(kind) = DeviceKind::from_tag(tag) else {
            return Some(Ok(Frame::Wait(len)));
        };
        let frame = match EventFrame::new(kind, payload) {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        Some(frame.validate().map(|_| Frame::Event(frame)))
    }
}
