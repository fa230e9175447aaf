//! System-wide error types for the PS/2 bridge.

use core::fmt;

/// Failure of a single byte transaction on the PS/2 bus.
///
/// Either way the host interrupted the transfer (clock held low, timing
/// violated, inhibit). The byte must be considered not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BusError {
    /// Device-to-host write was aborted by the host.
    WriteAborted,
    /// Host-to-device read did not complete.
    ReadAborted,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::WriteAborted => write!(f, "bus write aborted by host"),
            BusError::ReadAborted => write!(f, "bus read aborted"),
        }
    }
}

/// Framing and validation errors of the network bridging protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameError {
    /// The class tag is not one of `K`, `M` or `W`.
    UnknownTag(u8),
    /// The datagram ends between the tag and the length byte.
    MissingLength,
    /// The declared payload length exceeds the payload capacity.
    LengthTooLarge(u8),
    /// Fewer bytes remain in the datagram than the frame declares.
    Truncated {
        /// Payload length from the frame header.
        declared: usize,
        /// Bytes actually left in the datagram.
        available: usize,
    },
    /// A mouse report must be exactly four bytes long.
    MouseLength(u8),
    /// Bit 3 of the mouse status byte is not set.
    MissingSyncBit,
    /// The wheel delta is outside [-8, 7].
    WheelOutOfRange(i8),
    /// A mouse report was requested from a keyboard frame.
    NotMouse,
}

impl FrameError {
    /// Returns `true` if the error leaves the frame boundary intact.
    ///
    /// Validation errors only discard the offending frame; framing errors
    /// discard the rest of the datagram.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FrameError::MouseLength(_)
                | FrameError::MissingSyncBit
                | FrameError::WheelOutOfRange(_)
                | FrameError::NotMouse
        )
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::UnknownTag(tag) => write!(f, "unknown frame tag 0x{:02X}", tag),
            FrameError::MissingLength => write!(f, "frame header lacks a length byte"),
            FrameError::LengthTooLarge(len) => {
                write!(f, "frame length {} exceeds payload capacity", len)
            }
            FrameError::Truncated {
                declared,
                available,
            } => write!(
                f,
                "truncated frame: declared {} bytes, {} available",
                declared, available
            ),
            FrameError::MouseLength(len) => write!(f, "mouse report must be 4 bytes, got {}", len),
            FrameError::MissingSyncBit => write!(f, "mouse status byte lacks the always-one bit"),
            FrameError::WheelOutOfRange(dz) => write!(f, "wheel delta {} outside [-8, 7]", dz),
            FrameError::NotMouse => write!(f, "frame is not a mouse frame"),
        }
    }
}

/// Configuration rejected by [`crate::BridgeConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigError {
    /// A bridging queue must hold at least one frame.
    ZeroQueueCapacity,
    /// Host polling needs a non-zero backoff.
    ZeroPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroQueueCapacity => write!(f, "queue capacity must be non-zero"),
            ConfigError::ZeroPollInterval => write!(f, "poll interval must be non-zero"),
        }
    }
}

/// Network receive path errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetError {
    /// The socket could not be bound to the requested port.
    BindFailed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::BindFailed => write!(f, "failed to bind socket"),
        }
    }
}
