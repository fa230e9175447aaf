//! Routing of network datagrams into the bridging queues.

use alloc::sync::Arc;
use log::{debug, trace};
use ps2bridge_common::{DeviceKind, EventFrame};

use super::{Frame, FrameParser};
use crate::pipeline::BridgeQueue;

/// Per-datagram accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngressStats {
    /// Frames admitted to a queue.
    pub accepted: usize,
    /// Frames discarded for framing or validation errors.
    pub rejected: usize,
    /// Valid frames dropped because their queue was full.
    pub dropped: usize,
    /// Wait frames skipped.
    pub waits: usize,
}

impl IngressStats {
    /// Add another datagram's counts.
    pub fn merge(&mut self, other: IngressStats) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.dropped += other.dropped;
        self.waits += other.waits;
    }
}

/// The network side of the bridge: parses datagrams and enqueues frames.
///
/// Never blocks and never fails; loss is reported through [`IngressStats`].
#[derive(Clone)]
pub struct Ingress {
    keyboard: Arc<BridgeQueue>,
    mouse: Arc<BridgeQueue>,
}

impl Ingress {
    /// Route frames into the given queues.
    pub fn new(keyboard: Arc<BridgeQueue>, mouse: Arc<BridgeQueue>) -> Self {
        Self { keyboard, mouse }
    }

    /// Parse one datagram and enqueue every admissible frame.
    pub fn handle_datagram(&self, datagram: &[u8]) -> IngressStats {
        let mut stats = IngressStats::default();
        for item in FrameParser::new(datagram) {
            match item {
                Ok(Frame::Event(frame)) => self.enqueue(frame, &mut stats),
                Ok(Frame::Wait(len)) => {
                    trace!("ingress: wait frame of {} bytes", len);
                    stats.waits += 1;
                }
                Err(e) => {
                    if e.is_validation() {
                        debug!("ingress: discarding frame: {}", e);
                    } else {
                        debug!("ingress: discarding rest of datagram: {}", e);
                    }
                    stats.rejected += 1;
                }
            }
        }
        stats
    }

    fn enqueue(&self, frame: EventFrame, stats: &mut IngressStats) {
        let queue = match frame.kind() {
            DeviceKind::Keyboard => &self.keyboard,
            DeviceKind::Mouse => &self.mouse,
        };
        match queue.push(frame) {
            Ok(()) => stats.accepted += 1,
            Err(_) => {
                debug!("ingress: {:?} queue full; dropping frame", frame.kind());
                stats.dropped += 1;
            }
        }
    }
}
