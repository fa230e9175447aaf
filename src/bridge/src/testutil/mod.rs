//! Test doubles for the HAL traits.
//!
//! Every fake is a cheap `Clone` handle onto shared state, so a test can keep
//! one handle while the device or pipeline owns another.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ps2bridge::testutil::{FakeDelay, FakeTransport};
//!
//! let bus = FakeTransport::new();
//! let mut keyboard = Keyboard::new(bus.clone(), FakeDelay::new());
//! bus.host_sends(&[0xF2]);
//! keyboard.handle()?;
//! assert_eq!(bus.written(), [0xFA, 0xAB, 0x83]);
//! ```

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use ps2bridge_common::BusError;
use ps2bridge_hal::{Clock, Delay, Indicator, Transport};
use spin::Mutex;

#[derive(Default)]
struct Line {
    inbound: VecDeque<u8>,
    written: Vec<u8>,
    writes_before_failure: usize,
    write_failures: usize,
    reads_before_failure: usize,
    read_failures: usize,
    write_attempts: usize,
}

/// Scripted PS/2 line.
///
/// Bytes queued with [`FakeTransport::host_sends`] are returned by
/// `read_byte`; every accepted write is recorded.
#[derive(Clone, Default)]
pub struct FakeTransport {
    line: Arc<Mutex<Line>>,
}

impl FakeTransport {
    /// Create an idle line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes the host will clock in.
    pub fn host_sends(&self, bytes: &[u8]) {
        self.line.lock().inbound.extend(bytes.iter().copied());
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_writes_after(0, count);
    }

    /// Let `ok` writes through, then fail the following `count` writes.
    pub fn fail_writes_after(&self, ok: usize, count: usize) {
        let mut line = self.line.lock();
        line.writes_before_failure = ok;
        line.write_failures = count;
    }

    /// Let `ok` reads through, then fail the following `count` reads.
    ///
    /// A failed read loses the byte the host was sending.
    pub fn fail_reads_after(&self, ok: usize, count: usize) {
        let mut line = self.line.lock();
        line.reads_before_failure = ok;
        line.read_failures = count;
    }

    /// Bytes accepted by the host so far.
    pub fn written(&self) -> Vec<u8> {
        self.line.lock().written.clone()
    }

    /// Return and forget the bytes accepted so far.
    pub fn take_written(&self) -> Vec<u8> {
        core::mem::take(&mut self.line.lock().written)
    }

    /// Host bytes not yet read by the device.
    pub fn pending_inbound(&self) -> usize {
        self.line.lock().inbound.len()
    }

    /// Number of write attempts, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.line.lock().write_attempts
    }
}

impl Transport for FakeTransport {
    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        let mut line = self.line.lock();
        line.write_attempts += 1;
        if line.write_failures > 0 {
            if line.writes_before_failure > 0 {
                line.writes_before_failure -= 1;
            } else {
                line.write_failures -= 1;
                return Err(BusError::WriteAborted);
            }
        }
        line.written.push(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, BusError> {
        let mut line = self.line.lock();
        if line.read_failures > 0 {
            if line.reads_before_failure > 0 {
                line.reads_before_failure -= 1;
            } else {
                line.read_failures -= 1;
                line.inbound.pop_front();
                return Err(BusError::ReadAborted);
            }
        }
        line.inbound.pop_front().ok_or(BusError::ReadAborted)
    }

    fn available(&mut self) -> bool {
        !self.line.lock().inbound.is_empty()
    }
}

/// Delay that only records how long it was asked to wait.
#[derive(Clone, Default)]
pub struct FakeDelay {
    total_us: Arc<AtomicU64>,
}

impl FakeDelay {
    /// Create a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested delays.
    pub fn total_us(&self) -> u64 {
        self.total_us.load(Ordering::Relaxed)
    }
}

impl Delay for FakeDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us.fetch_add(us as u64, Ordering::Relaxed);
    }
}

/// Manually driven clock.
///
/// With a non-zero step the clock also advances by `step` on every read,
/// which lets sleeping tasks make progress under a test executor.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    step: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock frozen at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that advances `step_us` per read.
    pub fn stepping(step_us: u64) -> Self {
        let clock = Self::default();
        clock.step.store(step_us, Ordering::Relaxed);
        clock
    }

    /// Move time forward.
    pub fn advance(&self, us: u64) {
        self.now.fetch_add(us, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        let step = self.step.load(Ordering::Relaxed);
        self.now.fetch_add(step, Ordering::Relaxed)
    }
}

/// Indicator that records every LED byte it was shown.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    history: Arc<Mutex<Vec<u8>>>,
}

impl RecordingIndicator {
    /// Create an indicator with empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// LED bytes in the order they were shown.
    pub fn history(&self) -> Vec<u8> {
        self.history.lock().clone()
    }
}

impl Indicator for RecordingIndicator {
    fn set_leds(&mut self, leds: u8) {
        self.history.lock().push(leds);
    }
}
