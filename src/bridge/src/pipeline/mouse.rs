//! Mouse pipeline: lossy, rate-limited report delivery.

use alloc::sync::Arc;
use log::{debug, trace, warn};
use ps2bridge_common::{BusError, DeviceConfig, EventFrame};
use ps2bridge_hal::{Delay, Transport};
use spin::Mutex;

use super::{BridgeQueue, Forward};
use crate::device::{Mode, Mouse};
use crate::sync::{BusGuard, BusLock};

/// The mouse device with its queue and bus handle.
pub struct MousePipeline<T, D> {
    device: Mutex<Mouse<T, D>>,
    queue: Arc<BridgeQueue>,
    bus: Arc<BusLock>,
    config: DeviceConfig,
    last_report_us: Mutex<Option<u64>>,
}

impl<T: Transport, D: Delay> MousePipeline<T, D> {
    /// Build the pipeline with an empty queue of `config.queue_capacity`.
    pub fn new(mouse: Mouse<T, D>, bus: Arc<BusLock>, config: DeviceConfig) -> Self {
        Self {
            device: Mutex::new(mouse),
            queue: Arc::new(BridgeQueue::new(config.queue_capacity)),
            bus,
            config,
            last_report_us: Mutex::new(None),
        }
    }

    /// Frames waiting for the bus.
    pub fn queue(&self) -> &Arc<BridgeQueue> {
        &self.queue
    }

    /// The shared bus lock.
    pub fn bus(&self) -> &BusLock {
        &self.bus
    }

    /// Settings of this pipeline.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Run `f` against the device state.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut Mouse<T, D>) -> R) -> R {
        f(&mut self.device.lock())
    }

    /// Answer at most one pending host command.
    pub fn service_host(&self, _bus: &BusGuard<'_>) -> Result<bool, BusError> {
        self.device.lock().handle()
    }

    /// Time left before the next stream report may be sent.
    pub fn report_delay_us(&self, now_us: u64) -> u64 {
        let Some(last) = *self.last_report_us.lock() else {
            return 0;
        };
        let interval = self.device.lock().min_report_interval_us() as u64;
        interval.saturating_sub(now_us.saturating_sub(last))
    }

    /// Deliver one motion frame according to the current mode.
    ///
    /// The frame is validated again; a report the host interrupts is
    /// dropped, not retried.
    pub fn forward(&self, frame: &EventFrame, now_us: u64, _bus: &BusGuard<'_>) -> Forward {
        let report = match frame.mouse_report() {
            Ok(report) => report,
            Err(e) => {
                debug!("mouse: rejecting queued frame: {}", e);
                return Forward::Rejected(e);
            }
        };

        let mut mouse = self.device.lock();
        if !mouse.data_reporting_enabled() && !self.config.force_reporting {
            trace!("mouse: reporting disabled; dropping motion");
            return Forward::Dropped;
        }

        match mouse.mode() {
            Mode::Wrap => Forward::Dropped,
            Mode::Remote => {
                mouse.accumulate(&report);
                Forward::Held
            }
            Mode::Stream => {
                mouse.accumulate(&report);
                *self.last_report_us.lock() = Some(now_us);
                match mouse.send_report() {
                    Ok(()) => Forward::Written,
                    Err(e) => {
                        warn!("mouse: report dropped: {}", e);
                        Forward::Failed(e)
                    }
                }
            }
        }
    }
}
