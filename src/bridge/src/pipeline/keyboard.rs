//! Keyboard pipeline: at-least-once, in-order scancode delivery.

use alloc::sync::Arc;
use log::{debug, trace};
use ps2bridge_common::{BusError, DeviceConfig};
use ps2bridge_hal::{Delay, Transport};
use spin::Mutex;

use super::{BridgeQueue, Forward};
use crate::device::Keyboard;
use crate::sync::{BusGuard, BusLock};

/// The keyboard device with its queue and bus handle.
pub struct KeyboardPipeline<T, D> {
    device: Mutex<Keyboard<T, D>>,
    queue: Arc<BridgeQueue>,
    bus: Arc<BusLock>,
    config: DeviceConfig,
}

impl<T: Transport, D: Delay> KeyboardPipeline<T, D> {
    /// Build the pipeline with an empty queue of `config.queue_capacity`.
    pub fn new(keyboard: Keyboard<T, D>, bus: Arc<BusLock>, config: DeviceConfig) -> Self {
        Self {
            device: Mutex::new(keyboard),
            queue: Arc::new(BridgeQueue::new(config.queue_capacity)),
            bus,
            config,
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

    /// Most recent LED byte set by the host.
    pub fn leds(&self) -> Option<u8> {
        self.device.lock().leds()
    }

    /// Run `f` against the device state.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut Keyboard<T, D>) -> R) -> R {
        f(&mut self.device.lock())
    }

    /// Answer at most one pending host command.
    pub fn service_host(&self, _bus: &BusGuard<'_>) -> Result<Option<u8>, BusError> {
        self.device.lock().handle()
    }

    /// Try to deliver the head of the queue.
    ///
    /// The head is removed only once all of its bytes were accepted; an
    /// interrupted frame is written again in full on the next attempt.
    pub fn forward_head(&self, _bus: &BusGuard<'_>) -> Forward {
        let Some(frame) = self.queue.peek() else {
            return Forward::Idle;
        };
        let mut keyboard = self.device.lock();

        if !keyboard.data_reporting_enabled() && !self.config.force_reporting {
            self.queue.remove_head();
            trace!("keyboard: reporting disabled; dropped {} bytes", frame.len());
            return Forward::Dropped;
        }

        match keyboard.write_frame(frame.payload()) {
            Ok(()) => {
                self.queue.remove_head();
                Forward::Written
            }
            Err(e) => {
                debug!("keyboard: frame write interrupted ({}); will retry", e);
                Forward::Failed(e)
            }
        }
    }
}
