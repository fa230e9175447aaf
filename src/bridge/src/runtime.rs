//! Assembly of the two pipelines and their executors.
//!
//! ```rust,ignore
//! let bridge = Bridge::new(BridgeConfig::default(), keyboard, mouse)?;
//! let socket_listener = bridge.listener();
//! let mut kbd_exec = bridge.keyboard_executor(clock.clone(), leds);
//! let mut mouse_exec = bridge.mouse_executor(clock);
//! // core 0: kbd_exec.run(&clock, &mut delay); core 1: mouse_exec.run(&clock, &mut delay);
//! // network loop: socket_listener.poll(&mut socket, bridge.ingress());
//! ```

use alloc::sync::Arc;
use log::info;
use ps2bridge_common::{BridgeConfig, ConfigError};
use ps2bridge_hal::{Clock, Delay, Indicator, Transport};

use crate::device::{Keyboard, Mouse};
use crate::net::UdpListener;
use crate::pipeline::{KeyboardPipeline, MousePipeline};
use crate::protocol::Ingress;
use crate::sync::BusLock;
use crate::task::executor::Executor;
use crate::task::{workers, Priority, Task};

/// A configured keyboard/mouse bridge.
pub struct Bridge<KT, KD, MT, MD> {
    config: BridgeConfig,
    bus: Arc<BusLock>,
    keyboard: Arc<KeyboardPipeline<KT, KD>>,
    mouse: Arc<MousePipeline<MT, MD>>,
    ingress: Ingress,
}

impl<KT, KD, MT, MD> Bridge<KT, KD, MT, MD>
where
    KT: Transport + 'static,
    KD: Delay + 'static,
    MT: Transport + 'static,
    MD: Delay + 'static,
{
    /// Validate `config` and build both pipelines around one bus lock.
    pub fn new(
        config: BridgeConfig,
        keyboard: Keyboard<KT, KD>,
        mouse: Mouse<MT, MD>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bus = Arc::new(BusLock::new());
        let keyboard = Arc::new(KeyboardPipeline::new(keyboard, bus.clone(), config.keyboard));
        let mouse = Arc::new(MousePipeline::new(mouse, bus.clone(), config.mouse));
        let ingress = Ingress::new(keyboard.queue().clone(), mouse.queue().clone());
        info!(
            "bridge: queues {}/{}, udp port {}",
            config.keyboard.queue_capacity, config.mouse.queue_capacity, config.udp_port
        );
        Ok(Self {
            config,
            bus,
            keyboard,
            mouse,
            ingress,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The shared bus lock.
    pub fn bus(&self) -> &Arc<BusLock> {
        &self.bus
    }

    /// Entry point for received datagrams.
    pub fn ingress(&self) -> &Ingress {
        &self.ingress
    }

    /// A UDP listener for the configured port.
    pub fn listener(&self) -> UdpListener {
        UdpListener::new(self.config.udp_port)
    }

    /// The keyboard pipeline.
    pub fn keyboard(&self) -> &Arc<KeyboardPipeline<KT, KD>> {
        &self.keyboard
    }

    /// The mouse pipeline.
    pub fn mouse(&self) -> &Arc<MousePipeline<MT, MD>> {
        &self.mouse
    }

    /// Executor with the keyboard's host-command and bus-write tasks.
    pub fn keyboard_executor<C, I>(&self, clock: C, indicator: I) -> Executor
    where
        C: Clock + Clone + 'static,
        I: Indicator + 'static,
    {
        let mut executor = Executor::new();
        let timers = executor.timers().clone();
        executor.spawn(Task::with_priority(
            workers::keyboard_write_task(self.keyboard.clone(), timers.clone(), clock.clone()),
            Priority::High,
        ));
        executor.spawn(Task::with_priority(
            workers::keyboard_host_task(self.keyboard.clone(), timers, clock, indicator),
            Priority::Normal,
        ));
        executor
    }

    /// Executor with the mouse's host-command and bus-write tasks.
    pub fn mouse_executor<C>(&self, clock: C) -> Executor
    where
        C: Clock + Clone + 'static,
    {
        let mut executor = Executor::new();
        let timers = executor.timers().clone();
        executor.spawn(Task::with_priority(
            workers::mouse_write_task(self.mouse.clone(), timers.clone(), clock.clone()),
            Priority::High,
        ));
        executor.spawn(Task::with_priority(
            workers::mouse_host_task(self.mouse.clone(), timers, clock),
            Priority::Normal,
        ));
        executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeDelay, FakeTransport, ManualClock, RecordingIndicator};

    type TestBridge = Bridge<FakeTransport, FakeDelay, FakeTransport, FakeDelay>;

    fn bridge(config: BridgeConfig) -> Result<TestBridge, ConfigError> {
        Bridge::new(
            config,
            Keyboard::new(FakeTransport::new(), FakeDelay::new()),
            Mouse::new(FakeTransport::new(), FakeDelay::new()),
        )
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = BridgeConfig::default();
        config.mouse.poll_interval_us = 0;
        assert!(matches!(bridge(config), Err(ConfigError::ZeroPollInterval)));
    }

    #[test]
    fn test_pipelines_share_one_bus() {
        let bridge = bridge(BridgeConfig::default()).unwrap();
        let _guard = bridge.bus().try_lock().unwrap();
        assert!(bridge.keyboard().bus().is_locked());
        assert!(bridge.mouse().bus().is_locked());
    }

    #[test]
    fn test_queue_capacity_from_config() {
        let mut config = BridgeConfig::default();
        config.keyboard.queue_capacity = 8;
        let bridge = bridge(config).unwrap();
        assert_eq!(bridge.keyboard().queue().capacity(), 8);
        assert_eq!(bridge.mouse().queue().capacity(), 30);
        assert_eq!(bridge.listener().port(), 3252);
    }

    #[test]
    fn test_executors_spawn_both_tasks() {
        let bridge = bridge(BridgeConfig::default()).unwrap();
        let mut kbd = bridge.keyboard_executor(ManualClock::new(), RecordingIndicator::new());
        let mut mouse = bridge.mouse_executor(ManualClock::new());
        assert_eq!(kbd.task_count(), 2);
        assert_eq!(mouse.task_count(), 2);
        assert!(kbd.run_ready());
        assert!(mouse.run_ready());
        // Both host tasks are asleep until their next poll.
        assert!(!kbd.run_ready());
        assert!(!mouse.run_ready());
        assert_eq!(kbd.timers().len(), 1);
        assert_eq!(mouse.timers().len(), 1);
    }
}
