//! Operator-facing configuration of the bridge.

use crate::error::ConfigError;

/// Default capacity of each bridging queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 30;

/// Default backoff between host polling iterations, in microseconds.
pub const DEFAULT_POLL_INTERVAL_US: u32 = 1_000;

/// UDP port the bridge listens on by default.
pub const DEFAULT_UDP_PORT: u16 = 3252;

/// Per-device-class settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Forward frames even if the host never enabled data reporting.
    ///
    /// Some hosts skip the enable command during startup.
    pub force_reporting: bool,
    /// Capacity of the bridging queue.
    pub queue_capacity: usize,
    /// Sleep between host polling iterations.
    pub poll_interval_us: u32,
}

impl DeviceConfig {
    /// Defaults for the keyboard: reporting forced on.
    pub fn keyboard() -> Self {
        Self {
            force_reporting: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }

    /// Defaults for the mouse: reporting follows the host.
    pub fn mouse() -> Self {
        Self {
            force_reporting: false,
            ..Self::keyboard()
        }
    }

    /// Check the settings for values the bridge cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.poll_interval_us == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeConfig {
    /// Keyboard pipeline settings.
    pub keyboard: DeviceConfig,
    /// Mouse pipeline settings.
    pub mouse: DeviceConfig,
    /// UDP port for incoming event datagrams.
    pub udp_port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            keyboard: DeviceConfig::keyboard(),
            mouse: DeviceConfig::mouse(),
            udp_port: DEFAULT_UDP_PORT,
        }
    }
}

impl BridgeConfig {
    /// Validates both device configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.keyboard.validate()?;
        self.mouse.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(config.keyboard.force_reporting);
        assert!(!config.mouse.force_reporting);
        assert_eq!(config.mouse.queue_capacity, 30);
        assert_eq!(config.udp_port, 3252);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = BridgeConfig::default();
        config.mouse.queue_capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroQueueCapacity));

        let mut config = BridgeConfig::default();
        config.keyboard.poll_interval_us = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
    }
}
