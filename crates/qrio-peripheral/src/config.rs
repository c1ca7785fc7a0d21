//! Peripheral advertising configuration

use std::time::Duration;

use uuid::Uuid;

use crate::error::ConfigError;
use crate::protocol::{DEFAULT_DEVICE_NAME_PREFIX, LEGACY_LOCAL_NAME_MAX_LEN, QRIO_SERVICE_UUID};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the peripheral advertiser
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Prefix prepended to the session identity in the advertised local name
    pub device_name_prefix: String,
    /// Service UUID carried in the advertisement
    pub service_uuid: Uuid,
    /// Upper bound on the advertised local name, in bytes
    pub max_local_name_len: usize,
    /// Whether centrals may connect to the advertisement
    pub connectable: bool,
    /// Whether the advertisement is general discoverable
    pub discoverable: bool,
    /// Advertising interval requested from the controller, in milliseconds
    pub advertising_interval_ms: u64,
    /// Maximum time a single gateway call may take, in milliseconds
    pub gateway_timeout_ms: u64,
}

/// Shortest advertising interval the Bluetooth LE link layer allows
pub const MIN_ADVERTISING_INTERVAL_MS: u64 = 20;

/// Longest advertising interval the Bluetooth LE link layer allows
pub const MAX_ADVERTISING_INTERVAL_MS: u64 = 10_240;

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            device_name_prefix: DEFAULT_DEVICE_NAME_PREFIX.to_string(),
            service_uuid: QRIO_SERVICE_UUID,
            max_local_name_len: LEGACY_LOCAL_NAME_MAX_LEN,
            connectable: true,
            discoverable: true,
            // Low latency mode, discovered within a scan window or two
            advertising_interval_ms: 100,
            gateway_timeout_ms: 5_000,
        }
    }
}

impl PeripheralConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set device name prefix
    pub fn with_device_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_name_prefix = prefix.into();
        self
    }

    /// Set advertised service UUID
    pub fn with_service_uuid(mut self, uuid: Uuid) -> Self {
        self.service_uuid = uuid;
        self
    }

    /// Set the local name length budget
    pub fn with_max_local_name_len(mut self, len: usize) -> Self {
        self.max_local_name_len = len;
        self
    }

    /// Enable or disable connectable advertising
    pub fn with_connectable(mut self, connectable: bool) -> Self {
        self.connectable = connectable;
        self
    }

    /// Enable or disable discoverable advertising
    pub fn with_discoverable(mut self, discoverable: bool) -> Self {
        self.discoverable = discoverable;
        self
    }

    /// Set the advertising interval
    pub fn with_advertising_interval(mut self, interval: Duration) -> Self {
        self.advertising_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Advertising interval as a [`Duration`]
    pub fn advertising_interval(&self) -> Duration {
        Duration::from_millis(self.advertising_interval_ms)
    }

    /// Set the gateway call timeout
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Gateway call timeout as a [`Duration`]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    /// Check that the configuration can produce a usable advertisement
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_local_name_len == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_local_name_len",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.device_name_prefix.len() >= self.max_local_name_len {
            return Err(ConfigError::InvalidValue {
                field: "device_name_prefix",
                reason: format!(
                    "prefix of {} bytes leaves no room for a session id within {} bytes",
                    self.device_name_prefix.len(),
                    self.max_local_name_len
                ),
            });
        }

        if !(MIN_ADVERTISING_INTERVAL_MS..=MAX_ADVERTISING_INTERVAL_MS)
            .contains(&self.advertising_interval_ms)
        {
            return Err(ConfigError::InvalidValue {
                field: "advertising_interval_ms",
                reason: format!(
                    "{} ms is outside {}..={} ms",
                    self.advertising_interval_ms,
                    MIN_ADVERTISING_INTERVAL_MS,
                    MAX_ADVERTISING_INTERVAL_MS
                ),
            });
        }

        if self.gateway_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
