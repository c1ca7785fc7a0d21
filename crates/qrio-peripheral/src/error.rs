//! Error types for the peripheral gateway and configuration

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Failures reported by an [`AdvertisingGateway`](crate::AdvertisingGateway)
///
/// None of these are fatal to the controller. A failed begin is folded into a
/// `false` start result and a failed end is logged and discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("BLE adapter not available: {0}")]
    AdapterUnavailable(String),

    #[error("Bluetooth permission denied: {0}")]
    PermissionDenied(String),

    #[error("Adapter is already advertising")]
    AlreadyAdvertising,

    #[error("Adapter is not advertising")]
    NotAdvertising,

    #[error("Advertising rejected by platform: {0}")]
    PlatformRejected(String),

    #[error("Gateway operation timed out after {duration_ms}ms")]
    TimedOut { duration_ms: u64 },
}

impl AdapterError {
    /// Whether the error means the advertisement is already gone
    ///
    /// The host may tear down Bluetooth on its own (adapter switched off
    /// mid-session), so ending advertising can legitimately find nothing to
    /// end.
    pub fn is_already_stopped(&self) -> bool {
        matches!(self, Self::NotAdvertising | Self::AdapterUnavailable(_))
    }
}

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, AdapterError>;
