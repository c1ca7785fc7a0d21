//! Fallback gateway for platforms without a native advertising backend

use tracing::warn;

use crate::error::{AdapterError, Result};
use crate::protocol::AdvertisingPayload;

use super::AdvertisingGateway;

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// Gateway that reports the adapter as unavailable
pub struct FallbackGateway;

impl FallbackGateway {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> AdapterError {
        AdapterError::AdapterUnavailable(format!(
            "peripheral advertising is not supported on {}",
            std::env::consts::OS
        ))
    }
}

impl Default for FallbackGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AdvertisingGateway for FallbackGateway {
    async fn check_available(&mut self) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn begin_advertising(&mut self, payload: &AdvertisingPayload) -> Result<()> {
        warn!(
            "BLE advertising not supported on this platform. '{}' will not be discoverable.",
            payload.local_name
        );
        Err(Self::unavailable())
    }

    async fn end_advertising(&mut self) -> Result<()> {
        Err(AdapterError::NotAdvertising)
    }

    fn is_advertising(&self) -> bool {
        false
    }
}
