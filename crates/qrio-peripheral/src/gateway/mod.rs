//! Advertising gateway trait and platform selection

pub mod fallback;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod simulated;

use crate::error::Result;
use crate::protocol::AdvertisingPayload;

// ----------------------------------------------------------------------------
// Gateway Trait
// ----------------------------------------------------------------------------

/// Capability surface over the platform's native advertising primitives
///
/// A gateway manages at most one platform advertising handle on behalf of
/// its controller and keeps no session state of its own.
#[async_trait::async_trait]
pub trait AdvertisingGateway: Send + Sync {
    /// Check that an adapter is present, powered and usable by this process
    async fn check_available(&mut self) -> Result<()>;

    /// Put the payload on the air
    async fn begin_advertising(&mut self, payload: &AdvertisingPayload) -> Result<()>;

    /// Take the current advertisement off the air
    async fn end_advertising(&mut self) -> Result<()>;

    /// Check if currently advertising
    fn is_advertising(&self) -> bool;
}

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Native gateway for the current platform
pub enum PlatformGateway {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxGateway),
    #[allow(dead_code)]
    Fallback(fallback::FallbackGateway),
}

impl PlatformGateway {
    /// Create the appropriate gateway for the current platform
    pub fn new() -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::Linux(linux::LinuxGateway::new())
        }
        #[cfg(not(target_os = "linux"))]
        {
            Self::Fallback(fallback::FallbackGateway::new())
        }
    }
}

impl Default for PlatformGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AdvertisingGateway for PlatformGateway {
    async fn check_available(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut gateway) => gateway.check_available().await,
            Self::Fallback(ref mut gateway) => gateway.check_available().await,
        }
    }

    async fn begin_advertising(&mut self, payload: &AdvertisingPayload) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut gateway) => gateway.begin_advertising(payload).await,
            Self::Fallback(ref mut gateway) => gateway.begin_advertising(payload).await,
        }
    }

    async fn end_advertising(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut gateway) => gateway.end_advertising().await,
            Self::Fallback(ref mut gateway) => gateway.end_advertising().await,
        }
    }

    fn is_advertising(&self) -> bool {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref gateway) => gateway.is_advertising(),
            Self::Fallback(ref gateway) => gateway.is_advertising(),
        }
    }
}
