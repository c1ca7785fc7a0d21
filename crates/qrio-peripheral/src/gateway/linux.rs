//! Linux advertising gateway using bluer (BlueZ)

use bluer::adv::{Advertisement, AdvertisementHandle, Type};
use bluer::ErrorKind;
use tracing::{debug, info};

use crate::error::{AdapterError, Result};
use crate::protocol::AdvertisingPayload;

use super::AdvertisingGateway;

// ----------------------------------------------------------------------------
// Error Mapping
// ----------------------------------------------------------------------------

impl From<bluer::Error> for AdapterError {
    fn from(err: bluer::Error) -> Self {
        match err.kind {
            ErrorKind::NotAuthorized | ErrorKind::NotPermitted => {
                AdapterError::PermissionDenied(err.message)
            }
            ErrorKind::NotReady | ErrorKind::NotAvailable | ErrorKind::DoesNotExist => {
                AdapterError::AdapterUnavailable(err.message)
            }
            ErrorKind::AlreadyExists | ErrorKind::InProgress => AdapterError::AlreadyAdvertising,
            _ => AdapterError::PlatformRejected(err.to_string()),
        }
    }
}

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

pub struct LinuxGateway {
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    advertisement_handle: Option<AdvertisementHandle>,
}

impl LinuxGateway {
    pub fn new() -> Self {
        Self {
            session: None,
            adapter: None,
            advertisement_handle: None,
        }
    }

    /// Connect to BlueZ and resolve the default adapter once
    async fn adapter(&mut self) -> Result<&bluer::Adapter> {
        if self.adapter.is_none() {
            let session = bluer::Session::new().await.map_err(|e| {
                AdapterError::AdapterUnavailable(format!("BlueZ session: {}", e))
            })?;

            let adapter = session.default_adapter().await.map_err(|e| {
                AdapterError::AdapterUnavailable(format!("BLE adapter: {}", e))
            })?;

            info!("Linux BLE adapter {} initialized for advertising", adapter.name());
            self.session = Some(session);
            self.adapter = Some(adapter);
        }

        self.adapter
            .as_ref()
            .ok_or_else(|| AdapterError::AdapterUnavailable("BLE adapter missing".to_string()))
    }
}

impl Default for LinuxGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AdvertisingGateway for LinuxGateway {
    async fn check_available(&mut self) -> Result<()> {
        let adapter = self.adapter().await?;
        if !adapter.is_powered().await? {
            return Err(AdapterError::AdapterUnavailable(format!(
                "adapter {} is powered off",
                adapter.name()
            )));
        }
        Ok(())
    }

    async fn begin_advertising(&mut self, payload: &AdvertisingPayload) -> Result<()> {
        if self.advertisement_handle.is_some() {
            return Err(AdapterError::AlreadyAdvertising);
        }

        let adapter = self.adapter().await?;

        // Alias carries the session name for centrals that read the device
        // name instead of the advertised one; not every adapter allows it.
        if let Err(e) = adapter.set_alias(payload.local_name.clone()).await {
            debug!("Could not set adapter alias to '{}': {}", payload.local_name, e);
        }

        let advertisement = Advertisement {
            advertisement_type: if payload.connectable {
                Type::Peripheral
            } else {
                Type::Broadcast
            },
            service_uuids: [payload.service_uuid].into_iter().collect(),
            local_name: Some(payload.local_name.clone()),
            discoverable: Some(payload.discoverable),
            min_interval: Some(payload.interval),
            max_interval: Some(payload.interval),
            ..Default::default()
        };

        let handle = adapter.advertise(advertisement).await?;
        self.advertisement_handle = Some(handle);

        info!("Started BLE advertising as '{}'", payload.local_name);
        Ok(())
    }

    async fn end_advertising(&mut self) -> Result<()> {
        match self.advertisement_handle.take() {
            Some(handle) => {
                drop(handle); // Dropping the handle unregisters the advertisement
                info!("Stopped BLE advertising");
                Ok(())
            }
            None => Err(AdapterError::NotAdvertising),
        }
    }

    fn is_advertising(&self) -> bool {
        self.advertisement_handle.is_some()
    }
}
