//! Advertising payload constants and construction

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PeripheralConfig;
use crate::session::SessionId;

// ----------------------------------------------------------------------------
// Advertising Constants
// ----------------------------------------------------------------------------

/// QRio peripheral service UUID
pub const QRIO_SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789ABCDEF0);

/// Prefix of the advertised local name
pub const DEFAULT_DEVICE_NAME_PREFIX: &str = "QRio_";

/// Room left for a complete local name in a 31 byte legacy advertising PDU
/// once the AD structure header is accounted for
pub const LEGACY_LOCAL_NAME_MAX_LEN: usize = 29;

// ----------------------------------------------------------------------------
// Advertising Payload
// ----------------------------------------------------------------------------

/// Everything a gateway needs to put a session on the air
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisingPayload {
    /// Session the advertisement belongs to
    pub session_id: SessionId,
    /// Local name carrying the session identity
    pub local_name: String,
    /// Advertised service UUID
    pub service_uuid: Uuid,
    pub connectable: bool,
    pub discoverable: bool,
    /// Requested interval between advertising events
    pub interval: Duration,
}

impl AdvertisingPayload {
    /// Build the payload for a session under the given configuration
    pub fn for_session(session_id: &SessionId, config: &PeripheralConfig) -> Self {
        Self {
            session_id: session_id.clone(),
            local_name: generate_local_name(
                session_id,
                &config.device_name_prefix,
                config.max_local_name_len,
            ),
            service_uuid: config.service_uuid,
            connectable: config.connectable,
            discoverable: config.discoverable,
            interval: config.advertising_interval(),
        }
    }
}

/// Generate the advertised local name for a session
///
/// The result never exceeds `max_len` bytes and is cut on a char boundary.
pub fn generate_local_name(session_id: &SessionId, prefix: &str, max_len: usize) -> String {
    let mut name = format!("{}{}", prefix, session_id.as_str());
    if name.len() > max_len {
        let mut cut = max_len;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_generation() {
        let session = SessionId::new("room42");
        let name = generate_local_name(&session, "QRio_", LEGACY_LOCAL_NAME_MAX_LEN);
        assert_eq!(name, "QRio_room42");
    }

    #[test]
    fn test_local_name_truncated_to_budget() {
        let session = SessionId::new("a-very-long-session-identifier-indeed");
        let name = generate_local_name(&session, "QRio_", LEGACY_LOCAL_NAME_MAX_LEN);
        assert_eq!(name.len(), LEGACY_LOCAL_NAME_MAX_LEN);
        assert!(name.starts_with("QRio_a-very-long"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // Each 'é' is two bytes, so a 7 byte budget lands mid-char
        let session = SessionId::new("éééé");
        let name = generate_local_name(&session, "Q_", 7);
        assert_eq!(name, "Q_éé");
    }

    #[test]
    fn test_payload_carries_config() {
        let config = PeripheralConfig::new()
            .with_device_name_prefix("Demo-")
            .with_connectable(false);
        let payload = AdvertisingPayload::for_session(&SessionId::new("s1"), &config);

        assert_eq!(payload.local_name, "Demo-s1");
        assert_eq!(payload.service_uuid, QRIO_SERVICE_UUID);
        assert!(!payload.connectable);
        assert!(payload.discoverable);
        assert_eq!(payload.interval, Duration::from_millis(100));
    }

    #[test]
    fn test_payload_interval_follows_config() {
        let config = PeripheralConfig::new().with_advertising_interval(Duration::from_millis(1_000));
        let payload = AdvertisingPayload::for_session(&SessionId::default(), &config);
        assert_eq!(payload.interval, Duration::from_secs(1));
    }
}
