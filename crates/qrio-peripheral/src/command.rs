//! Command surface exposed to the host UI layer
//!
//! The host sends string-keyed method calls with a JSON argument map. They
//! are parsed into the closed [`PeripheralRequest`] set before reaching the
//! controller; anything else is answered with
//! [`PeripheralResponse::NotImplemented`] and never touches it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::controller::PeripheralController;
use crate::gateway::AdvertisingGateway;

/// Method name that starts a peripheral session
pub const START_PERIPHERAL: &str = "startPeripheral";

/// Method name that stops the peripheral session
pub const STOP_PERIPHERAL: &str = "stopPeripheral";

// ----------------------------------------------------------------------------
// Requests and Responses
// ----------------------------------------------------------------------------

/// A method call as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Look up a string argument; missing and non-string values yield `None`
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        match self.arguments.get(name) {
            Some(Value::String(value)) => Some(value.as_str()),
            Some(Value::Null) | None => None,
            Some(other) => {
                debug!("Ignoring non-string argument {}={}", name, other);
                None
            }
        }
    }
}

/// Requests the controller understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralRequest {
    Start { session_id: Option<String> },
    Stop,
}

impl PeripheralRequest {
    /// Parse a host method call, or `None` for an unknown method
    pub fn from_method_call(call: &MethodCall) -> Option<Self> {
        match call.method.as_str() {
            START_PERIPHERAL => Some(Self::Start {
                session_id: call.string_argument("sessionId").map(str::to_string),
            }),
            STOP_PERIPHERAL => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Answer sent back to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeripheralResponse {
    /// The call was handled; `start` reports whether advertising began,
    /// `stop` always reports `true`
    Ok(bool),
    /// The method is not part of the command surface
    NotImplemented,
}

/// Route a host method call to the controller
pub async fn handle_method_call<G: AdvertisingGateway>(
    controller: &mut PeripheralController<G>,
    call: &MethodCall,
) -> PeripheralResponse {
    match PeripheralRequest::from_method_call(call) {
        Some(request) => controller.dispatch(request).await,
        None => {
            debug!("Method '{}' not implemented", call.method);
            PeripheralResponse::NotImplemented
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::simulated::SimulatedGateway;
    use crate::session::SessionState;

    #[test]
    fn test_parse_start_with_session_id() {
        let call = MethodCall::new(START_PERIPHERAL, json!({ "sessionId": "abc" }));
        assert_eq!(
            PeripheralRequest::from_method_call(&call),
            Some(PeripheralRequest::Start {
                session_id: Some("abc".to_string())
            })
        );
    }

    #[test]
    fn test_parse_start_without_arguments() {
        let call: MethodCall = serde_json::from_str(r#"{"method": "startPeripheral"}"#).unwrap();
        assert_eq!(
            PeripheralRequest::from_method_call(&call),
            Some(PeripheralRequest::Start { session_id: None })
        );

        let call = MethodCall::new(START_PERIPHERAL, json!({ "sessionId": 42 }));
        assert_eq!(
            PeripheralRequest::from_method_call(&call),
            Some(PeripheralRequest::Start { session_id: None })
        );
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(
            serde_json::to_value(PeripheralResponse::Ok(true)).unwrap(),
            json!({ "ok": true })
        );
        assert_eq!(
            serde_json::to_value(PeripheralResponse::NotImplemented).unwrap(),
            json!("notImplemented")
        );
    }

    #[tokio::test]
    async fn test_unknown_method_leaves_controller_untouched() {
        let gateway = SimulatedGateway::new();
        let adapter = gateway.adapter();
        let mut controller = PeripheralController::new(gateway);
        assert!(controller.start(Some("keep")).await);
        let calls_before = adapter.calls().len();

        let call = MethodCall::new("setTxPower", json!({ "level": "high" }));
        let response = handle_method_call(&mut controller, &call).await;

        assert_eq!(response, PeripheralResponse::NotImplemented);
        assert_eq!(
            controller.state(),
            &SessionState::Active(crate::SessionId::new("keep"))
        );
        assert_eq!(adapter.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_stop_always_reports_true() {
        let mut controller = PeripheralController::new(SimulatedGateway::new());
        let call = MethodCall::new(STOP_PERIPHERAL, Value::Null);

        assert_eq!(
            handle_method_call(&mut controller, &call).await,
            PeripheralResponse::Ok(true)
        );
    }
}
