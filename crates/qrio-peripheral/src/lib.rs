//! BLE peripheral session controller for QRio
//!
//! This crate lets a host UI put the device into BLE peripheral
//! (advertising) mode under a caller-chosen session identity, and take it
//! out again.
//!
//! ## Architecture
//!
//! - [`gateway`] - the [`AdvertisingGateway`] trait over the platform's
//!   advertising primitives, with BlueZ, fallback and simulated backends
//! - [`controller`] - [`PeripheralController`], owner of the single active
//!   session and its start/stop state machine
//! - [`command`] - host method calls mapped onto controller requests
//! - [`config`] - advertising configuration
//! - [`protocol`] - service UUID, local name rules and payload construction
//!
//! ## Usage
//!
//! ```rust,no_run
//! use qrio_peripheral::{PeripheralController, PlatformGateway};
//!
//! # async fn example() {
//! let mut controller = PeripheralController::new(PlatformGateway::new());
//!
//! if controller.start(Some("room-42")).await {
//!     // advertising as "QRio_room-42"
//! }
//!
//! // Owner going away: stop whatever is running, never fails
//! controller.teardown().await;
//! # }
//! ```
//!
//! ## Platform Support
//!
//! - **Linux**: advertising via `bluer` and BlueZ
//! - **Other platforms**: start always reports `false`

pub mod command;
pub mod config;
pub mod controller;
mod error;
pub mod gateway;
pub mod protocol;
mod session;

// Public API exports
pub use command::{handle_method_call, MethodCall, PeripheralRequest, PeripheralResponse};
pub use config::PeripheralConfig;
pub use controller::{PeripheralController, SharedController, StopOutcome};
pub use error::{AdapterError, ConfigError, Result};
pub use gateway::simulated::{GatewayCall, SimulatedAdapter, SimulatedGateway};
pub use gateway::{AdvertisingGateway, PlatformGateway};
pub use protocol::{AdvertisingPayload, QRIO_SERVICE_UUID};
pub use session::{SessionId, SessionState, DEFAULT_SESSION_ID};
