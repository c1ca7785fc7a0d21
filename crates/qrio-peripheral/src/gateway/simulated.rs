//! In-process gateway that simulates an adapter
//!
//! Used by tests and by the CLI's `--simulate` mode on machines without a
//! usable Bluetooth controller. Every call is recorded in a journal that can
//! be inspected through a [`SimulatedAdapter`] handle after the gateway has
//! been moved into a controller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::protocol::AdvertisingPayload;

use super::AdvertisingGateway;

// ----------------------------------------------------------------------------
// Call Journal
// ----------------------------------------------------------------------------

/// One observed gateway call and how the simulated adapter answered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CheckAvailable { ok: bool },
    Begin { payload: AdvertisingPayload, accepted: bool },
    End { accepted: bool },
    /// The host switched the adapter off underneath the gateway
    PoweredOff,
}

#[derive(Debug)]
struct SimulatedState {
    powered: bool,
    advertising: Option<AdvertisingPayload>,
    begin_failure: Option<AdapterError>,
    end_failure: Option<AdapterError>,
    calls: Vec<GatewayCall>,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            powered: true,
            advertising: None,
            begin_failure: None,
            end_failure: None,
            calls: Vec::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Adapter Handle
// ----------------------------------------------------------------------------

/// Shared view of the simulated adapter, cloneable and usable from tests
#[derive(Debug, Clone, Default)]
pub struct SimulatedAdapter {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedAdapter {
    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent begin fail with `error`, or succeed with `None`
    pub fn fail_begin_with(&self, error: Option<AdapterError>) {
        self.lock().begin_failure = error;
    }

    /// Make every subsequent end fail with `error`, or succeed with `None`
    pub fn fail_end_with(&self, error: Option<AdapterError>) {
        self.lock().end_failure = error;
    }

    /// Switch the adapter on or off; switching off drops any advertisement
    pub fn set_powered(&self, powered: bool) {
        let mut state = self.lock();
        if state.powered && !powered {
            state.advertising = None;
            state.calls.push(GatewayCall::PoweredOff);
        }
        state.powered = powered;
    }

    /// Payload currently on the air
    pub fn current_payload(&self) -> Option<AdvertisingPayload> {
        self.lock().advertising.clone()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn begin_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::Begin { .. }))
            .count()
    }

    pub fn end_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, GatewayCall::End { .. }))
            .count()
    }

    /// Highest number of advertisements that were on the air at once
    pub fn max_concurrent_advertisements(&self) -> usize {
        let mut live = 0usize;
        let mut max = 0usize;
        for call in self.lock().calls.iter() {
            match call {
                GatewayCall::Begin { accepted: true, .. } => {
                    live += 1;
                    max = max.max(live);
                }
                GatewayCall::End { accepted: true } => live = live.saturating_sub(1),
                GatewayCall::PoweredOff => live = 0,
                _ => {}
            }
        }
        max
    }
}

// ----------------------------------------------------------------------------
// Simulated Gateway
// ----------------------------------------------------------------------------

/// Gateway backed by a [`SimulatedAdapter`]
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    adapter: SimulatedAdapter,
    latency: Option<Duration>,
    begin_latency: Option<Duration>,
    begin_ack_delay: Option<Duration>,
    end_latency: Option<Duration>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay begin calls before the adapter sees them
    pub fn with_begin_latency(mut self, latency: Duration) -> Self {
        self.begin_latency = Some(latency);
        self
    }

    /// Put advertisements on the air at once but acknowledge the begin call
    /// only after `delay`
    pub fn with_begin_ack_delay(mut self, delay: Duration) -> Self {
        self.begin_ack_delay = Some(delay);
        self
    }

    /// Delay end calls before the adapter sees them
    pub fn with_end_latency(mut self, latency: Duration) -> Self {
        self.end_latency = Some(latency);
        self
    }

    /// Handle sharing this gateway's adapter state
    pub fn adapter(&self) -> SimulatedAdapter {
        self.adapter.clone()
    }

    async fn simulate_latency(&self, extra: Option<Duration>) {
        for latency in [self.latency, extra].into_iter().flatten() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait::async_trait]
impl AdvertisingGateway for SimulatedGateway {
    async fn check_available(&mut self) -> Result<()> {
        self.simulate_latency(None).await;
        let mut state = self.adapter.lock();
        let ok = state.powered;
        state.calls.push(GatewayCall::CheckAvailable { ok });
        if ok {
            Ok(())
        } else {
            Err(AdapterError::AdapterUnavailable(
                "simulated adapter is powered off".to_string(),
            ))
        }
    }

    async fn begin_advertising(&mut self, payload: &AdvertisingPayload) -> Result<()> {
        self.simulate_latency(self.begin_latency).await;

        let outcome = {
            let mut state = self.adapter.lock();
            let outcome = if !state.powered {
                Err(AdapterError::AdapterUnavailable(
                    "simulated adapter is powered off".to_string(),
                ))
            } else if let Some(error) = state.begin_failure.clone() {
                Err(error)
            } else if state.advertising.is_some() {
                Err(AdapterError::AlreadyAdvertising)
            } else {
                state.advertising = Some(payload.clone());
                Ok(())
            };

            state.calls.push(GatewayCall::Begin {
                payload: payload.clone(),
                accepted: outcome.is_ok(),
            });
            outcome
        };
        debug!("Simulated begin for '{}': {:?}", payload.local_name, outcome);

        if outcome.is_ok() {
            if let Some(delay) = self.begin_ack_delay {
                tokio::time::sleep(delay).await;
            }
        }
        outcome
    }

    async fn end_advertising(&mut self) -> Result<()> {
        self.simulate_latency(self.end_latency).await;
        let mut state = self.adapter.lock();

        let outcome = if let Some(error) = state.end_failure.clone() {
            Err(error)
        } else if state.advertising.take().is_some() {
            Ok(())
        } else {
            Err(AdapterError::NotAdvertising)
        };

        state.calls.push(GatewayCall::End {
            accepted: outcome.is_ok(),
        });
        debug!("Simulated end: {:?}", outcome);
        outcome
    }

    fn is_advertising(&self) -> bool {
        self.adapter.lock().advertising.is_some()
    }
}
