//! Peripheral session controller
//!
//! Owns the single advertising session and drives an [`AdvertisingGateway`].
//!
//! Starting while a session is active *replaces* it: the active
//! advertisement is ended before the new one begins, so the gateway never
//! holds two advertisements at once. Starting reports failure as `false`;
//! stopping has no failure channel at all and always leaves the controller
//! idle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::command::{PeripheralRequest, PeripheralResponse};
use crate::config::PeripheralConfig;
use crate::error::{AdapterError, ConfigError, Result as AdapterResult};
use crate::gateway::AdvertisingGateway;
use crate::protocol::AdvertisingPayload;
use crate::session::{SessionId, SessionState};

// ----------------------------------------------------------------------------
// Stop Outcome
// ----------------------------------------------------------------------------

/// What happened when a session was stopped
///
/// Only used for diagnostics; [`PeripheralController::stop`] discards it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no active session
    WasIdle,
    /// The gateway ended the advertisement
    Stopped(SessionId),
    /// The platform had already dropped the advertisement
    AlreadyStopped(SessionId),
    /// The gateway failed to end the advertisement
    Failed(SessionId, AdapterError),
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

/// Owner of the at-most-one active advertising session
pub struct PeripheralController<G: AdvertisingGateway> {
    gateway: G,
    config: PeripheralConfig,
    state: SessionState,
}

impl<G: AdvertisingGateway> PeripheralController<G> {
    /// Create a controller with the default configuration
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            config: PeripheralConfig::default(),
            state: SessionState::Idle,
        }
    }

    /// Create a controller with a custom configuration, rejecting one that
    /// cannot produce a usable advertisement
    pub fn with_config(gateway: G, config: PeripheralConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn active_session(&self) -> Option<&SessionId> {
        self.state.session_id()
    }

    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Ask the gateway whether advertising is currently possible
    pub async fn is_available(&mut self) -> bool {
        let timeout = self.config.gateway_timeout();
        match bounded(timeout, self.gateway.check_available()).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Advertising unavailable: {}", e);
                false
            }
        }
    }

    /// Start advertising under `session_id`, replacing any active session
    ///
    /// A missing or empty identity falls back to
    /// [`DEFAULT_SESSION_ID`](crate::DEFAULT_SESSION_ID). Returns whether the
    /// gateway accepted the advertisement; on `false` the controller is idle.
    pub async fn start(&mut self, session_id: Option<&str>) -> bool {
        let session_id = SessionId::resolve(session_id);

        if let Some(current) = self.state.session_id() {
            info!("Replacing active session '{}' with '{}'", current, session_id);
            self.stop().await;
        }

        let timeout = self.config.gateway_timeout();
        if let Err(e) = bounded(timeout, self.gateway.check_available()).await {
            warn!("Cannot start session '{}': {}", session_id, e);
            return false;
        }

        let payload = AdvertisingPayload::for_session(&session_id, &self.config);
        debug!("Advertising payload: {:?}", payload);

        match self.begin(&payload).await {
            Ok(()) => {
                info!("Peripheral session '{}' started as '{}'", session_id, payload.local_name);
                self.state = SessionState::Active(session_id);
                true
            }
            Err(e) => {
                warn!("Failed to start session '{}': {}", session_id, e);
                false
            }
        }
    }

    /// Begin advertising, clearing any advertisement a failed attempt left
    /// on the air
    ///
    /// When clearing succeeds the begin is retried once, which covers a stale
    /// advertisement left behind by an earlier failed stop.
    async fn begin(&mut self, payload: &AdvertisingPayload) -> AdapterResult<()> {
        let timeout = self.config.gateway_timeout();
        let mut retried = false;

        loop {
            let error = match bounded(timeout, self.gateway.begin_advertising(payload)).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if !self.gateway.is_advertising() {
                return Err(error);
            }

            match bounded(timeout, self.gateway.end_advertising()).await {
                Ok(()) if !retried => {
                    debug!("Cleared stale advertisement after '{}', retrying begin", error);
                    retried = true;
                }
                Ok(()) => return Err(error),
                Err(cleanup) => {
                    warn!("Failed to clear advertisement after failed begin: {}", cleanup);
                    return Err(error);
                }
            }
        }
    }

    /// Stop the active session, if any
    ///
    /// Always leaves the controller idle and never fails; safe to call from
    /// teardown paths.
    pub async fn stop(&mut self) {
        // Stop has no failure channel; the outcome is already logged.
        let _outcome: StopOutcome = self.stop_with_outcome().await;
    }

    /// Stop the active session and report what the gateway did
    pub async fn stop_with_outcome(&mut self) -> StopOutcome {
        let session_id = match std::mem::take(&mut self.state) {
            SessionState::Active(session_id) => session_id,
            SessionState::Idle => return StopOutcome::WasIdle,
        };

        let timeout = self.config.gateway_timeout();
        match bounded(timeout, self.gateway.end_advertising()).await {
            Ok(()) => {
                info!("Peripheral session '{}' stopped", session_id);
                StopOutcome::Stopped(session_id)
            }
            Err(e) if e.is_already_stopped() => {
                info!("Peripheral session '{}' was already stopped by the platform", session_id);
                StopOutcome::AlreadyStopped(session_id)
            }
            Err(e) => {
                warn!("Ignoring failure while stopping session '{}': {}", session_id, e);
                StopOutcome::Failed(session_id, e)
            }
        }
    }

    /// Handle one request from the command surface
    pub async fn dispatch(&mut self, request: PeripheralRequest) -> PeripheralResponse {
        match request {
            PeripheralRequest::Start { session_id } => {
                PeripheralResponse::Ok(self.start(session_id.as_deref()).await)
            }
            PeripheralRequest::Stop => {
                self.stop().await;
                PeripheralResponse::Ok(true)
            }
        }
    }

    /// Release the controller when its owner goes away
    ///
    /// Consumes the controller, so it runs at most once. Stops any active
    /// session and never fails.
    pub async fn teardown(mut self) {
        self.stop().await;
        debug!("Peripheral controller torn down");
    }
}

impl<G: AdvertisingGateway> Drop for PeripheralController<G> {
    fn drop(&mut self) {
        if let Some(session_id) = self.state.session_id() {
            warn!(
                "Peripheral controller dropped with session '{}' active; call teardown() first",
                session_id
            );
        }
    }
}

/// Run a gateway call, failing with [`AdapterError::TimedOut`] past `timeout`
async fn bounded<F>(timeout: Duration, call: F) -> AdapterResult<()>
where
    F: Future<Output = AdapterResult<()>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::TimedOut {
            duration_ms: timeout.as_millis() as u64,
        }),
    }
}

// ----------------------------------------------------------------------------
// Shared Controller
// ----------------------------------------------------------------------------

/// Cloneable controller handle for hosts that call in from several tasks
///
/// Every operation holds the lock across its whole state transition, so
/// overlapping start/stop calls are serialized.
pub struct SharedController<G: AdvertisingGateway> {
    inner: Arc<Mutex<PeripheralController<G>>>,
}

impl<G: AdvertisingGateway> Clone for SharedController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: AdvertisingGateway> SharedController<G> {
    pub fn new(controller: PeripheralController<G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub async fn start(&self, session_id: Option<&str>) -> bool {
        self.inner.lock().await.start(session_id).await
    }

    pub async fn stop(&self) {
        self.inner.lock().await.stop().await
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state().clone()
    }

    pub async fn dispatch(&self, request: PeripheralRequest) -> PeripheralResponse {
        self.inner.lock().await.dispatch(request).await
    }

    /// Tear down the controller if this is the last handle, otherwise just stop
    pub async fn teardown(self) {
        match Arc::try_unwrap(self.inner) {
            Ok(controller) => controller.into_inner().teardown().await,
            Err(shared) => shared.lock().await.stop().await,
        }
    }
}
