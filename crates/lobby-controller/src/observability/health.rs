//! Health endpoints for the Lobby Controller.
//!
//! - `GET /health` - Liveness probe (is the process running?)
//! - `GET /ready` - Readiness probe (is the controller accepting lobbies?)
//!
//! Readiness combines the startup flag in [`HealthState`] with a live status
//! query against the controller actor, so a drained or stopped controller
//! reports 503 without extra bookkeeping.

use crate::actors::LobbyControllerActorHandle;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long `/ready` waits for the controller to answer.
const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Process-level health flags.
#[derive(Debug)]
pub struct HealthState {
    live: AtomicBool,
    ready: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (live=true, ready=false).
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: AtomicBool::new(true),
            ready: AtomicBool::new(false),
        }
    }

    /// Mark startup complete.
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Mark the service as not ready (e.g., during shutdown).
    pub fn set_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct HealthContext {
    state: Arc<HealthState>,
    controller: LobbyControllerActorHandle,
}

/// Create the health router with liveness and readiness endpoints.
pub fn health_router(state: Arc<HealthState>, controller: LobbyControllerActorHandle) -> Router {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/ready", get(readiness_handler))
        .with_state(HealthContext { state, controller })
}

async fn liveness_handler(State(ctx): State<HealthContext>) -> StatusCode {
    if ctx.state.is_live() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn readiness_handler(State(ctx): State<HealthContext>) -> StatusCode {
    if !ctx.state.is_ready() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    match tokio::time::timeout(READINESS_TIMEOUT, ctx.controller.get_status()).await {
        Ok(Ok(status)) if !status.is_draining => StatusCode::OK,
        Ok(Ok(_)) => StatusCode::SERVICE_UNAVAILABLE,
        Ok(Err(e)) => {
            debug!(target: "lc.health", error = %e, "Controller unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            debug!(target: "lc.health", "Controller status timed out");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
