//! Welcome and health handlers.

use chrono::Utc;
use palisade_core::{envelope, Envelope};
use serde_json::json;

use crate::state::AppState;

/// `GET /api` — describes the API surface.
pub async fn welcome(_state: &AppState) -> Result<Envelope, anyhow::Error> {
    Ok(envelope::success_default(
        200,
        json!({
            "message": "Welcome to the Palisade API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health",
                "auth": "/api/auth",
                "me": "/api/me (requires authentication)",
                "users": "/api/users (requires authentication)"
            }
        }),
    ))
}

/// `GET /health` — liveness probe.
pub async fn health(state: &AppState) -> Result<Envelope, anyhow::Error> {
    Ok(envelope::success_default(
        200,
        json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
            "environment": state.config().env,
        }),
    ))
}
