//! HTTP surface
//!
//! | Route              | Handler                     |
//! |--------------------|-----------------------------|
//! | `POST /api/contact`| [`contact::submit`]         |
//! | `GET /api/ping`    | [`ping`]                    |
//! | `GET /health`      | [`health::health_check`]    |
//! | `GET /health/live` | [`health::liveness`]        |
//! | `GET /health/ready`| [`health::readiness`]       |
//!
//! Every route sits behind request tracing, CORS and a body size limit.

pub mod contact;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::ServerSettings;
use crate::health;
use crate::state::RelayState;

/// Build the application router
///
/// ```rust
/// use contact_relay::{config::RelayConfig, http, state::RelayState};
///
/// let app = http::router(RelayState::new(RelayConfig::default()));
/// ```
pub fn router(state: RelayState) -> Router {
    let server = &state.config().server;
    let cors = cors_layer(server);
    let body_limit = RequestBodyLimitLayer::new(server.body_limit_bytes);

    Router::new()
        .route("/api/contact", post(contact::submit))
        .route("/api/ping", get(ping))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy from the configured origin list
///
/// An empty list allows any origin. Entries that are not valid header
/// values are skipped.
#[must_use]
pub fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = server
        .origins()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Ping response
#[derive(Debug, Clone, Serialize)]
pub struct Pong {
    /// Always `"ok"`
    pub status: &'static str,
    /// Current time, RFC 3339
    pub timestamp: String,
}

/// Liveness ping, target of the keep-alive task
#[allow(clippy::unused_async)]
pub async fn ping() -> Json<Pong> {
    Json(Pong {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
