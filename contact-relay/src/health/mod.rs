//! Health check endpoints and handlers
//!
//! - Liveness probe: is the process running?
//! - Readiness probe and full report: is the mail transport usable?
//!
//! The mail transport is never resolved by a health check. A transport
//! that has not been resolved yet is reported healthy; the console
//! transport is reported degraded, since messages are not delivered. A
//! strict policy without a secret is unhealthy: every send would fail.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::email::TransportKind;
use crate::state::RelayState;

/// Component name of the mail transport in health reports
pub const MAIL_TRANSPORT: &str = "mail_transport";

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy and ready
    Healthy,
    /// Service is degraded but operational
    Degraded,
    /// Service is unhealthy
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: HealthStatus,
    /// Optional message with details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Create a healthy component
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Create a healthy component with message
    #[must_use]
    pub fn healthy_with_message(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: Some(message.into()),
        }
    }

    /// Create a degraded component
    #[must_use]
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }

    /// Create an unhealthy component
    #[must_use]
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }

    /// Health of the mail transport given the cached variant, if any
    #[must_use]
    pub fn mail_transport(kind: Option<TransportKind>) -> Self {
        match kind {
            None => Self::healthy_with_message("not resolved"),
            Some(TransportKind::Console) => {
                Self::degraded("console transport: emails are logged, not delivered")
            }
            Some(kind) => Self::healthy_with_message(format!("{kind} SMTP transport")),
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall status
    pub status: HealthStatus,
    /// Application version
    pub version: String,
    /// Timestamp of health check (RFC 3339)
    pub timestamp: String,
    /// Individual component healths
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthCheckResponse {
    /// Create new health check response
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: version.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            components: HashMap::new(),
        }
    }

    /// Add component health
    pub fn add_component(&mut self, name: impl Into<String>, health: ComponentHealth) {
        self.components.insert(name.into(), health);
        self.recalculate_status();
    }

    fn recalculate_status(&mut self) {
        if self.components.values().any(|c| c.status == HealthStatus::Unhealthy) {
            self.status = HealthStatus::Unhealthy;
        } else if self.components.values().any(|c| c.status == HealthStatus::Degraded) {
            self.status = HealthStatus::Degraded;
        } else {
            self.status = HealthStatus::Healthy;
        }
    }

    /// Get HTTP status code based on health
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK, // Still operational
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthCheckResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// Liveness probe handler
///
/// Returns 200 OK if the process is running.
#[allow(clippy::unused_async)]
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe handler
#[allow(clippy::unused_async)]
pub async fn readiness(State(state): State<RelayState>) -> HealthCheckResponse {
    report(&state)
}

/// Full health report handler
#[allow(clippy::unused_async)]
pub async fn health_check(State(state): State<RelayState>) -> HealthCheckResponse {
    report(&state)
}

/// Build the health report for the current state
#[must_use]
pub fn report(state: &RelayState) -> HealthCheckResponse {
    let mut response = HealthCheckResponse::new(env!("CARGO_PKG_VERSION"));
    response.add_component("application", ComponentHealth::healthy());
    let mail = if state.selector().lacks_required_secret() {
        ComponentHealth::unhealthy("mail password is not configured")
    } else {
        ComponentHealth::mail_transport(state.selector().current_kind())
    };
    response.add_component(MAIL_TRANSPORT, mail);
    response
}
