//! Contact form endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::config::Environment;
use crate::email::{ContactSubmission, DispatchResult, FailureKind};
use crate::error::{ErrorBody, RelayError};
use crate::extractors::ValidatedJson;
use crate::state::RelayState;

/// Message returned to the visitor on success
pub const SUCCESS_MESSAGE: &str = "Thank you for your message! I'll get back to you soon.";

/// Contact form payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactForm {
    /// Visitor name
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "not_blank", message = "Name is required")
    )]
    pub name: String,

    /// Visitor email address
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    /// Optional subject
    #[serde(default)]
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,

    /// Message text
    #[validate(
        length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"),
        custom(function = "not_blank", message = "Message is required")
    )]
    pub message: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl From<ContactForm> for ContactSubmission {
    fn from(form: ContactForm) -> Self {
        Self {
            name: form.name,
            email: form.email,
            subject: form.subject,
            message: form.message,
        }
    }
}

/// Success response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    /// Always `true`
    pub success: bool,
    /// Message for the visitor
    pub message: &'static str,
    /// `Message-ID` of the relayed email
    pub message_id: String,
}

/// Relay a contact form submission to the configured recipient
///
/// # Errors
///
/// Returns `RelayError` for malformed or invalid payloads and template
/// failures. Dispatch failures are not errors; they map to a status code
/// through [`status_for`].
pub async fn submit(
    State(state): State<RelayState>,
    ValidatedJson(form): ValidatedJson<ContactForm>,
) -> Result<Response, RelayError> {
    let submission = ContactSubmission::from(form);
    let recipient = state.config().mail.recipient_address();
    let request = submission.to_request(recipient)?;

    info!(from = %submission.email.trim(), "Contact form submission received");

    let result = state.dispatcher().dispatch(request).await;
    Ok(dispatch_response(result, state.config().server.environment))
}

/// HTTP status for a dispatch failure
#[must_use]
pub const fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::Authentication | FailureKind::Connection | FailureKind::Provider => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Render a dispatch result as an HTTP response
///
/// Raw detail and provider codes are only included outside production.
#[must_use]
pub fn dispatch_response(result: DispatchResult, environment: Environment) -> Response {
    match result {
        DispatchResult::Success { message_id, .. } => Json(ContactResponse {
            success: true,
            message: SUCCESS_MESSAGE,
            message_id,
        })
        .into_response(),
        DispatchResult::Failure {
            kind,
            user_message,
            raw_detail,
            provider_code,
        } => {
            let mut body = ErrorBody::new(user_message);
            if !environment.is_production() {
                body = body.with_details(raw_detail).with_code(provider_code);
            }
            (status_for(kind), Json(body)).into_response()
        }
    }
}
