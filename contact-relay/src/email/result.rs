//! Dispatch outcomes

use serde::{Deserialize, Serialize};

use super::{MailError, TransportKind};

/// User-facing message for timeouts
pub const TIMEOUT_MESSAGE: &str = "Email sending timed out. Please try again later.";

/// User-facing message for rejected credentials
pub const AUTHENTICATION_MESSAGE: &str =
    "Email service authentication failed. Please try again later.";

/// User-facing message for unreachable providers
pub const CONNECTION_MESSAGE: &str =
    "Could not connect to the email service. Please try again later.";

/// User-facing message for any other provider error
pub const PROVIDER_MESSAGE: &str = "Failed to send email. Please try again later.";

/// User-facing message for configuration problems
pub const CONFIGURATION_MESSAGE: &str = "Email service is not configured.";

/// Failure category, as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Missing request field; caller fault
    Validation,
    /// Missing secret; operator fault
    Configuration,
    /// Send did not finish in time; transient
    Timeout,
    /// Credentials rejected by the provider
    Authentication,
    /// Provider unreachable; transient
    Connection,
    /// Opaque provider error
    Provider,
}

impl FailureKind {
    /// Whether resubmitting the same request may succeed
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Connection)
    }
}

/// Result of one dispatch attempt
///
/// Serializes as a flat record tagged by `status`:
///
/// ```json
/// {"status":"success","messageId":"<...>","providerResponse":"250 OK","transport":"primary"}
/// {"status":"failure","kind":"timeout","userMessage":"...","rawDetail":"...","providerCode":null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum DispatchResult {
    /// The transport accepted the message
    Success {
        /// `Message-ID` assigned to the message
        message_id: String,
        /// Raw transport response
        provider_response: String,
        /// Variant that handled the message
        transport: TransportKind,
    },
    /// The message was not sent
    Failure {
        /// Failure category
        kind: FailureKind,
        /// Generic message safe to show to end users
        user_message: String,
        /// Raw diagnostic detail for operators
        raw_detail: String,
        /// Provider error code, when one was reported
        provider_code: Option<String>,
    },
}

impl DispatchResult {
    /// Whether the dispatch succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Failure category, if this is a failure
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<MailError> for DispatchResult {
    fn from(err: MailError) -> Self {
        let provider_code = err.provider_code().map(ToString::to_string);
        let raw_detail = err.to_string();

        let (kind, user_message) = match &err {
            MailError::Validation(msg) => (FailureKind::Validation, *msg),
            MailError::Config(_) => (FailureKind::Configuration, CONFIGURATION_MESSAGE),
            MailError::Timeout(_) => (FailureKind::Timeout, TIMEOUT_MESSAGE),
            MailError::Authentication { .. } => {
                (FailureKind::Authentication, AUTHENTICATION_MESSAGE)
            }
            MailError::Connection { .. } => (FailureKind::Connection, CONNECTION_MESSAGE),
            MailError::Provider { .. } => (FailureKind::Provider, PROVIDER_MESSAGE),
        };

        Self::Failure {
            kind,
            user_message: user_message.to_string(),
            raw_detail,
            provider_code,
        }
    }
}
