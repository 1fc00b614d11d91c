//! Mail error types and provider error classification

use std::time::Duration;

use thiserror::Error;

/// SMTP reply codes that mean the provider rejected our credentials
const AUTH_REPLY_CODES: &[&str] = &["454", "530", "534", "535"];

/// SMTP reply codes that mean the provider is unreachable or closing
const CONNECTION_REPLY_CODES: &[&str] = &["421"];

/// Errors that can occur while resolving a transport or sending mail
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// A required request field is missing
    #[error("{0}")]
    Validation(&'static str),

    /// Transport configuration is missing or unusable
    #[error("mail configuration error: {0}")]
    Config(String),

    /// The caller stopped waiting for the transport
    #[error("mail transport timed out after {0:?}")]
    Timeout(Duration),

    /// Credentials were rejected by the provider
    #[error("SMTP authentication failed ({code}): {detail}")]
    Authentication {
        /// Provider reply code
        code: String,
        /// Raw provider message
        detail: String,
    },

    /// Network failure or provider unreachable
    #[error("SMTP connection failed: {detail}")]
    Connection {
        /// Provider reply code, or a client-side code
        code: Option<String>,
        /// Raw error text
        detail: String,
    },

    /// Any other provider error, passed through
    #[error("SMTP error: {detail}")]
    Provider {
        /// Provider reply code, if any
        code: Option<String>,
        /// Raw error text
        detail: String,
    },
}

impl MailError {
    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a provider failure by its reply code
    ///
    /// Authentication codes map to [`MailError::Authentication`], connection
    /// codes and code-less failures to [`MailError::Connection`], everything
    /// else to [`MailError::Provider`].
    #[must_use]
    pub fn from_reply(code: Option<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match code {
            Some(code) if AUTH_REPLY_CODES.contains(&code.as_str()) => {
                Self::Authentication { code, detail }
            }
            Some(code) if CONNECTION_REPLY_CODES.contains(&code.as_str()) => Self::Connection {
                code: Some(code),
                detail,
            },
            None => Self::Connection { code: None, detail },
            code => Self::Provider { code, detail },
        }
    }

    /// Provider code attached to this error, if any
    #[must_use]
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Authentication { code, .. } => Some(code),
            Self::Connection { code, .. } | Self::Provider { code, .. } => code.as_deref(),
            Self::Validation(_) | Self::Config(_) | Self::Timeout(_) => None,
        }
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        let detail = err.to_string();
        if err.is_timeout() {
            return Self::Connection {
                code: Some("ETIMEDOUT".to_string()),
                detail,
            };
        }
        Self::from_reply(err.status().map(|code| code.to_string()), detail)
    }
}
