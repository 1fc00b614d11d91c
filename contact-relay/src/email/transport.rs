//! Transport abstraction
//!
//! This module defines the `MailTransport` trait that every backend
//! implements, the cached [`TransportHandle`] and the connector seam the
//! selector uses to build transports.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Delivery, Email, MailError};

/// Trait for delivering composed messages
///
/// Implemented by the SMTP and console backends, and by test doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the provider rejects the message or cannot be
    /// reached.
    async fn send(&self, email: Email) -> Result<Delivery, MailError>;

    /// Check that the relay is reachable and accepts our session
    ///
    /// The default implementation reports success, which suits transports
    /// that have nothing to connect to.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the liveness check fails.
    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}

/// Which variant a resolved handle is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Primary SMTP configuration
    Primary,
    /// Alternate port / encryption mode
    Fallback,
    /// Non-delivering log sink
    Console,
}

impl TransportKind {
    /// Whether messages sent through this variant actually leave the process
    #[must_use]
    pub const fn delivers(self) -> bool {
        !matches!(self, Self::Console)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Console => "console",
        };
        f.write_str(name)
    }
}

/// SMTP endpoint description used to build a transport
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpEndpoint {
    /// Server hostname
    pub host: String,

    /// Server port
    pub port: u16,

    /// Implicit TLS (`true`) or STARTTLS (`false`)
    pub secure: bool,

    /// Accept invalid certificates and hostnames
    pub tls_relaxed: bool,

    /// SMTP username
    pub username: String,

    /// SMTP password
    pub password: String,
}

impl fmt::Debug for SmtpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("tls_relaxed", &self.tls_relaxed)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Builds transports for SMTP endpoints
///
/// The production connector wraps `lettre`; tests substitute their own.
#[cfg_attr(test, mockall::automock)]
pub trait TransportConnector: Send + Sync {
    /// Build a transport bound to the endpoint
    ///
    /// Building does not open a connection.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the endpoint parameters are unusable.
    fn connect(&self, endpoint: &SmtpEndpoint) -> Result<Arc<dyn MailTransport>, MailError>;
}

/// A resolved transport, cheap to clone
///
/// Clones share the same underlying transport; use [`TransportHandle::same`]
/// to check identity.
#[derive(Clone)]
pub struct TransportHandle {
    kind: TransportKind,
    transport: Arc<dyn MailTransport>,
}

impl TransportHandle {
    /// Bind a transport to a variant
    #[must_use]
    pub fn new(kind: TransportKind, transport: Arc<dyn MailTransport>) -> Self {
        Self { kind, transport }
    }

    /// The variant this handle is bound to
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Shared reference to the underlying transport
    #[must_use]
    pub fn transport(&self) -> Arc<dyn MailTransport> {
        Arc::clone(&self.transport)
    }

    /// Whether both handles refer to the same transport object
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.transport, &other.transport)
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(TransportKind::Primary.to_string(), "primary");
        assert_eq!(TransportKind::Fallback.to_string(), "fallback");
        assert_eq!(TransportKind::Console.to_string(), "console");
        assert!(!TransportKind::Console.delivers());
        assert!(TransportKind::Fallback.delivers());
    }

    #[test]
    fn test_handle_identity() {
        let transport: Arc<dyn MailTransport> = Arc::new(MockMailTransport::new());
        let handle = TransportHandle::new(TransportKind::Primary, transport);
        let cloned = handle.clone();
        assert!(handle.same(&cloned));

        let other = TransportHandle::new(
            TransportKind::Primary,
            Arc::new(MockMailTransport::new()),
        );
        assert!(!handle.same(&other));
    }

    #[test]
    fn test_endpoint_debug_redacts_password() {
        let endpoint = SmtpEndpoint {
            host: "smtp.example.com".to_string(),
            port: 465,
            secure: true,
            tls_relaxed: false,
            username: "me".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{endpoint:?}").contains("hunter2"));
    }
}
