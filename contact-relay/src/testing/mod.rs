//! Test doubles for the mail pipeline
//!
//! - [`RecordingTransport`] - captures sent emails in memory
//! - [`StalledTransport`] - never answers, for timeout tests
//! - [`StaticConnector`] - hands out one prebuilt transport and counts calls
//!
//! `mockall` mocks of [`MailTransport`] and
//! [`TransportConnector`](crate::email::TransportConnector) live beside the
//! traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::email::{Delivery, Email, MailError, MailTransport, SmtpEndpoint, TransportConnector};

/// Transport that records every email it is asked to send
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl RecordingTransport {
    /// Response reported for every recorded send
    pub const RESPONSE: &'static str = "250 2.0.0 OK recorded";

    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of emails sent
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Last email sent
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn last_sent(&self) -> Option<Email> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: Email) -> Result<Delivery, MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(Delivery::new(Self::RESPONSE))
    }
}

/// Transport whose verify and send never complete
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledTransport;

impl StalledTransport {
    /// Create a stalled transport
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for StalledTransport {
    async fn send(&self, _email: Email) -> Result<Delivery, MailError> {
        std::future::pending().await
    }

    async fn verify(&self) -> Result<(), MailError> {
        std::future::pending().await
    }
}

/// Connector that returns the same transport for every endpoint
///
/// Clones share the connect counter.
#[derive(Clone)]
pub struct StaticConnector {
    transport: Arc<dyn MailTransport>,
    connects: Arc<AtomicUsize>,
}

impl StaticConnector {
    /// Wrap a transport
    pub fn new(transport: impl MailTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many transports have been built
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl TransportConnector for StaticConnector {
    fn connect(&self, _endpoint: &SmtpEndpoint) -> Result<Arc<dyn MailTransport>, MailError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.transport))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_recording_transport() {
        let recorder = RecordingTransport::new();
        let email = Email::new("noreply@example.com")
            .to("user@example.com")
            .subject("Test")
            .text("Hello");

        let delivery = recorder.send(email).await.unwrap();

        assert_eq!(delivery.response, RecordingTransport::RESPONSE);
        assert_eq!(recorder.sent_count(), 1);
        assert_eq!(recorder.last_sent().unwrap().subject, "Test");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transport_never_answers() {
        let verify = tokio::time::timeout(Duration::from_secs(3600), StalledTransport.verify()).await;
        assert!(verify.is_err());
    }

    #[test]
    fn test_static_connector_counts() {
        let connector = StaticConnector::new(RecordingTransport::new());
        let shared = connector.clone();
        let endpoint = SmtpEndpoint {
            host: "smtp.example.com".to_string(),
            port: 465,
            secure: true,
            tls_relaxed: true,
            username: "me".to_string(),
            password: "pw".to_string(),
        };

        let first = connector.connect(&endpoint).unwrap();
        let second = connector.connect(&endpoint).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(shared.connect_count(), 2);
    }
}
