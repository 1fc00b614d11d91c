//! SMTP backend for sending emails
//!
//! Uses the `lettre` crate to send emails via SMTP servers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::email::{
    Delivery, Email, MailError, MailTransport, SmtpEndpoint, TransportConnector,
    CONTENT_REQUIRED,
};

/// SMTP email backend
///
/// Wraps a pooled `lettre` transport bound to a single endpoint.
pub struct SmtpBackend {
    endpoint: SmtpEndpoint,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpBackend {
    /// Build a backend for the endpoint
    ///
    /// `timeout` bounds each socket operation of the underlying client.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Config` if TLS parameters cannot be built.
    pub fn new(endpoint: SmtpEndpoint, timeout: Duration) -> Result<Self, MailError> {
        let transport = Self::create_transport(&endpoint, timeout)?;
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// The endpoint this backend talks to
    #[must_use]
    pub const fn endpoint(&self) -> &SmtpEndpoint {
        &self.endpoint
    }

    /// Create SMTP transport from the endpoint
    fn create_transport(
        endpoint: &SmtpEndpoint,
        timeout: Duration,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let credentials =
            Credentials::new(endpoint.username.clone(), endpoint.password.clone());

        let tls_parameters = TlsParameters::builder(endpoint.host.clone())
            .dangerous_accept_invalid_certs(endpoint.tls_relaxed)
            .dangerous_accept_invalid_hostnames(endpoint.tls_relaxed)
            .build()
            .map_err(|e| MailError::config(format!("TLS parameters error: {e}")))?;

        let tls = if endpoint.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Required(tls_parameters)
        };

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&endpoint.host)
                .port(endpoint.port)
                .tls(tls)
                .credentials(credentials)
                .timeout(Some(timeout))
                .build(),
        )
    }

    /// Build lettre Message from Email
    fn build_message(email: &Email) -> Result<Message, MailError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|_| MailError::config(format!("invalid sender address: {}", email.from)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::Provider {
                code: None,
                detail: format!("invalid recipient address: {}", email.to),
            })?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .message_id(Some(email.message_id.clone()));

        if let Some(reply_to_addr) = &email.reply_to {
            let reply_to: Mailbox = reply_to_addr.parse().map_err(|_| MailError::Provider {
                code: None,
                detail: format!("invalid reply-to address: {reply_to_addr}"),
            })?;
            builder = builder.reply_to(reply_to);
        }

        let built = match (&email.html, &email.text) {
            (Some(html), Some(text)) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            ),
            (Some(html), None) => builder
                .header(header::ContentType::TEXT_HTML)
                .body(html.clone()),
            (None, Some(text)) => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(text.clone()),
            (None, None) => return Err(MailError::Validation(CONTENT_REQUIRED)),
        };

        built.map_err(|e| MailError::Provider {
            code: None,
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpBackend {
    async fn send(&self, email: Email) -> Result<Delivery, MailError> {
        let message = Self::build_message(&email)?;
        let response = self.transport.send(message).await?;

        let text = response.message().collect::<Vec<_>>().join(" ");
        Ok(Delivery::new(format!("{} {text}", response.code())))
    }

    async fn verify(&self) -> Result<(), MailError> {
        debug!(host = %self.endpoint.host, port = self.endpoint.port, "Testing SMTP connection");
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::Connection {
                code: None,
                detail: format!(
                    "{}:{} did not accept the connection",
                    self.endpoint.host, self.endpoint.port
                ),
            })
        }
    }
}

/// Connector that builds [`SmtpBackend`]s
#[derive(Debug, Clone, Copy)]
pub struct LettreConnector {
    timeout: Duration,
}

impl LettreConnector {
    /// Create a connector whose transports use the given socket timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl TransportConnector for LettreConnector {
    fn connect(&self, endpoint: &SmtpEndpoint) -> Result<Arc<dyn MailTransport>, MailError> {
        Ok(Arc::new(SmtpBackend::new(endpoint.clone(), self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(secure: bool) -> SmtpEndpoint {
        SmtpEndpoint {
            host: "smtp.example.com".to_string(),
            port: if secure { 465 } else { 587 },
            secure,
            tls_relaxed: true,
            username: "user@example.com".to_string(),
            password: "password123".to_string(),
        }
    }

    #[test]
    fn test_build_message_simple() {
        let email = Email::new("sender@example.com")
            .to("recipient@example.com")
            .subject("Test Email")
            .text("This is a test email");

        let message = SmtpBackend::build_message(&email);
        assert!(message.is_ok());
    }

    #[test]
    fn test_build_message_with_html_and_text() {
        let email = Email::new("\"Contact Form\" <sender@example.com>")
            .to("recipient@example.com")
            .reply_to(Some("visitor@example.org"))
            .subject("Test Email")
            .text("This is plain text")
            .html("<h1>This is HTML</h1>");

        let message = SmtpBackend::build_message(&email).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains(&email.message_id));
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let email = Email::new("sender@example.com")
            .to("not an address")
            .subject("Test")
            .text("Body");

        assert!(matches!(
            SmtpBackend::build_message(&email),
            Err(MailError::Provider { .. })
        ));
    }

    #[test]
    fn test_build_message_rejects_bad_sender() {
        let email = Email::new("nobody")
            .to("recipient@example.com")
            .subject("Test")
            .text("Body");

        assert!(matches!(
            SmtpBackend::build_message(&email),
            Err(MailError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_builds_for_both_tls_modes() {
        let timeout = Duration::from_secs(10);
        assert!(SmtpBackend::new(endpoint(true), timeout).is_ok());

        let backend = SmtpBackend::new(endpoint(false), timeout).unwrap();
        assert_eq!(backend.endpoint().port, 587);
    }

    #[tokio::test]
    async fn test_connector_builds_transport() {
        let connector = LettreConnector::new(Duration::from_secs(5));
        assert!(connector.connect(&endpoint(true)).is_ok());
    }
}
