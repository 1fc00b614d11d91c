//! Console backend
//!
//! Logs messages instead of sending them. Used when no working relay can be
//! established, and in development without credentials.

use async_trait::async_trait;
use tracing::info;

use crate::email::{Delivery, Email, MailError, MailTransport};

/// Response reported for messages written to the log
pub const CONSOLE_RESPONSE: &str = "250 OK: message logged to console, not delivered";

/// Console email backend
///
/// Writes one structured log event per message. When `verbose`, the bodies
/// are logged too, at the same level, so they survive a production filter.
///
/// ```rust
/// use contact_relay::email::{ConsoleBackend, Email, MailTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ConsoleBackend::new();
///
/// let email = Email::new("noreply@myapp.com")
///     .to("user@example.com")
///     .subject("Hello!")
///     .text("Hello, World!");
///
/// backend.send(email).await?; // Logged, not delivered
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsoleBackend {
    verbose: bool,
}

impl ConsoleBackend {
    /// Create a new console backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console backend that also logs message bodies
    #[must_use]
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl MailTransport for ConsoleBackend {
    async fn send(&self, email: Email) -> Result<Delivery, MailError> {
        info!(
            message_id = %email.message_id,
            from = %email.from,
            to = %email.to,
            reply_to = ?email.reply_to,
            subject = %email.subject,
            has_text = email.text.is_some(),
            has_html = email.html.is_some(),
            "Console transport: email not delivered"
        );

        if self.verbose {
            if let Some(text) = &email.text {
                info!(message_id = %email.message_id, text = %text, "Email text content");
            }
            if let Some(html) = &email.html {
                info!(message_id = %email.message_id, html = %html, "Email HTML content");
            }
        }

        Ok(Delivery::new(CONSOLE_RESPONSE))
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::EnvFilter;

    use super::*;

    /// Log sink shared with the subscriber under test
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn output(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn email() -> Email {
        Email::new("noreply@myapp.com")
            .to("user@example.com")
            .subject("Test Email")
            .text("plain body from the form")
            .html("<p>html body from the form</p>")
    }

    async fn logged_at_info(backend: ConsoleBackend) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        backend.send(email()).await.unwrap();
        captured.output()
    }

    #[tokio::test]
    async fn test_console_backend_send() {
        let backend = ConsoleBackend::new();

        let email = Email::new("noreply@myapp.com")
            .to("user@example.com")
            .subject("Test Email")
            .text("This is a test email");

        let delivery = backend.send(email).await.unwrap();
        assert_eq!(delivery.response, CONSOLE_RESPONSE);
    }

    #[tokio::test]
    async fn test_console_backend_verbose() {
        let backend = ConsoleBackend::verbose();

        let email = Email::new("noreply@myapp.com")
            .to("user@example.com")
            .subject("Test Email")
            .text("This is plain text")
            .html("<h1>This is HTML</h1>");

        assert!(backend.send(email).await.is_ok());
    }

    #[tokio::test]
    async fn test_verbose_bodies_logged_at_info() {
        let output = logged_at_info(ConsoleBackend::verbose()).await;
        assert!(output.contains("Console transport: email not delivered"));
        assert!(output.contains("plain body from the form"));
        assert!(output.contains("html body from the form"));
    }

    #[tokio::test]
    async fn test_quiet_backend_logs_metadata_only() {
        let output = logged_at_info(ConsoleBackend::new()).await;
        assert!(output.contains("Test Email"));
        assert!(!output.contains("plain body from the form"));
    }

    #[tokio::test]
    async fn test_console_backend_always_verifies() {
        assert!(ConsoleBackend::new().verify().await.is_ok());
    }
}
