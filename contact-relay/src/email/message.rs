//! Composed outgoing messages
//!
//! An [`Email`] is what a transport actually delivers: a validated
//! [`MailRequest`](super::MailRequest) plus the sender identity and a
//! message id assigned by the dispatcher.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fully composed message, ready for a transport
///
/// ```rust
/// use contact_relay::email::Email;
///
/// let email = Email::new("Contact Form <noreply@example.com>")
///     .to("inbox@example.com")
///     .subject("Welcome!")
///     .text("Welcome to our app!")
///     .html("<h1>Welcome to our app!</h1>");
///
/// assert!(email.message_id.ends_with("@example.com>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Sender mailbox, optionally with display name
    pub from: String,

    /// Recipient
    pub to: String,

    /// Reply-To address
    pub reply_to: Option<String>,

    /// Subject line
    pub subject: String,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// `Message-ID` header value, angle brackets included
    pub message_id: String,
}

impl Email {
    /// Create a message from the given sender with a fresh message id
    #[must_use]
    pub fn new(from: &str) -> Self {
        Self {
            message_id: generate_message_id(from),
            from: from.to_string(),
            to: String::new(),
            reply_to: None,
            subject: String::new(),
            text: None,
            html: None,
        }
    }

    /// Set the recipient
    #[must_use]
    pub fn to(mut self, address: &str) -> Self {
        self.to = address.to_string();
        self
    }

    /// Set the reply-to address
    #[must_use]
    pub fn reply_to(mut self, address: Option<&str>) -> Self {
        self.reply_to = address.map(ToString::to_string);
        self
    }

    /// Set the subject
    #[must_use]
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, body: &str) -> Self {
        self.text = Some(body.to_string());
        self
    }

    /// Set the HTML body
    #[must_use]
    pub fn html(mut self, body: &str) -> Self {
        self.html = Some(body.to_string());
        self
    }
}

/// Format a sender mailbox from a display name and an address
#[must_use]
pub fn format_mailbox(name: &str, address: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        address.to_string()
    } else {
        format!("\"{}\" <{address}>", name.replace('"', "'"))
    }
}

/// Build a `Message-ID` on the sender's domain
fn generate_message_id(from: &str) -> String {
    let address = from
        .rsplit_once('<')
        .map_or(from, |(_, rest)| rest.trim_end_matches('>'));
    let domain = address
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");

    format!("<{}@{domain}>", Uuid::new_v4())
}

/// Outcome of a successful delivery, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Raw transport response
    pub response: String,
}

impl Delivery {
    /// Create a delivery report from a raw response
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}
