//! Mail requests accepted by the dispatcher

use serde::{Deserialize, Serialize};

use super::MailError;

/// Message shown when the recipient is missing
pub const RECIPIENT_REQUIRED: &str = "Recipient email is required";

/// Message shown when the subject is missing
pub const SUBJECT_REQUIRED: &str = "Subject is required";

/// Message shown when neither body is present
pub const CONTENT_REQUIRED: &str = "Email content (text or html) is required";

/// A request to send one message
///
/// Requests are immutable once built. Use the builder methods:
///
/// ```rust
/// use contact_relay::email::MailRequest;
///
/// let request = MailRequest::new("inbox@example.com", "Hello")
///     .text("Plain body")
///     .html("<p>HTML body</p>");
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailRequest {
    /// Destination address
    #[serde(default)]
    pub recipient: String,

    /// Message subject
    #[serde(default)]
    pub subject: String,

    /// Plain text body
    #[serde(default)]
    pub plain_text_body: Option<String>,

    /// HTML body
    #[serde(default)]
    pub html_body: Option<String>,

    /// Reply-To address
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl MailRequest {
    /// Create a request with a recipient and subject
    #[must_use]
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.plain_text_body = Some(body.into());
        self
    }

    /// Set the HTML body
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Set the reply-to address
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Validate the request
    ///
    /// Blank strings count as missing. Checks run in field order, so the
    /// first missing field determines the message.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Validation`] naming the first missing field.
    pub fn validate(&self) -> Result<(), MailError> {
        if is_blank(Some(&self.recipient)) {
            return Err(MailError::Validation(RECIPIENT_REQUIRED));
        }

        if is_blank(Some(&self.subject)) {
            return Err(MailError::Validation(SUBJECT_REQUIRED));
        }

        if is_blank(self.plain_text_body.as_ref()) && is_blank(self.html_body.as_ref()) {
            return Err(MailError::Validation(CONTENT_REQUIRED));
        }

        Ok(())
    }
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message_of(request: &MailRequest) -> Option<&'static str> {
        match request.validate() {
            Err(MailError::Validation(msg)) => Some(msg),
            _ => None,
        }
    }

    #[test]
    fn test_valid_request() {
        let request = MailRequest::new("user@example.com", "Hi").text("Hello");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_html_only_is_enough() {
        let request = MailRequest::new("user@example.com", "Hi").html("<b>Hello</b>");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_missing_recipient() {
        let request = MailRequest::new("", "Hi").text("Hello");
        assert_eq!(message_of(&request), Some(RECIPIENT_REQUIRED));
    }

    #[test]
    fn test_missing_subject() {
        let request = MailRequest::new("user@example.com", "  ").text("Hello");
        assert_eq!(message_of(&request), Some(SUBJECT_REQUIRED));
    }

    #[test]
    fn test_missing_bodies() {
        let request = MailRequest::new("user@example.com", "Hi").text("").html(" ");
        assert_eq!(message_of(&request), Some(CONTENT_REQUIRED));
    }

    #[test]
    fn test_deserializes_camel_case() {
        let request: MailRequest = serde_json::from_str(
            r#"{"recipient":"a@b.c","subject":"s","plainTextBody":"t","htmlBody":null}"#,
        )
        .unwrap();
        assert_eq!(request.plain_text_body.as_deref(), Some("t"));
        assert!(request.html_body.is_none());
    }

    proptest! {
        #[test]
        fn blank_recipient_always_rejected(
            ws in "[ \t]{0,4}",
            subject in ".{0,20}",
            body in proptest::option::of(".{0,20}"),
        ) {
            let request = MailRequest {
                recipient: ws,
                subject,
                plain_text_body: body,
                ..MailRequest::default()
            };
            prop_assert_eq!(message_of(&request), Some(RECIPIENT_REQUIRED));
        }

        #[test]
        fn bodiless_request_always_rejected(
            recipient in "[a-z]{1,8}@[a-z]{1,8}\\.com",
            subject in "[A-Za-z]{1,20}",
        ) {
            let request = MailRequest::new(recipient, subject);
            prop_assert_eq!(message_of(&request), Some(CONTENT_REQUIRED));
        }
    }
}
