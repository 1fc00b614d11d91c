//! Email body templates
//!
//! Contact form submissions are rendered twice: an auto-escaped HTML body
//! and a plain text body. Both come from inline Askama templates.

use askama::Template;

use super::MailRequest;

/// Trait for email templates rendering both bodies
pub trait EmailTemplate {
    /// Render the email template
    ///
    /// Returns a tuple of `(html, text)`.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if either template fails to render
    fn render_email(&self) -> Result<(String, String), askama::Error>;
}

/// A visitor's contact form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    /// Visitor name
    pub name: String,
    /// Visitor email, used as reply-to
    pub email: String,
    /// Optional subject chosen by the visitor
    pub subject: Option<String>,
    /// Message text
    pub message: String,
}

#[derive(Template)]
#[template(
    source = r#"<div style="font-family: sans-serif; max-width: 600px;">
<h2>New contact form submission</h2>
<p><strong>Name:</strong> {{ name }}</p>
<p><strong>Email:</strong> <a href="mailto:{{ email }}">{{ email }}</a></p>
<p><strong>Subject:</strong> {{ subject }}</p>
<hr>
<p style="white-space: pre-wrap;">{{ message }}</p>
</div>"#,
    ext = "html"
)]
struct ContactHtml<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(
    source = "New contact form submission

Name: {{ name }}
Email: {{ email }}
Subject: {{ subject }}

{{ message }}
",
    ext = "txt"
)]
struct ContactText<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

impl ContactSubmission {
    /// Subject line of the relayed message
    #[must_use]
    pub fn subject_line(&self) -> String {
        match self.subject.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => format!("Contact form: {subject}"),
            None => format!("New contact form submission from {}", self.name.trim()),
        }
    }

    /// Render both bodies and build the request for `recipient`
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render
    pub fn to_request(&self, recipient: &str) -> Result<MailRequest, askama::Error> {
        let (html, text) = self.render_email()?;
        Ok(MailRequest::new(recipient, self.subject_line())
            .text(text)
            .html(html)
            .reply_to(self.email.trim()))
    }

    fn shown_subject(&self) -> &str {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(none)")
    }
}

impl EmailTemplate for ContactSubmission {
    fn render_email(&self) -> Result<(String, String), askama::Error> {
        let subject = self.shown_subject();

        let html = ContactHtml {
            name: self.name.trim(),
            email: self.email.trim(),
            subject,
            message: &self.message,
        }
        .render()?;

        let text = ContactText {
            name: self.name.trim(),
            email: self.email.trim(),
            subject,
            message: &self.message,
        }
        .render()?;

        Ok((html, text))
    }
}
