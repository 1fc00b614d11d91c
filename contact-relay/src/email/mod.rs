//! Mail dispatch with fallback transport selection
//!
//! This module provides:
//! - A [`TransportSelector`] that picks, once, between a primary SMTP
//!   endpoint, a fallback endpoint and a console-logging transport
//! - A [`Dispatcher`] that validates requests and sends them within a
//!   bounded time, always producing a [`DispatchResult`]
//! - Askama templates for contact form bodies
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use contact_relay::config::RelayConfig;
//! use contact_relay::email::{Dispatcher, MailRequest, TransportSelector};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RelayConfig::load()?;
//! let selector = Arc::new(TransportSelector::from_config(&config));
//! let dispatcher = Dispatcher::from_config(&config, selector);
//!
//! let request = MailRequest::new("inbox@example.com", "Hello")
//!     .text("Hello from the relay");
//!
//! let result = dispatcher.dispatch(request).await;
//! println!("{}", serde_json::to_string(&result)?);
//! # Ok(())
//! # }
//! ```

mod backend;
mod dispatcher;
mod error;
mod message;
mod request;
pub mod result;
mod selector;
mod template;
mod transport;

pub use backend::{
    console::{ConsoleBackend, CONSOLE_RESPONSE},
    smtp::{LettreConnector, SmtpBackend},
};
pub use dispatcher::Dispatcher;
pub use error::MailError;
pub use message::{format_mailbox, Delivery, Email};
pub use request::{MailRequest, CONTENT_REQUIRED, RECIPIENT_REQUIRED, SUBJECT_REQUIRED};
pub use result::{DispatchResult, FailureKind};
pub use selector::TransportSelector;
pub use template::{ContactSubmission, EmailTemplate};
pub use transport::{
    MailTransport, SmtpEndpoint, TransportConnector, TransportHandle, TransportKind,
};

#[cfg(test)]
pub use transport::{MockMailTransport, MockTransportConnector};
