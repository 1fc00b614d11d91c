//! contact-relay: contact-form backend that relays submissions over SMTP
//!
//! Accepts contact-form submissions over HTTP, validates them and relays
//! them as email. The mail pipeline is two components:
//!
//! - [`email::TransportSelector`] resolves, once, which transport to send
//!   through: a primary SMTP endpoint, a fallback endpoint, or a console
//!   transport that only logs
//! - [`email::Dispatcher`] validates a request and sends it within a
//!   bounded time, always returning an [`email::DispatchResult`]
//!
//! Around them sit layered configuration, structured logging, an axum
//! router with health checks, and a keep-alive pinger.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use contact_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     observability::init()?;
//!     let config = RelayConfig::load()?;
//!
//!     let addr = config.server.bind_addr();
//!     let app = http::router(RelayState::new(config));
//!
//!     let listener = tokio::net::TcpListener::bind(&addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod email;
pub mod error;
pub mod extractors;
pub mod health;
pub mod http;
pub mod keepalive;
pub mod observability;
pub mod state;

#[cfg(test)]
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use contact_relay::prelude::*;
    //! ```

    pub use crate::config::{Environment, MissingSecretPolicy, RelayConfig};
    pub use crate::email::{
        DispatchResult, Dispatcher, FailureKind, MailError, MailRequest, MailTransport,
        TransportKind, TransportSelector,
    };
    pub use crate::error::RelayError;
    pub use crate::extractors::ValidatedJson;
    pub use crate::keepalive::KeepAlive;
    pub use crate::state::RelayState;
    pub use crate::{http, observability};
}
