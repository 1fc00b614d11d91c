//! Transport backend implementations
//!
//! - **SMTP**: Send emails via an SMTP relay (production)
//! - **Console**: Log emails instead of sending them (degradation, development)

pub mod console;
pub mod smtp;
