//! Timeout-bounded message dispatch
//!
//! [`Dispatcher::dispatch`] is the only entry point the HTTP layer uses. It
//! never fails: every error path becomes a [`DispatchResult::Failure`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::message::format_mailbox;
use super::{
    Delivery, DispatchResult, Email, MailError, MailRequest, TransportHandle, TransportSelector,
};
use crate::config::RelayConfig;

/// Validates requests and sends them through the selected transport
pub struct Dispatcher {
    selector: Arc<TransportSelector>,
    from: String,
    send_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher
    ///
    /// `from` is the full sender mailbox, display name included.
    #[must_use]
    pub fn new(selector: Arc<TransportSelector>, from: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            selector,
            from: from.into(),
            send_timeout,
        }
    }

    /// Create a dispatcher using the configured sender and send timeout
    #[must_use]
    pub fn from_config(config: &RelayConfig, selector: Arc<TransportSelector>) -> Self {
        let from = format_mailbox(&config.mail.from_name, config.mail.sender_address());
        Self::new(selector, from, config.mail.send_timeout())
    }

    /// The selector this dispatcher resolves transports from
    #[must_use]
    pub fn selector(&self) -> &TransportSelector {
        &self.selector
    }

    /// Validate and send one message
    ///
    /// Validation happens before any transport is touched. The send is
    /// bounded by the send timeout; on timeout the caller stops waiting but
    /// the send itself keeps running in the background.
    pub async fn dispatch(&self, request: MailRequest) -> DispatchResult {
        if let Err(err) = request.validate() {
            debug!(error = %err, "Rejected mail request");
            return err.into();
        }

        let handle = match self.selector.resolve().await {
            Ok(handle) => handle,
            Err(err) => {
                error!(error = %err, "Mail transport unavailable");
                return err.into();
            }
        };

        let email = self.compose(&request);
        let message_id = email.message_id.clone();

        match self.deliver(&handle, email).await {
            Ok(delivery) => {
                info!(
                    message_id = %message_id,
                    transport = %handle.kind(),
                    response = %delivery.response,
                    "Email sent"
                );
                DispatchResult::Success {
                    message_id,
                    provider_response: delivery.response,
                    transport: handle.kind(),
                }
            }
            Err(err) => {
                match &err {
                    MailError::Timeout(_) => {
                        warn!(message_id = %message_id, error = %err, "Email send timed out");
                    }
                    _ => error!(
                        message_id = %message_id,
                        transport = %handle.kind(),
                        code = ?err.provider_code(),
                        error = %err,
                        "Email send failed"
                    ),
                }
                err.into()
            }
        }
    }

    fn compose(&self, request: &MailRequest) -> Email {
        let mut email = Email::new(&self.from)
            .to(request.recipient.trim())
            .reply_to(request.reply_to.as_deref())
            .subject(request.subject.trim());

        if let Some(text) = request.plain_text_body.as_deref().filter(|t| !t.trim().is_empty()) {
            email = email.text(text);
        }
        if let Some(html) = request.html_body.as_deref().filter(|h| !h.trim().is_empty()) {
            email = email.html(html);
        }

        email
    }

    async fn deliver(&self, handle: &TransportHandle, email: Email) -> Result<Delivery, MailError> {
        let transport = handle.transport();
        let send = tokio::spawn(async move { transport.send(email).await });

        // Dropping the join handle on timeout detaches the send; it is not aborted.
        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(MailError::Provider {
                code: None,
                detail: format!("send task failed: {join_err}"),
            }),
            Err(_) => Err(MailError::Timeout(self.send_timeout)),
        }
    }
}
