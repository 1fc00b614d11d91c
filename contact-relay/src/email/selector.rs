//! Transport selection
//!
//! The [`TransportSelector`] decides, once, which transport the service
//! sends through:
//!
//! 1. no secret configured: console (permissive) or a configuration error
//!    (strict);
//! 2. the primary endpoint, if it passes the liveness check;
//! 3. the fallback endpoint (alternate port and encryption mode), if it
//!    passes;
//! 4. otherwise the console transport.
//!
//! The choice is cached until [`TransportSelector::reset`] is called. A send
//! failure never triggers re-selection.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::backend::{console::ConsoleBackend, smtp::LettreConnector};
use super::{MailError, SmtpEndpoint, TransportConnector, TransportHandle, TransportKind};
use crate::config::{MailSettings, MissingSecretPolicy, RelayConfig};

/// Resolves and caches the outbound transport
pub struct TransportSelector {
    settings: MailSettings,
    policy: MissingSecretPolicy,
    connector: Arc<dyn TransportConnector>,
    cached: Mutex<Option<TransportHandle>>,
}

impl TransportSelector {
    /// Create a selector that builds transports through `connector`
    #[must_use]
    pub fn new(
        settings: MailSettings,
        policy: MissingSecretPolicy,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        Self {
            settings,
            policy,
            connector,
            cached: Mutex::new(None),
        }
    }

    /// Create a selector backed by real SMTP transports
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        let policy = config
            .mail
            .missing_secret_policy(config.server.environment);
        let connector = Arc::new(LettreConnector::new(config.mail.send_timeout()));
        Self::new(config.mail.clone(), policy, connector)
    }

    /// Return the cached transport, resolving it on first use
    ///
    /// Concurrent first calls wait on the same resolution.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Config` when the secret is missing under the
    /// strict policy. Nothing is cached in that case.
    pub async fn resolve(&self) -> Result<TransportHandle, MailError> {
        let mut cached = self.cached.lock().await;
        if let Some(handle) = cached.as_ref() {
            return Ok(handle.clone());
        }

        let handle = self.select().await?;
        info!(transport = %handle.kind(), "Mail transport resolved");
        *cached = Some(handle.clone());
        Ok(handle)
    }

    /// Variant of the cached transport, without resolving
    ///
    /// Returns `None` when nothing is cached yet or a resolution is in
    /// progress.
    #[must_use]
    pub fn current_kind(&self) -> Option<TransportKind> {
        self.cached
            .try_lock()
            .ok()
            .and_then(|cached| cached.as_ref().map(TransportHandle::kind))
    }

    /// Whether resolution is bound to fail: strict policy without a secret
    #[must_use]
    pub fn lacks_required_secret(&self) -> bool {
        self.policy == MissingSecretPolicy::Strict && self.settings.secret().is_none()
    }

    /// Drop the cached transport so the next call resolves again
    pub async fn reset(&self) {
        self.cached.lock().await.take();
        info!("Mail transport cache cleared");
    }

    async fn select(&self) -> Result<TransportHandle, MailError> {
        let Some(secret) = self.settings.secret() else {
            return match self.policy {
                MissingSecretPolicy::Strict => {
                    error!("Mail password is not configured");
                    Err(MailError::config("mail password is not configured"))
                }
                MissingSecretPolicy::Console => {
                    warn!("Mail password is not configured, emails will be logged to console");
                    Ok(Self::console())
                }
            };
        };

        info!(
            user = %self.settings.user,
            host = %self.settings.host,
            port = self.settings.port,
            "Mail credentials present"
        );

        let primary = self.endpoint(secret, self.settings.port, self.settings.secure);

        if !self.settings.verify {
            return Ok(self
                .connect(&primary, TransportKind::Primary)
                .unwrap_or_else(Self::console));
        }

        if let Some(handle) = self.verified(&primary, TransportKind::Primary).await {
            return Ok(handle);
        }

        let fallback = self.endpoint(
            secret,
            self.settings.fallback_port,
            self.settings.fallback_secure,
        );
        if let Some(handle) = self.verified(&fallback, TransportKind::Fallback).await {
            return Ok(handle);
        }

        warn!("No SMTP endpoint verified, emails will be logged to console");
        Ok(Self::console())
    }

    fn endpoint(&self, secret: &str, port: u16, secure: bool) -> SmtpEndpoint {
        SmtpEndpoint {
            host: self.settings.host.clone(),
            port,
            secure,
            tls_relaxed: self.settings.tls_relaxed,
            username: self.settings.user.clone(),
            password: secret.to_string(),
        }
    }

    fn connect(&self, endpoint: &SmtpEndpoint, kind: TransportKind) -> Option<TransportHandle> {
        match self.connector.connect(endpoint) {
            Ok(transport) => Some(TransportHandle::new(kind, transport)),
            Err(err) => {
                warn!(transport = %kind, port = endpoint.port, error = %err, "Failed to build SMTP transport");
                None
            }
        }
    }

    async fn verified(&self, endpoint: &SmtpEndpoint, kind: TransportKind) -> Option<TransportHandle> {
        let handle = self.connect(endpoint, kind)?;
        let timeout = self.settings.verify_timeout();

        match tokio::time::timeout(timeout, handle.transport().verify()).await {
            Ok(Ok(())) => {
                info!(transport = %kind, port = endpoint.port, "SMTP connection verified");
                Some(handle)
            }
            Ok(Err(err)) => {
                warn!(
                    transport = %kind,
                    port = endpoint.port,
                    code = ?err.provider_code(),
                    error = %err,
                    "SMTP verification failed"
                );
                None
            }
            Err(_) => {
                warn!(transport = %kind, port = endpoint.port, ?timeout, "SMTP verification timed out");
                None
            }
        }
    }

    fn console() -> TransportHandle {
        TransportHandle::new(TransportKind::Console, Arc::new(ConsoleBackend::verbose()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::email::{MailTransport, MockMailTransport, MockTransportConnector};
    use crate::testing::StalledTransport;

    fn settings() -> MailSettings {
        MailSettings {
            user: "me@example.com".to_string(),
            password: Some("app-password".to_string()),
            ..MailSettings::default()
        }
    }

    fn verifying(result: Result<(), MailError>, times: usize) -> Arc<dyn MailTransport> {
        let mut transport = MockMailTransport::new();
        transport
            .expect_verify()
            .times(times)
            .returning(move || result.clone());
        Arc::new(transport)
    }

    fn connector_for(
        primary: Arc<dyn MailTransport>,
        fallback: Option<Arc<dyn MailTransport>>,
    ) -> MockTransportConnector {
        let mut connector = MockTransportConnector::new();
        connector
            .expect_connect()
            .withf(|endpoint| endpoint.port == 465 && endpoint.secure)
            .times(1)
            .returning(move |_| Ok(Arc::clone(&primary)));
        if let Some(fallback) = fallback {
            connector
                .expect_connect()
                .withf(|endpoint| endpoint.port == 587 && !endpoint.secure)
                .times(1)
                .returning(move |_| Ok(Arc::clone(&fallback)));
        }
        connector
    }

    fn selector(settings: MailSettings, connector: MockTransportConnector) -> TransportSelector {
        TransportSelector::new(settings, MissingSecretPolicy::Strict, Arc::new(connector))
    }

    fn refused() -> MailError {
        MailError::from_reply(None, "connection refused")
    }

    #[tokio::test]
    async fn test_strict_policy_fails_without_secret() {
        let mut connector = MockTransportConnector::new();
        connector.expect_connect().never();

        let selector = selector(MailSettings::default(), connector);
        let err = selector.resolve().await.unwrap_err();

        assert!(matches!(err, MailError::Config(_)));
        assert!(selector.current_kind().is_none());
    }

    #[tokio::test]
    async fn test_console_policy_degrades_without_secret() {
        let mut connector = MockTransportConnector::new();
        connector.expect_connect().never();

        let selector = TransportSelector::new(
            MailSettings::default(),
            MissingSecretPolicy::Console,
            Arc::new(connector),
        );
        let handle = selector.resolve().await.unwrap();

        assert_eq!(handle.kind(), TransportKind::Console);
        assert_eq!(selector.current_kind(), Some(TransportKind::Console));
    }

    #[tokio::test]
    async fn test_primary_is_chosen_when_verified() {
        let connector = connector_for(verifying(Ok(()), 1), None);
        let selector = selector(settings(), connector);

        let handle = selector.resolve().await.unwrap();
        assert_eq!(handle.kind(), TransportKind::Primary);
    }

    #[tokio::test]
    async fn test_resolve_returns_identical_cached_handle() {
        // verify and connect are each expected exactly once
        let connector = connector_for(verifying(Ok(()), 1), None);
        let selector = selector(settings(), connector);

        let first = selector.resolve().await.unwrap();
        let second = selector.resolve().await.unwrap();

        assert!(first.same(&second));
    }

    #[tokio::test]
    async fn test_fallback_when_primary_fails() {
        let connector = connector_for(verifying(Err(refused()), 1), Some(verifying(Ok(()), 1)));
        let selector = selector(settings(), connector);

        let handle = selector.resolve().await.unwrap();
        assert_eq!(handle.kind(), TransportKind::Fallback);
    }

    #[tokio::test]
    async fn test_console_when_both_fail() {
        let auth_failure = MailError::from_reply(Some("535".to_string()), "bad credentials");
        let connector = connector_for(
            verifying(Err(auth_failure), 1),
            Some(verifying(Err(refused()), 1)),
        );
        let selector = selector(settings(), connector);

        let handle = selector.resolve().await.unwrap();
        assert_eq!(handle.kind(), TransportKind::Console);

        // the degradation is cached like any other choice
        let again = selector.resolve().await.unwrap();
        assert!(handle.same(&again));
    }

    #[tokio::test]
    async fn test_console_when_connector_fails_without_verify() {
        let mut connector = MockTransportConnector::new();
        connector
            .expect_connect()
            .times(1)
            .returning(|_| Err(MailError::config("bad TLS parameters")));

        let settings = MailSettings {
            verify: false,
            ..settings()
        };
        let handle = selector(settings, connector).resolve().await.unwrap();
        assert_eq!(handle.kind(), TransportKind::Console);
    }

    #[tokio::test]
    async fn test_skips_verification_when_disabled() {
        let connector = connector_for(verifying(Ok(()), 0), None);
        let settings = MailSettings {
            verify: false,
            ..settings()
        };

        let handle = selector(settings, connector).resolve().await.unwrap();
        assert_eq!(handle.kind(), TransportKind::Primary);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_verification_times_out_to_fallback() {
        let connector = connector_for(
            Arc::new(StalledTransport::new()),
            Some(verifying(Ok(()), 1)),
        );
        let selector = selector(settings(), connector);

        let started = tokio::time::Instant::now();
        let handle = selector.resolve().await.unwrap();

        assert_eq!(handle.kind(), TransportKind::Fallback);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_reset_resolves_again() {
        let mut connector = MockTransportConnector::new();
        connector
            .expect_connect()
            .times(2)
            .returning(|_| {
                let mut transport = MockMailTransport::new();
                transport.expect_verify().times(1).returning(|| Ok(()));
                let transport: Arc<dyn MailTransport> = Arc::new(transport);
                Ok(transport)
            });
        let selector = selector(settings(), connector);

        let first = selector.resolve().await.unwrap();
        selector.reset().await;
        assert!(selector.current_kind().is_none());

        let second = selector.resolve().await.unwrap();
        assert!(!first.same(&second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_resolution_verifies_once() {
        let connector = connector_for(verifying(Ok(()), 1), None);
        let selector = Arc::new(selector(settings(), connector));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let selector = Arc::clone(&selector);
                tokio::spawn(async move { selector.resolve().await.unwrap() })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert!(handles.windows(2).all(|pair| pair[0].same(&pair[1])));
    }
}
