//! Application state management
//!
//! [`RelayState`] is the composition root: it owns the configuration, the
//! transport selector and the dispatcher built on top of it.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::email::{Dispatcher, TransportConnector, TransportSelector};

/// Shared state for the HTTP layer
///
/// Cheap to clone; every field is reference counted.
///
/// # Example
///
/// ```rust
/// use contact_relay::{config::RelayConfig, state::RelayState};
///
/// let state = RelayState::new(RelayConfig::default());
///
/// let app: axum::Router = axum::Router::new()
///     .route("/", axum::routing::get(|| async { "Hello!" }))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct RelayState {
    config: Arc<RelayConfig>,
    selector: Arc<TransportSelector>,
    dispatcher: Arc<Dispatcher>,
}

impl RelayState {
    /// Create state backed by real SMTP transports
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let selector = Arc::new(TransportSelector::from_config(&config));
        Self::with_selector(config, selector)
    }

    /// Create state whose transports are built by `connector`
    #[must_use]
    pub fn with_connector(config: RelayConfig, connector: Arc<dyn TransportConnector>) -> Self {
        let policy = config.mail.missing_secret_policy(config.server.environment);
        let selector = Arc::new(TransportSelector::new(config.mail.clone(), policy, connector));
        Self::with_selector(config, selector)
    }

    fn with_selector(config: RelayConfig, selector: Arc<TransportSelector>) -> Self {
        let dispatcher = Arc::new(Dispatcher::from_config(&config, Arc::clone(&selector)));
        Self {
            config: Arc::new(config),
            selector,
            dispatcher,
        }
    }

    /// Get configuration reference
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Get the transport selector
    #[must_use]
    pub fn selector(&self) -> &TransportSelector {
        &self.selector
    }

    /// Get the dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
