//! Keep-alive pinger
//!
//! Free-tier hosts put idle processes to sleep. When enabled, a background
//! task requests `GET {url}/api/ping` on a fixed interval. Failures are
//! logged and never stop the loop; the task ends when the shutdown channel
//! flips to `true` or its sender is dropped.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::KeepAliveSettings;

/// Upper bound for a single ping request
const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Periodic self-ping
#[derive(Debug, Clone)]
pub struct KeepAlive {
    client: reqwest::Client,
    ping_url: String,
    interval: Duration,
}

impl KeepAlive {
    /// Create a pinger for the service at `base_url`
    #[must_use]
    pub fn new(base_url: &str, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(PING_TIMEOUT)
                .build()
                .unwrap_or_default(),
            ping_url: format!("{}/api/ping", base_url.trim_end_matches('/')),
            interval,
        }
    }

    /// Create a pinger from settings, if enabled and a URL is set
    #[must_use]
    pub fn from_settings(settings: &KeepAliveSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        if settings.interval_secs == 0 {
            warn!("Keep-alive enabled with a zero interval, not starting");
            return None;
        }
        match settings.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => Some(Self::new(url, settings.interval())),
            None => {
                warn!("Keep-alive enabled but no URL configured");
                None
            }
        }
    }

    /// URL requested on every tick
    #[must_use]
    pub fn ping_url(&self) -> &str {
        &self.ping_url
    }

    /// Issue one ping
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` error if the request could not be made. A
    /// non-success status is not an error.
    pub async fn ping(&self) -> Result<reqwest::StatusCode, reqwest::Error> {
        let response = self.client.get(&self.ping_url).send().await?;
        Ok(response.status())
    }

    /// Ping every interval until shutdown
    ///
    /// The first ping happens one interval after start. A zero interval
    /// returns immediately.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            warn!(url = %self.ping_url, "Keep-alive interval is zero, not starting");
            return;
        }
        info!(url = %self.ping_url, interval = ?self.interval, "Keep-alive started");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => match self.ping().await {
                    Ok(status) if status.is_success() => debug!(%status, "Keep-alive ping"),
                    Ok(status) => warn!(%status, "Keep-alive ping returned non-success status"),
                    Err(err) => warn!(error = %err, "Keep-alive ping failed"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Keep-alive stopped");
    }

    /// Run on a background task
    #[must_use]
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
