//! Configuration management for contact-relay
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `RELAY_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/contact-relay/config.toml` (user config, XDG)
//! 4. `/etc/contact-relay/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `RELAY_SECTION__FIELD_NAME`
//! - Use `__` (double underscore) to separate nested sections
//! - Use `_` (single underscore) within field names
//! - Example: `RELAY_MAIL__PASSWORD=app-password`
//! - All-digit `user` and `password` values are read as text; quote them
//!   (`RELAY_MAIL__PASSWORD='"0042"'`) to keep leading zeros
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [server]
//! port = 3000
//! allowed_origins = "https://example.com,https://www.example.com"
//! environment = "production"
//!
//! [mail]
//! user = "me@example.com"
//! host = "smtp.gmail.com"
//! port = 465
//! from_name = "Portfolio Contact"
//! missing_secret = "strict"
//!
//! [keep_alive]
//! enabled = true
//! url = "https://my-service.onrender.com"
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name used for XDG and system configuration directories
pub const SERVICE_NAME: &str = "contact-relay";

/// Sender address used when neither `from_address` nor `user` is configured
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@localhost";

/// Execution environment flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; raw provider details are echoed to clients
    #[default]
    Development,
    /// Deployed service
    Production,
}

impl Environment {
    /// Whether this is the production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// What to do when the mail account secret is not configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSecretPolicy {
    /// Transport resolution fails with a configuration error
    Strict,
    /// Degrade to the console transport, which only logs messages
    Console,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Comma-separated list of origins allowed to call the API.
    /// An empty list allows any origin.
    pub allowed_origins: String,

    /// Execution environment
    pub environment: Environment,

    /// Maximum accepted request body size in bytes
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: String::new(),
            environment: Environment::Development,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl ServerSettings {
    /// Parsed list of allowed origins, trimmed, empty entries dropped
    #[must_use]
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Socket address string for binding
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Mail transport configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Mail account identity (SMTP username)
    #[serde(deserialize_with = "credential")]
    pub user: String,

    /// Mail account secret (SMTP password or app password)
    #[serde(deserialize_with = "optional_credential")]
    pub password: Option<String>,

    /// SMTP server hostname
    pub host: String,

    /// Primary SMTP port
    pub port: u16,

    /// Implicit TLS on the primary port (STARTTLS when false)
    pub secure: bool,

    /// Port tried when the primary fails verification
    pub fallback_port: u16,

    /// Implicit TLS on the fallback port (STARTTLS when false)
    pub fallback_secure: bool,

    /// Accept self-signed or otherwise invalid server certificates
    pub tls_relaxed: bool,

    /// Verify the primary connection before caching it
    pub verify: bool,

    /// Sender display name
    pub from_name: String,

    /// Sender address; defaults to `user`
    pub from_address: Option<String>,

    /// Destination for contact form submissions; defaults to `user`
    pub recipient: Option<String>,

    /// Missing-secret policy; when unset, `strict` in production and
    /// `console` otherwise
    pub missing_secret: Option<MissingSecretPolicy>,

    /// Timeout for the connection liveness check
    pub verify_timeout_secs: u64,

    /// Timeout for a single send
    pub send_timeout_secs: u64,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: None,
            host: "smtp.gmail.com".to_string(),
            port: 465,
            secure: true,
            fallback_port: 587,
            fallback_secure: false,
            tls_relaxed: true,
            verify: true,
            from_name: "Contact Form".to_string(),
            from_address: None,
            recipient: None,
            missing_secret: None,
            verify_timeout_secs: 10,
            send_timeout_secs: 20,
        }
    }
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("fallback_port", &self.fallback_port)
            .field("fallback_secure", &self.fallback_secure)
            .field("tls_relaxed", &self.tls_relaxed)
            .field("verify", &self.verify)
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("recipient", &self.recipient)
            .field("missing_secret", &self.missing_secret)
            .field("verify_timeout_secs", &self.verify_timeout_secs)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

impl MailSettings {
    /// The configured secret, treating blank values as absent
    ///
    /// The value is returned as configured, surrounding whitespace included.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }

    /// Missing-secret policy in effect for the given environment
    #[must_use]
    pub fn missing_secret_policy(&self, environment: Environment) -> MissingSecretPolicy {
        self.missing_secret.unwrap_or(if environment.is_production() {
            MissingSecretPolicy::Strict
        } else {
            MissingSecretPolicy::Console
        })
    }

    /// Sender address: `from_address`, then `user`, then a fixed default
    #[must_use]
    pub fn sender_address(&self) -> &str {
        self.from_address
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
            .or_else(|| Some(self.user.as_str()).filter(|user| !user.trim().is_empty()))
            .unwrap_or(DEFAULT_FROM_ADDRESS)
    }

    /// Destination for contact form submissions: `recipient`, then `user`
    #[must_use]
    pub fn recipient_address(&self) -> &str {
        self.recipient
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or(&self.user)
    }

    /// Liveness check timeout
    #[must_use]
    pub const fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    /// Send timeout
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Credential as parsed by a provider; the env provider turns digits into numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum Credential {
    Text(String),
    Flag(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        match value {
            Credential::Text(text) => text,
            Credential::Flag(flag) => flag.to_string(),
            Credential::Unsigned(n) => n.to_string(),
            Credential::Signed(n) => n.to_string(),
            Credential::Float(n) => n.to_string(),
        }
    }
}

fn credential<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Credential::deserialize(deserializer).map(String::from)
}

fn optional_credential<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Credential>::deserialize(deserializer).map(|value| value.map(String::from))
}

/// Keep-alive pinger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveSettings {
    /// Run the pinger
    pub enabled: bool,

    /// Public base URL of this service
    pub url: Option<String>,

    /// Seconds between pings
    pub interval_secs: u64,
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            interval_secs: 14 * 60,
        }
    }
}

impl KeepAliveSettings {
    /// Ping interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Complete contact-relay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Mail transport settings
    #[serde(default)]
    pub mail: MailSettings,

    /// Keep-alive settings
    #[serde(default)]
    pub keep_alive: KeepAliveSettings,
}

impl RelayConfig {
    /// Load configuration from all standard locations
    ///
    /// Searches for configuration with precedence:
    /// 1. Environment variables (`RELAY_*`, use `__` for nesting)
    /// 2. `./config.toml`
    /// 3. `~/.config/contact-relay/config.toml`
    /// 4. `/etc/contact-relay/config.toml`
    /// 5. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be parsed or a value
    /// fails type conversion.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use contact_relay::config::RelayConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = RelayConfig::load()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> anyhow::Result<Self> {
        let mut figment = Self::defaults()?;

        let system_config = PathBuf::from("/etc").join(SERVICE_NAME).join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path();
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        Self::from_figment(figment.merge(Self::env_provider()))
    }

    /// Load configuration from a specific file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or a value fails
    /// type conversion.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let figment = Self::defaults()?
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env_provider());

        Self::from_figment(figment)
    }

    /// Extract configuration from an already-assembled figment
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        Ok(figment.extract()?)
    }

    /// Recommended XDG config path, `./config.toml` when unavailable
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| config_dir.join(SERVICE_NAME).join("config.toml"),
        )
    }

    /// Figment seeded with the hardcoded defaults (lowest priority)
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be serialized to TOML.
    pub fn defaults() -> anyhow::Result<Figment> {
        Ok(Figment::new().merge(Toml::string(&toml::to_string(&Self::default())?)))
    }

    fn env_provider() -> Env {
        Env::prefixed("RELAY_").split("__").lowercase(true)
    }
}
