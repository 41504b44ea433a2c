//! Connection parameters for an OBS instance.
//!
//! Provides a type-safe, immutable description of where OBS listens and
//! how to authenticate. Parameters arrive per call from the settings store;
//! nothing here is global.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use obs_remote::ConnectionParameters;
//!
//! let params = ConnectionParameters::new("192.168.1.20", 4455)
//!     .with_password("hunter2")
//!     .with_timeout(Duration::from_secs(5));
//!
//! params.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Host used when no setting has been stored yet.
pub const DEFAULT_HOST: &str = "host.docker.internal";

/// obs-websocket's default port.
pub const DEFAULT_PORT: u16 = 4455;

/// Bound applied to connect, handshake and each message exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// ConnectionParameters
// ============================================================================

/// Where and how to reach an OBS instance.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionParameters {
    /// Host name or IP address.
    pub host: String,

    /// TCP port (1-65535).
    pub port: u16,

    /// obs-websocket password. Empty strings deserialize as `None`.
    #[serde(deserialize_with = "deserialize_password")]
    pub password: Option<String>,

    /// Wrap the TCP stream in TLS.
    pub use_tls: bool,

    /// Timeout for connect, handshake and each exchange.
    #[serde(rename = "timeout_secs", deserialize_with = "deserialize_secs")]
    pub timeout: Duration,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            use_tls: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("use_tls", &self.use_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionParameters {
    /// Creates parameters for `host:port` with default settings.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Parses a `ws://host:port` or `wss://host:port` URL.
    ///
    /// `wss` enables TLS. A URL without a port uses the scheme's default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid, not `ws`/`wss`,
    /// or has no host.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::config(format!("Invalid URL {raw}: {e}")))?;

        let use_tls = match url.scheme() {
            "ws" => false,
            "wss" => true,
            other => return Err(Error::config(format!("Unsupported scheme: {other}"))),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config(format!("URL has no host: {raw}")))?;

        let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);

        Ok(Self {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            use_tls,
            ..Default::default()
        })
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionParameters {
    /// Sets the password. An empty string clears it.
    #[inline]
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    /// Enables TLS.
    #[inline]
    #[must_use]
    pub fn with_tls(mut self) -> Self {
        self.use_tls = true;
        self
    }

    /// Sets the timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ConnectionParameters {
    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty host, port 0 or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("port must be between 1 and 65535"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Returns the timeout in milliseconds, for error reporting.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns `true` if a non-empty password is configured.
    #[inline]
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Returns the password-free view of these parameters.
    #[must_use]
    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            host: self.host.clone(),
            port: self.port,
            use_tls: self.use_tls,
            has_password: self.has_password(),
        }
    }
}

// ============================================================================
// SettingsSummary
// ============================================================================

/// Settings as shown to an operator: everything except the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSummary {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// TLS enabled.
    pub use_tls: bool,
    /// A password is stored.
    pub has_password: bool,
}

impl Default for SettingsSummary {
    fn default() -> Self {
        ConnectionParameters::default().summary()
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

fn deserialize_password<'de, D>(deserializer: D) -> StdResult<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let password = Option::<String>::deserialize(deserializer)?;
    Ok(password.filter(|p| !p.is_empty()))
}

fn deserialize_secs<'de, D>(deserializer: D) -> StdResult<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<u64>::deserialize(deserializer)?;
    Ok(secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_settings_table() {
        let params = ConnectionParameters::default();
        assert_eq!(params.host, "host.docker.internal");
        assert_eq!(params.port, 4455);
        assert!(params.password.is_none());
        assert!(!params.use_tls);
        assert_eq!(params.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_chain() {
        let params = ConnectionParameters::new("obs.local", 4444)
            .with_password("p@ss")
            .with_tls()
            .with_timeout(Duration::from_secs(10));

        assert_eq!(params.address(), "obs.local:4444");
        assert!(params.has_password());
        assert!(params.use_tls);
        assert_eq!(params.timeout_ms(), 10_000);
    }

    #[test]
    fn test_empty_password_is_none() {
        let params = ConnectionParameters::new("obs.local", 4455).with_password("");
        assert!(params.password.is_none());
        assert!(!params.has_password());
    }

    #[test]
    fn test_debug_redacts_password() {
        let params = ConnectionParameters::new("obs.local", 4455).with_password("hunter2");
        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionParameters::new("obs.local", 4455).validate().is_ok());
        assert!(ConnectionParameters::new("", 4455).validate().is_err());
        assert!(ConnectionParameters::new("obs.local", 0).validate().is_err());
        assert!(
            ConnectionParameters::new("obs.local", 4455)
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        let params = ConnectionParameters::new("::1", 4455);
        assert_eq!(params.address(), "[::1]:4455");
    }

    #[test]
    fn test_from_url() {
        let params = ConnectionParameters::from_url("wss://obs.example.com:4456").expect("parse");
        assert_eq!(params.host, "obs.example.com");
        assert_eq!(params.port, 4456);
        assert!(params.use_tls);

        let plain = ConnectionParameters::from_url("ws://[::1]:4455").expect("parse");
        assert_eq!(plain.host, "::1");
        assert!(!plain.use_tls);

        assert!(ConnectionParameters::from_url("http://obs.local:4455").is_err());
        assert!(ConnectionParameters::from_url("not a url").is_err());
    }

    #[test]
    fn test_deserialize_settings_row() {
        let json = r#"{"host":"10.0.0.5","port":4455,"password":"","use_tls":true}"#;
        let params: ConnectionParameters = serde_json::from_str(json).expect("parse");
        assert_eq!(params.host, "10.0.0.5");
        assert!(params.password.is_none());
        assert!(params.use_tls);
        assert_eq!(params.timeout, DEFAULT_TIMEOUT);

        let json = r#"{"host":"10.0.0.5","password":"x","timeout_secs":7}"#;
        let params: ConnectionParameters = serde_json::from_str(json).expect("parse");
        assert_eq!(params.port, DEFAULT_PORT);
        assert_eq!(params.password.as_deref(), Some("x"));
        assert_eq!(params.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_summary_hides_password() {
        let summary = ConnectionParameters::new("obs.local", 4455)
            .with_password("secret")
            .summary();
        assert!(summary.has_password);

        let json = serde_json::to_string(&summary).expect("serialize");
        assert!(!json.contains("secret"));
        assert!(json.contains("\"has_password\":true"));
    }

    #[test]
    fn test_summary_default() {
        let summary = SettingsSummary::default();
        assert_eq!(summary.host, DEFAULT_HOST);
        assert_eq!(summary.port, DEFAULT_PORT);
        assert!(!summary.has_password);
    }
}
