//
//  gerrit-rest
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Configuration Module
//!
//! Connection parameters for the underlying HTTP client: timeouts, an
//! optional proxy, and the TLS trust policy. These values are supplied by
//! the embedding application; the crate itself never reads configuration
//! files or prompts the user.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use gerrit_rest::config::{HttpConfig, ProxySettings, TrustPolicy};
//!
//! let config = HttpConfig::default()
//!     .with_request_timeout(Duration::from_secs(10))
//!     .with_proxy(ProxySettings::new("proxy.example.com", 3128))
//!     .with_trust(TrustPolicy::SystemRoots);
//! ```

use std::time::Duration;

/// Default connect/request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy connection settings.
///
/// Credentials are optional; when both `login` and `password` are present
/// they are sent as proxy Basic authentication.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Proxy host name or address.
    pub host: String,
    /// Proxy port.
    pub port: u16,
    /// Optional proxy login.
    pub login: Option<String>,
    /// Optional proxy password.
    pub password: Option<String>,
}

impl ProxySettings {
    /// Creates proxy settings without credentials.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            login: None,
            password: None,
        }
    }

    /// Adds proxy credentials.
    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the proxy URL in `http://host:port` form.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// TLS certificate trust policy.
///
/// An interactive "accept this self-signed certificate?" decision is the
/// embedding application's concern; its outcome arrives here as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Validate server certificates against the system root store.
    #[default]
    SystemRoots,
    /// Accept any certificate, including self-signed ones.
    AcceptInvalidCerts,
}

/// Connection configuration for a [`Transport`](crate::api::Transport).
///
/// All fields have usable defaults: 30 second timeouts, no proxy, system
/// certificate roots.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Total timeout for a request, from connect to the end of the body.
    pub request_timeout: Duration,
    /// Optional proxy settings.
    pub proxy: Option<ProxySettings>,
    /// TLS trust policy.
    pub trust: TrustPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            request_timeout: DEFAULT_TIMEOUT,
            proxy: None,
            trust: TrustPolicy::default(),
        }
    }
}

impl HttpConfig {
    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the proxy.
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the TLS trust policy.
    pub fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.proxy.is_none());
        assert_eq!(config.trust, TrustPolicy::SystemRoots);
    }

    #[test]
    fn test_proxy_url() {
        let proxy = ProxySettings::new("proxy.example.com", 3128);
        assert_eq!(proxy.url(), "http://proxy.example.com:3128");
    }

    #[test]
    fn test_builder_chain() {
        let config = HttpConfig::default()
            .with_request_timeout(Duration::from_secs(5))
            .with_trust(TrustPolicy::AcceptInvalidCerts);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.trust, TrustPolicy::AcceptInvalidCerts);
    }
}
