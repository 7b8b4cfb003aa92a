//
//  gerrit-rest
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Context Module
//!
//! This module defines the authentication context consumed by the REST
//! client: which Gerrit host to talk to and, optionally, which credentials
//! to offer it. The crate never stores or persists credentials itself; an
//! [`AuthContextProvider`] supplies a fresh [`AuthData`] value for every
//! request.
//!
//! ## Provider Semantics
//!
//! A provider may be backed by anything: a settings store, a keyring, or an
//! interactive prompt that asks the user for a password the first time one
//! is needed. The client therefore treats `auth_data()` as a possibly-slow,
//! possibly-failing call and never assumes it is instantaneous.
//!
//! ## Example
//!
//! ```rust
//! use gerrit_rest::auth::{AuthData, StaticAuthProvider};
//!
//! let anonymous = AuthData::anonymous("https://gerrit.example.com");
//! assert!(!anonymous.has_credentials());
//!
//! let authenticated = AuthData::basic("https://gerrit.example.com/", "jdoe", "secret");
//! assert!(authenticated.has_credentials());
//! assert_eq!(authenticated.host(), "https://gerrit.example.com");
//!
//! let provider = StaticAuthProvider::new(authenticated);
//! ```

use anyhow::Result;
use async_trait::async_trait;

/// Authentication context for one Gerrit host.
///
/// An immutable value: the client reads it per request and never mutates
/// or persists it. Credentials are considered usable only when both login
/// and password are present and non-empty.
#[derive(Debug, Clone)]
pub struct AuthData {
    host: String,
    login: Option<String>,
    password: Option<String>,
}

impl AuthData {
    /// Creates an anonymous context for the given host.
    ///
    /// Requests built from this context carry no credentials and go to the
    /// unauthenticated API paths.
    pub fn anonymous(host: impl Into<String>) -> Self {
        Self {
            host: normalize_host(host.into()),
            login: None,
            password: None,
        }
    }

    /// Creates a context with login and password for the given host.
    ///
    /// The host URL is normalized (trailing slashes removed) so request
    /// URIs can be built by simple concatenation.
    pub fn basic(
        host: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: normalize_host(host.into()),
            login: Some(login.into()),
            password: Some(password.into()),
        }
    }

    /// The Gerrit host URL, without a trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The configured login, if any.
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    /// The configured password, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Whether this context carries usable credentials.
    ///
    /// Both login and password must be present and non-empty. This predicate
    /// decides whether requests use the authenticated `/a` path prefix and
    /// whether the credential negotiation runs at all.
    pub fn has_credentials(&self) -> bool {
        matches!((&self.login, &self.password), (Some(l), Some(p)) if !l.is_empty() && !p.is_empty())
    }
}

fn normalize_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

/// Supplies the authentication context on demand.
///
/// Implementations may prompt a user interactively the first time a
/// password is needed; callers must treat this as a possibly-slow,
/// possibly-failing operation.
#[async_trait]
pub trait AuthContextProvider: Send + Sync {
    /// Returns the current authentication context.
    async fn auth_data(&self) -> Result<AuthData>;
}

/// A provider that always returns the same fixed context.
///
/// Useful for tests and for applications whose credentials are known up
/// front.
pub struct StaticAuthProvider {
    data: AuthData,
}

impl StaticAuthProvider {
    /// Wraps a fixed [`AuthData`] value.
    pub fn new(data: AuthData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl AuthContextProvider for StaticAuthProvider {
    async fn auth_data(&self) -> Result<AuthData> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_normalization() {
        let auth = AuthData::anonymous("https://gerrit.example.com///");
        assert_eq!(auth.host(), "https://gerrit.example.com");
    }

    #[test]
    fn test_has_credentials() {
        assert!(AuthData::basic("http://h", "user", "pass").has_credentials());
        assert!(!AuthData::basic("http://h", "user", "").has_credentials());
        assert!(!AuthData::basic("http://h", "", "pass").has_credentials());
        assert!(!AuthData::anonymous("http://h").has_credentials());
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticAuthProvider::new(AuthData::basic("http://h", "u", "p"));
        let data = provider.auth_data().await.unwrap();
        assert_eq!(data.login(), Some("u"));
        assert!(data.has_credentials());
    }
}
