//
//  gerrit-rest
//  api/error.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Error Types for Gerrit API Operations
//!
//! This module defines the unified error type returned by every fallible
//! operation in the crate. The taxonomy separates failures by *where* they
//! occurred, because callers react to them differently:
//!
//! - [`GerritError::Transport`] - the request never produced an HTTP response
//! - [`GerritError::Status`] - the server answered with a non-success status
//! - [`GerritError::Parse`] - the server answered 2xx but the body was unusable
//!
//! The remaining variants cover construction-time failures (bad URLs, bad
//! header values, a failing credential provider, unserializable bodies).
//!
//! # Example
//!
//! ```rust
//! use gerrit_rest::GerritError;
//!
//! fn describe(err: &GerritError) -> String {
//!     match err {
//!         GerritError::Status { code, .. } if *code == 404 => "not found".to_string(),
//!         GerritError::Transport(_) => "server unreachable".to_string(),
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! # Notes
//!
//! - No error is retried inside the crate except by the capability-degrading
//!   query runner, and that retry is bounded to one resubmit per rule.
//! - Status and parse errors carry the raw response body, since a failing
//!   Gerrit instance frequently returns an HTML page where JSON was expected
//!   and the body is the only useful diagnostic.

use thiserror::Error;

/// Unified error type for all Gerrit REST operations.
///
/// Implements the standard `Error` trait via `thiserror` for ergonomic
/// propagation with the `?` operator.
#[derive(Error, Debug)]
pub enum GerritError {
    /// A network-level failure before an HTTP response was obtained.
    ///
    /// Covers connection failures, timeouts, DNS resolution errors, TLS
    /// handshake failures and other transport-layer issues. Never retried
    /// by this crate; retry policy belongs to layers that can judge it.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status code outside the success set.
    ///
    /// Carries the numeric code, the reason phrase and the raw response
    /// body for diagnostics. The query runner inspects 400-class bodies
    /// for known incompatibility signatures; every other caller should
    /// treat this as terminal.
    #[error("Request failed: {code} {reason}")]
    Status {
        /// The HTTP status code (e.g. 404).
        code: u16,
        /// The reason phrase associated with the status code.
        reason: String,
        /// The raw response body, possibly empty.
        body: String,
    },

    /// A 2xx response whose body was not usable JSON.
    ///
    /// Raised when the body fails to parse, or parses to a JSON `null`
    /// where content was required. The raw body is included because this
    /// usually means an HTML error page (e.g. an authentication redirect)
    /// was returned instead of JSON.
    #[error("Failed to parse response: {message}")]
    Parse {
        /// Description of what went wrong during parsing.
        message: String,
        /// The raw response body as received.
        body: String,
    },

    /// The request body could not be serialized to JSON.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The credential provider failed to supply an auth context.
    ///
    /// Providers may prompt interactively and are allowed to fail; the
    /// failure is surfaced here without interpretation.
    #[error("Failed to obtain credentials: {0}")]
    Credentials(#[source] anyhow::Error),

    /// A request URI could not be constructed from the configured host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (session token, credentials) was not valid HTTP.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl GerritError {
    /// Returns the HTTP status code if this is a status error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gerrit_rest::GerritError;
    ///
    /// let err = GerritError::Status {
    ///     code: 404,
    ///     reason: "Not Found".to_string(),
    ///     body: String::new(),
    /// };
    /// assert_eq!(err.status_code(), Some(404));
    /// ```
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Checks whether this error is a status error with the given code.
    pub fn is_status(&self, code: u16) -> bool {
        self.status_code() == Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = GerritError::Status {
            code: 400,
            reason: "Bad Request".to_string(),
            body: "nope".to_string(),
        };
        assert_eq!(err.status_code(), Some(400));
        assert!(err.is_status(400));
        assert!(!err.is_status(404));
    }

    #[test]
    fn test_parse_error_keeps_body() {
        let err = GerritError::Parse {
            message: "unexpected null".to_string(),
            body: "null".to_string(),
        };
        match err {
            GerritError::Parse { body, .. } => assert_eq!(body, "null"),
            _ => panic!("expected parse error"),
        }
    }
}
