//
//  gerrit-rest
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP client stack for interacting with a
//! Gerrit server's REST API.
//!
//! ## Architecture
//!
//! The layer is organized bottom-up:
//!
//! - [`transport`]: Single-round-trip HTTP execution over `reqwest`
//! - [`negotiator`]: Credential negotiation (session token vs. Basic auth)
//! - [`client`]: Verb-level REST invoker with status classification and
//!   JSON decoding
//! - [`query`]: Change query descriptors and capability degradation for
//!   older servers
//! - [`pagination`]: The page-by-page cursor over query results
//! - [`changes`]: Opaque, structurally-validated change records
//! - [`error`]: The error taxonomy shared by all of the above
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gerrit_rest::api::GerritClient;
//! use gerrit_rest::auth::{AuthData, StaticAuthProvider};
//! use gerrit_rest::config::HttpConfig;
//!
//! # async fn example() -> Result<(), gerrit_rest::GerritError> {
//! let provider = Arc::new(StaticAuthProvider::new(AuthData::anonymous(
//!     "https://gerrit.example.com",
//! )));
//! let client = GerritClient::new(provider, &HttpConfig::default())?;
//! let version = client.get_request("/config/server/version").await?;
//! # Ok(())
//! # }
//! ```

/// Core REST invoker with authentication and request handling.
pub mod client;

/// Opaque change records and decoded pages.
pub mod changes;

/// Error types for all API operations.
pub mod error;

/// Credential negotiation: session tokens and one-shot Basic auth.
pub mod negotiator;

/// Stateful pagination over change queries.
pub mod pagination;

/// Query descriptors and capability degradation.
pub mod query;

/// Single-round-trip HTTP transport.
pub mod transport;

pub use changes::{ChangePage, ChangeRecord};
pub use client::GerritClient;
pub use error::GerritError;
pub use negotiator::{CredentialNegotiator, PreparedAuth, GERRIT_AUTH_HEADER};
pub use pagination::ChangesCursor;
pub use query::{
    classify_incompatibility, ChangesQuery, DegradeAction, IncompatibilitySignatures,
    ListChangesOption, QueryRunner,
};
pub use transport::{EndpointRequest, RawResponse, Transport};
