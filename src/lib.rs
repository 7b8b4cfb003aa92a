//
//  gerrit-rest
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Gerrit REST Client Library
//!
//! A client library for the REST API of [Gerrit Code Review] servers,
//! focused on the mechanics that make Gerrit clients genuinely tricky to
//! get right:
//!
//! - **Dual HTTP authentication**: a Gerrit instance behind a reverse proxy
//!   may enforce HTTP auth independently of Gerrit's own. The client probes
//!   the login page once per connection, prefers the discovered session
//!   token (`X-Gerrit-Auth`) over re-sending Basic credentials, and never
//!   offers the same rejected credentials twice.
//! - **Backward-compatible degradation**: the set of supported query
//!   options and pagination parameters varies across server versions; when
//!   a server rejects a request shape with a recognizable 400, the query is
//!   narrowed and resubmitted exactly once per rule.
//! - **Stateful pagination**: result pages are fetched through a cursor
//!   that bridges offset-based and sort-key-based continuation
//!   transparently.
//!
//! [Gerrit Code Review]: https://www.gerritcodereview.com
//!
//! ## Module Structure
//!
//! - [`api`]: The HTTP client stack (transport, negotiation, invoker,
//!   queries, pagination)
//! - [`auth`]: Authentication context values and the provider trait
//! - [`config`]: Connection configuration (timeouts, proxy, TLS policy)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gerrit_rest::{AuthData, GerritClient, HttpConfig, ListChangesOption, StaticAuthProvider};
//!
//! # async fn example() -> Result<(), gerrit_rest::GerritError> {
//! let provider = Arc::new(StaticAuthProvider::new(AuthData::basic(
//!     "https://gerrit.example.com",
//!     "jdoe",
//!     "secret",
//! )));
//!
//! // One client per logical operation: the cursor takes it over.
//! let client = GerritClient::new(provider, &HttpConfig::default())?;
//! let cursor = client.query_changes(
//!     "is:open reviewer:self",
//!     [ListChangesOption::Labels, ListChangesOption::DetailedAccounts],
//!     25,
//! );
//!
//! while cursor.has_more().await {
//!     for change in cursor.fetch_next_page().await? {
//!         println!("{}", change.id().unwrap_or("<unknown>"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading Model
//!
//! The crate performs network I/O from the caller's async context and has
//! no internal executor; embedding applications own scheduling and
//! cancellation. All mutable state (session token, credential attempts,
//! cursor position) is scoped to a single client or cursor instance.

/// HTTP client stack for the Gerrit REST API.
///
/// Contains the transport, credential negotiator, REST invoker, query
/// runner and pagination cursor.
pub mod api;

/// Authentication context management.
///
/// The crate never stores credentials; an [`auth::AuthContextProvider`]
/// supplies them per request and may be backed by a settings store or an
/// interactive prompt.
pub mod auth;

/// Connection configuration.
///
/// Timeouts (default 30 seconds), proxy settings and the TLS trust policy,
/// all supplied as plain values by the embedding application.
pub mod config;

/// Re-export of the main client type.
pub use api::GerritClient;

/// Re-export of the crate error type.
pub use api::GerritError;

/// Re-export of the pagination cursor.
pub use api::ChangesCursor;

/// Re-export of the change record type.
pub use api::ChangeRecord;

/// Re-export of the query output options.
pub use api::ListChangesOption;

/// Re-export of the authentication context value and providers.
pub use auth::{AuthContextProvider, AuthData, StaticAuthProvider};

/// Re-export of the connection configuration.
pub use config::HttpConfig;

/// Library name constant, used in the `User-Agent` header.
pub const APP_NAME: &str = "gerrit-rest";

/// Library version, derived from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the `User-Agent` value identifying this client.
///
/// When a caller supplies its own `User-Agent`, the client chains it after
/// this value instead of discarding either.
///
/// # Example
///
/// ```rust
/// let agent = gerrit_rest::user_agent();
/// assert!(agent.starts_with("gerrit-rest/"));
/// ```
pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, VERSION)
}
