//
//  gerrit-rest
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client Wrapper for the Gerrit REST API
//!
//! This module provides the core client for talking to a Gerrit server.
//! It turns a path like `/changes/?q=is:open` into an authenticated HTTP
//! call and a decoded JSON value, handling:
//!
//! - The `/a` authenticated-API path prefix (applied whenever usable
//!   credentials are configured, per Gerrit's convention)
//! - Credential negotiation (session token vs. Basic auth, delegated to
//!   [`CredentialNegotiator`](crate::api::CredentialNegotiator))
//! - Standard headers (`Accept: application/json`, a chained `User-Agent`)
//! - Status classification and JSON body parsing, including Gerrit's
//!   `)]}'` cross-site-script-inclusion guard prefix
//!
//! ## Instance Lifetime
//!
//! A client owns one transport and one negotiator, which hold the session
//! cookie and the credential-attempt record. Create one client per logical
//! operation (one page load, one review submission) so that auth state
//! never leaks across unrelated operations; [`GerritClient::query_changes`]
//! enforces this by consuming the client.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gerrit_rest::{AuthData, GerritClient, HttpConfig, StaticAuthProvider};
//!
//! # async fn example() -> Result<(), gerrit_rest::GerritError> {
//! let provider = Arc::new(StaticAuthProvider::new(AuthData::basic(
//!     "https://gerrit.example.com",
//!     "jdoe",
//!     "secret",
//! )));
//! let client = GerritClient::new(provider, &HttpConfig::default())?;
//!
//! if let Some(account) = client.get_request("/accounts/self").await? {
//!     println!("logged in as {}", account["name"]);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::error::GerritError;
use crate::api::negotiator::CredentialNegotiator;
use crate::api::pagination::ChangesCursor;
use crate::api::query::{ChangesQuery, ListChangesOption, QueryRunner};
use crate::api::transport::{EndpointRequest, RawResponse, Transport};
use crate::auth::{AuthContextProvider, AuthData};
use crate::config::HttpConfig;

/// Gerrit prepends this guard to every JSON response body.
const XSSI_GUARD: &str = ")]}'";

/// Status codes treated as success by the invoker.
const SUCCESS_CODES: [u16; 4] = [200, 201, 202, 204];

/// The main client for issuing REST calls against one Gerrit server.
///
/// See the module documentation for lifetime conventions. All verb methods
/// return `Option<Value>`: `None` means the server sent no entity (e.g. a
/// 204), which callers must treat as distinct from an empty JSON object.
pub struct GerritClient {
    auth: Arc<dyn AuthContextProvider>,
    transport: Transport,
    negotiator: CredentialNegotiator,
}

impl GerritClient {
    /// Creates a client with a fresh transport and negotiator.
    ///
    /// # Parameters
    ///
    /// * `auth` - Supplies the host and credentials, consulted per request.
    /// * `config` - Connection parameters for the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        auth: Arc<dyn AuthContextProvider>,
        config: &HttpConfig,
    ) -> Result<Self, GerritError> {
        Ok(Self {
            auth,
            transport: Transport::new(config)?,
            negotiator: CredentialNegotiator::new(),
        })
    }

    /// Makes an HTTP GET request to the specified path.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(value))` with the decoded JSON body, or `Ok(None)`
    /// when the response carried no entity.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::Status`] for non-success codes,
    /// [`GerritError::Parse`] for unusable 2xx bodies and
    /// [`GerritError::Transport`] for network failures.
    pub async fn get_request(&self, path: &str) -> Result<Option<Value>, GerritError> {
        self.request(Method::GET, path, None, HeaderMap::new()).await
    }

    /// Makes an HTTP POST request with a JSON body to the specified path.
    ///
    /// # Type Parameters
    ///
    /// * `B` - The request body type, serialized to JSON.
    pub async fn post_request<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<Value>, GerritError> {
        let body = serde_json::to_string(body)?;
        self.request(Method::POST, path, Some(body), HeaderMap::new())
            .await
    }

    /// Makes an HTTP PUT request to the specified path.
    pub async fn put_request(&self, path: &str) -> Result<Option<Value>, GerritError> {
        self.request(Method::PUT, path, None, HeaderMap::new()).await
    }

    /// Makes an HTTP DELETE request to the specified path.
    pub async fn delete_request(&self, path: &str) -> Result<Option<Value>, GerritError> {
        self.request(Method::DELETE, path, None, HeaderMap::new())
            .await
    }

    /// Makes an HTTP HEAD request to the specified path.
    ///
    /// Succeeds for any status in the success set; there is never a body.
    pub async fn head_request(&self, path: &str) -> Result<(), GerritError> {
        self.request(Method::HEAD, path, None, HeaderMap::new())
            .await
            .map(|_| ())
    }

    /// Makes a request with an explicit method, body and extra headers.
    ///
    /// This is the general form behind the verb methods. Caller-supplied
    /// headers are attached after the standard set; a caller `User-Agent`
    /// is chained into the client's own rather than replacing it.
    ///
    /// # Parameters
    ///
    /// * `method` - The HTTP verb.
    /// * `path` - Path relative to the server root, with or without a
    ///   leading slash. The `/a` prefix is applied automatically when
    ///   credentials are configured.
    /// * `body` - Optional serialized JSON body.
    /// * `headers` - Additional headers for this request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        headers: HeaderMap,
    ) -> Result<Option<Value>, GerritError> {
        let auth = self
            .auth
            .auth_data()
            .await
            .map_err(GerritError::Credentials)?;
        let url = build_url(&auth, path)?;

        let prepared = self.negotiator.prepare(&self.transport, &auth, &url).await?;
        for warning in &prepared.warnings {
            tracing::warn!("{}", warning);
        }

        let mut all_headers = standard_headers(&headers)?;
        all_headers.extend(prepared.headers);

        let mut request = EndpointRequest::new(method, url).with_headers(all_headers);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self.transport.execute(request).await?;
        classify_and_parse(response)
    }

    /// Starts a paginated changes query.
    ///
    /// Wires a fresh capability-degrading runner and pagination cursor for
    /// one logical browsing session. Consumes the client: the cursor and
    /// its auth state live exactly as long as the query.
    ///
    /// # Parameters
    ///
    /// * `query` - Free-text change query (e.g. `is:open`).
    /// * `options` - Output options to request for each change.
    /// * `page_size` - Number of records fetched per page.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use gerrit_rest::{AuthData, GerritClient, HttpConfig, ListChangesOption, StaticAuthProvider};
    ///
    /// # async fn example() -> Result<(), gerrit_rest::GerritError> {
    /// let provider = Arc::new(StaticAuthProvider::new(AuthData::anonymous(
    ///     "https://gerrit.example.com",
    /// )));
    /// let client = GerritClient::new(provider, &HttpConfig::default())?;
    ///
    /// let cursor = client.query_changes("is:open", [ListChangesOption::Labels], 25);
    /// while cursor.has_more().await {
    ///     for change in cursor.fetch_next_page().await? {
    ///         println!("{:?}", change.id());
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn query_changes(
        self,
        query: impl Into<String>,
        options: impl IntoIterator<Item = ListChangesOption>,
        page_size: u32,
    ) -> ChangesCursor {
        let descriptor = ChangesQuery::new(query, options, page_size);
        ChangesCursor::new(QueryRunner::new(self), descriptor)
    }
}

fn build_url(auth: &AuthData, path: &str) -> Result<Url, GerritError> {
    let prefix = if auth.has_credentials() { "/a" } else { "" };
    let separator = if path.starts_with('/') { "" } else { "/" };
    Ok(Url::parse(&format!(
        "{}{}{}{}",
        auth.host(),
        prefix,
        separator,
        path
    ))?)
}

fn standard_headers(extra: &HeaderMap) -> Result<HeaderMap, GerritError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let agent = match extra.get(USER_AGENT).and_then(|value| value.to_str().ok()) {
        Some(existing) => format!("{} using {}", crate::user_agent(), existing),
        None => crate::user_agent(),
    };
    headers.insert(USER_AGENT, HeaderValue::from_str(&agent)?);

    for (name, value) in extra {
        if *name != USER_AGENT {
            headers.append(name.clone(), value.clone());
        }
    }

    Ok(headers)
}

fn classify_and_parse(response: RawResponse) -> Result<Option<Value>, GerritError> {
    let code = response.status().as_u16();
    if !SUCCESS_CODES.contains(&code) {
        return Err(GerritError::Status {
            code,
            reason: response.reason().to_string(),
            body: response.body().to_string(),
        });
    }

    if !response.has_body() {
        return Ok(None);
    }

    let text = strip_xssi_guard(response.body());
    let value: Value = serde_json::from_str(text).map_err(|err| GerritError::Parse {
        message: err.to_string(),
        body: response.body().to_string(),
    })?;

    if value.is_null() {
        return Err(GerritError::Parse {
            message: "response body was JSON null where content was expected".to_string(),
            body: response.body().to_string(),
        });
    }

    Ok(Some(value))
}

fn strip_xssi_guard(body: &str) -> &str {
    body.strip_prefix(XSSI_GUARD).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuthProvider;
    use mockito::Matcher;
    use serde_json::json;

    fn anonymous_client(server: &mockito::Server) -> GerritClient {
        let provider = Arc::new(StaticAuthProvider::new(AuthData::anonymous(server.url())));
        GerritClient::new(provider, &HttpConfig::default()).unwrap()
    }

    fn authenticated_client(server: &mockito::Server) -> GerritClient {
        let provider = Arc::new(StaticAuthProvider::new(AuthData::basic(
            server.url(),
            "user",
            "secret",
        )));
        GerritClient::new(provider, &HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_success_codes_return_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/changes/42/reviewed")
            .with_status(201)
            .with_body(r#")]}'{"status": "reviewed"}"#)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let value = client.put_request("/changes/42/reviewed").await.unwrap();
        assert_eq!(value, Some(json!({"status": "reviewed"})));
    }

    #[tokio::test]
    async fn test_failure_status_carries_code_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/changes/missing")
            .with_status(404)
            .with_body("Not found: missing")
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let err = client.get_request("/changes/missing").await.unwrap_err();
        match err {
            GerritError::Status { code, body, .. } => {
                assert_eq!(code, 404);
                assert_eq!(body, "Not found: missing");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_entity_yields_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/changes/42/topic")
            .with_status(204)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let value = client.delete_request("/changes/42/topic").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_json_null_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accounts/self")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let err = client.get_request("/accounts/self").await.unwrap_err();
        match err {
            GerritError::Parse { body, .. } => assert_eq!(body, "null"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_html_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/accounts/self")
            .with_status(200)
            .with_body("<html>login required</html>")
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let err = client.get_request("/accounts/self").await.unwrap_err();
        match err {
            GerritError::Parse { body, .. } => assert!(body.contains("login required")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_xssi_guard_is_stripped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/config/server/version")
            .with_status(200)
            .with_body(")]}'\n\"2.16.3\"")
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let value = client.get_request("/config/server/version").await.unwrap();
        assert_eq!(value, Some(json!("2.16.3")));
    }

    #[tokio::test]
    async fn test_authenticated_requests_use_prefix() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/login/")
            .with_status(401)
            .create_async()
            .await;
        let api = server
            .mock("GET", "/a/accounts/self")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(r#")]}'{"_account_id": 1000}"#)
            .expect(1)
            .create_async()
            .await;

        let client = authenticated_client(&server);
        let value = client.get_request("/accounts/self").await.unwrap();
        assert_eq!(value, Some(json!({"_account_id": 1000})));
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_session_token_rides_real_requests() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/login/")
            .with_status(200)
            .with_header("Set-Cookie", "GerritAccount=abc123; Path=/; HttpOnly")
            .with_body(r#"<script>xGerritAuth="tok123"</script>"#)
            .create_async()
            .await;
        let api = server
            .mock("GET", "/a/changes/")
            .match_header("x-gerrit-auth", "tok123")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(")]}'[]")
            .expect(1)
            .create_async()
            .await;

        let client = authenticated_client(&server);
        client.get_request("/changes/").await.unwrap();
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_anonymous_requests_skip_prefix() {
        let mut server = mockito::Server::new_async().await;
        let api = server
            .mock("GET", "/changes/")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        client.get_request("/changes/").await.unwrap();
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_user_agent_is_chained() {
        let mut server = mockito::Server::new_async().await;
        let api = server
            .mock("GET", "/projects/")
            .match_header(
                "user-agent",
                Matcher::Regex(format!("^{} using host-app/2.1$", crate::user_agent())),
            )
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("host-app/2.1"));
        client
            .request(Method::GET, "/projects/", None, headers)
            .await
            .unwrap();
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_serializes_body() {
        let mut server = mockito::Server::new_async().await;
        let api = server
            .mock("POST", "/changes/42/revisions/current/review")
            .match_body(Matcher::Json(json!({"message": "LGTM", "labels": {"Code-Review": 2}})))
            .with_status(200)
            .with_body(r#")]}'{"labels": {"Code-Review": 2}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        let review = json!({"message": "LGTM", "labels": {"Code-Review": 2}});
        let value = client
            .post_request("/changes/42/revisions/current/review", &review)
            .await
            .unwrap();
        assert!(value.is_some());
        api.assert_async().await;
    }

    #[tokio::test]
    async fn test_head_request_has_no_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/changes/42")
            .with_status(200)
            .create_async()
            .await;

        let client = anonymous_client(&server);
        client.head_request("/changes/42").await.unwrap();
    }

    #[test]
    fn test_build_url_prefix_rules() {
        let anonymous = AuthData::anonymous("http://gerrit.example.com");
        let authed = AuthData::basic("http://gerrit.example.com/", "u", "p");

        assert_eq!(
            build_url(&anonymous, "/changes/").unwrap().as_str(),
            "http://gerrit.example.com/changes/"
        );
        assert_eq!(
            build_url(&authed, "/changes/").unwrap().as_str(),
            "http://gerrit.example.com/a/changes/"
        );
        assert_eq!(
            build_url(&authed, "changes/").unwrap().as_str(),
            "http://gerrit.example.com/a/changes/"
        );
    }
}
