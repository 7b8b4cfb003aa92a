//
//  gerrit-rest
//  api/transport.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Transport Layer for Gerrit HTTP Requests
//!
//! The transport performs exactly one network round trip per call: no
//! retries and no interpretation of the status code. It
//! owns the cookie jar, so a session cookie obtained by the credential
//! negotiator's login probe is automatically replayed on later requests
//! made through the same [`Transport`] instance.
//!
//! Because the cookie jar and the negotiator's auth state are scoped to one
//! instance, a `Transport` is meant to live for one logical operation (one
//! page load, one review submission) rather than be shared application-wide.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use url::Url;

use crate::api::error::GerritError;
use crate::config::{HttpConfig, TrustPolicy};

/// A fully-formed HTTP request, immutable once built.
///
/// Created per call and discarded after response handling.
#[derive(Debug)]
pub struct EndpointRequest {
    method: Method,
    url: Url,
    body: Option<String>,
    headers: HeaderMap,
}

impl EndpointRequest {
    /// Creates a request with no body and no headers.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Attaches a serialized JSON body.
    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Merges the given headers into the request's header set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// A raw HTTP response: status, headers and the full body text.
#[derive(Debug)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl RawResponse {
    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase for the status code, or "Unknown".
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body text, possibly empty.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the response carried a non-blank entity.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// Executes single HTTP requests against a Gerrit server.
///
/// Wraps one `reqwest::Client` configured from an [`HttpConfig`]: cookie
/// store enabled, timeouts, optional proxy, TLS trust policy. Failure at
/// this layer (I/O, TLS, malformed HTTP) surfaces as
/// [`GerritError::Transport`] and is never retried here.
pub struct Transport {
    http: Client,
}

impl Transport {
    /// Builds a transport from connection configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::Transport`] if the underlying HTTP client
    /// cannot be constructed (e.g. an unusable proxy URL).
    pub fn new(config: &HttpConfig) -> Result<Self, GerritError> {
        let mut builder = Client::builder()
            .user_agent(crate::user_agent())
            .cookie_store(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        if let Some(proxy) = &config.proxy {
            let mut configured = reqwest::Proxy::all(proxy.url())?;
            if let (Some(login), Some(password)) = (&proxy.login, &proxy.password) {
                configured = configured.basic_auth(login, password);
            }
            builder = builder.proxy(configured);
        }

        if config.trust == TrustPolicy::AcceptInvalidCerts {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Performs exactly one network round trip.
    ///
    /// The response body is read to completion so callers always see a
    /// complete `RawResponse`; status interpretation is left to them.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::Transport`] for any failure before a complete
    /// response was obtained.
    pub async fn execute(&self, request: EndpointRequest) -> Result<RawResponse, GerritError> {
        let EndpointRequest {
            method,
            url,
            body,
            headers,
        } = request;

        tracing::debug!(%method, %url, "executing request");

        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(%status, bytes = body.len(), "received response");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
