//
//  gerrit-rest
//  api/negotiator.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Credential Negotiation for Gerrit Requests
//!
//! Gerrit instances are sometimes deployed behind a reverse proxy that
//! independently enforces HTTP authentication on the `/a` API path.
//! Sending Basic credentials on every call then produces ambiguous double
//! challenges: the same credentials cannot satisfy both the proxy and
//! Gerrit's own auth. The negotiator resolves this with a one-time
//! side-channel probe against `<host>/login/`: if the server hands out a
//! `GerritAccount` session cookie, the accompanying page body contains an
//! `xGerritAuth="…"` token which is then carried on real requests in the
//! `X-Gerrit-Auth` header instead of Basic credentials.
//!
//! When no session token can be discovered, Basic credentials are attached
//! preemptively - but only on the first request for a given host scope.
//! A server that keeps rejecting them will keep challenging; repeating the
//! same rejected credentials forever would loop, so subsequent requests for
//! an already-attempted scope attach nothing and the resulting 401
//! propagates to the caller.
//!
//! All negotiation state (probe result, attempted scopes) is scoped to one
//! [`CredentialNegotiator`] instance, which lives and dies with its
//! [`Transport`].

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, SET_COOKIE};
use reqwest::{Method, StatusCode};
use tokio::sync::Mutex;
use url::Url;

use crate::api::error::GerritError;
use crate::api::transport::{EndpointRequest, Transport};
use crate::auth::AuthData;

/// Name of the header carrying the discovered session token.
pub const GERRIT_AUTH_HEADER: &str = "X-Gerrit-Auth";

/// Name of the session cookie issued by Gerrit's login page.
const ACCOUNT_COOKIE: &str = "GerritAccount";

static AUTH_TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"xGerritAuth="([^"]+)""#).expect("token pattern must compile"));

/// Headers to attach to a request, plus any non-fatal warnings produced
/// while preparing them.
pub struct PreparedAuth {
    /// Auth-related headers for the real request. May be empty.
    pub headers: HeaderMap,
    /// Human-readable warnings (e.g. a failed login probe). The invoker
    /// logs these; they never fail the request by themselves.
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct NegotiatorState {
    probed: bool,
    session_token: Option<String>,
    attempted_scopes: HashSet<String>,
}

/// Decides, per request, which authentication headers to attach.
///
/// See the module documentation for the negotiation algorithm. One
/// negotiator instance belongs to one [`Transport`]; the pair share a
/// lifetime so auth state cannot leak across unrelated operations.
pub struct CredentialNegotiator {
    state: Mutex<NegotiatorState>,
}

impl CredentialNegotiator {
    /// Creates a negotiator with no session token and no attempted scopes.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NegotiatorState::default()),
        }
    }

    /// Prepares authentication headers for a request to `request_url`.
    ///
    /// Algorithm:
    ///
    /// 1. Without usable credentials, nothing is attached.
    /// 2. On first use, probe `<host>/login/` through the shared transport
    ///    (same cookie jar as the real request). A non-401 response with a
    ///    `GerritAccount` cookie and an `xGerritAuth="…"` body yields the
    ///    session token for this instance.
    /// 3. With a session token, attach `X-Gerrit-Auth` and no Basic auth.
    /// 4. Otherwise attach Basic credentials, but only on the first request
    ///    for this host scope; later requests for the same scope attach
    ///    nothing, deliberately letting the challenge surface instead of
    ///    retrying identical credentials forever.
    ///
    /// # Errors
    ///
    /// Returns [`GerritError::InvalidHeader`] if the token or credentials
    /// cannot be encoded as a header value. Probe transport failures do not
    /// fail the call; they degrade to a warning.
    pub async fn prepare(
        &self,
        transport: &Transport,
        auth: &AuthData,
        request_url: &Url,
    ) -> Result<PreparedAuth, GerritError> {
        let mut headers = HeaderMap::new();
        let mut warnings = Vec::new();

        if !auth.has_credentials() {
            return Ok(PreparedAuth { headers, warnings });
        }

        let mut state = self.state.lock().await;

        if !state.probed {
            state.probed = true;
            match self.probe_login(transport, auth, &mut warnings).await {
                Ok(token) => state.session_token = token,
                Err(err) => warnings.push(format!(
                    "login probe against {}/login/ failed: {}",
                    auth.host(),
                    err
                )),
            }
        }

        if let Some(token) = &state.session_token {
            headers.insert(GERRIT_AUTH_HEADER, HeaderValue::from_str(token)?);
            return Ok(PreparedAuth { headers, warnings });
        }

        let scope = scope_key(request_url);
        if state.attempted_scopes.insert(scope) {
            headers.insert(AUTHORIZATION, basic_header(auth)?);
        } else {
            tracing::debug!(url = %request_url, "credentials already offered for this scope, attaching none");
        }

        Ok(PreparedAuth { headers, warnings })
    }

    async fn probe_login(
        &self,
        transport: &Transport,
        auth: &AuthData,
        warnings: &mut Vec<String>,
    ) -> Result<Option<String>, GerritError> {
        let login_url = Url::parse(&format!("{}/login/", auth.host()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, basic_header(auth)?);

        let request = EndpointRequest::new(Method::GET, login_url).with_headers(headers);
        let response = transport.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("login probe was challenged, will use basic auth");
            return Ok(None);
        }

        if !has_account_cookie(response.headers()) {
            tracing::debug!(status = %response.status(), "login probe returned no account cookie");
            return Ok(None);
        }

        match extract_auth_token(response.body()) {
            Some(token) => {
                tracing::debug!("session token obtained from login page");
                Ok(Some(token))
            }
            None => {
                warnings.push(
                    "login page set an account cookie but no auth token could be extracted"
                        .to_string(),
                );
                Ok(None)
            }
        }
    }
}

impl Default for CredentialNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the `xGerritAuth` token from a login page body.
pub(crate) fn extract_auth_token(body: &str) -> Option<String> {
    AUTH_TOKEN_PATTERN
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

/// Whether the response headers carry a `GerritAccount` session cookie.
fn has_account_cookie(headers: &HeaderMap) -> bool {
    headers.get_all(SET_COOKIE).iter().any(|value| {
        value
            .to_str()
            .map(|cookie| cookie.trim_start().starts_with(&format!("{}=", ACCOUNT_COOKIE)))
            .unwrap_or(false)
    })
}

fn scope_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn basic_header(auth: &AuthData) -> Result<HeaderValue, GerritError> {
    let login = auth.login().unwrap_or_default();
    let password = auth.password().unwrap_or_default();
    let encoded = BASE64.encode(format!("{}:{}", login, password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))?;
    value.set_sensitive(true);
    Ok(value)
}
