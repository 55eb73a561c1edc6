//! The TonicPow API client and its session operations.
//!
//! # Design
//! `Client` owns its configuration, a `Transport`, the application session
//! token and the diagnostics of the last round trip. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` without any
//! I/O and an executing method that sends it, checks the one status code
//! the endpoint documents for success, and decodes the body.
//!
//! Every executing method takes `&mut self`: each call rewrites
//! `last_request` and may refresh the session token. Callers that share a
//! client between threads wrap it in a lock.
//!
//! Resource operations live next to their types in `goals`, `users`,
//! `campaigns` and `conversions`; this module holds the shared plumbing.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, REDACTED};
use crate::error::{ApiError, ApiErrorBody};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, API_KEY_HEADER, SESSION_COOKIE};
use crate::transport::{Transport, UreqTransport};

pub(crate) const STATUS_OK: u16 = 200;
pub(crate) const STATUS_CREATED: u16 = 201;

/// Diagnostics for the most recent round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastRequest {
    pub method: String,
    pub url: String,
    /// `0` when the transport failed before a response arrived.
    pub status_code: u16,
    pub post_data: Option<String>,
    /// Decoded error body when the status was not the expected one.
    pub error: Option<ApiErrorBody>,
}

/// Whose session a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionScope {
    /// The client's own session; a `session_token` cookie in the response
    /// replaces the stored token.
    Application,
    /// A caller-supplied user session or a login; the stored token is left
    /// alone.
    User,
}

impl SessionScope {
    pub(crate) fn for_token(user_session_token: Option<&str>) -> Self {
        match user_session_token {
            Some(token) if !token.is_empty() => SessionScope::User,
            _ => SessionScope::Application,
        }
    }
}

/// Synchronous client for the TonicPow API.
pub struct Client<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    session_token: Option<String>,
    last_request: LastRequest,
}

impl<T: fmt::Debug> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("session_token", &self.session_token.as_ref().map(|_| REDACTED))
            .field("last_request", &self.last_request)
            .finish()
    }
}

impl Client<UreqTransport> {
    /// Create a client over the default ureq transport without opening a
    /// session.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }

    /// Create a client and open an application session right away.
    ///
    /// # Errors
    ///
    /// Returns the error from `create_session` if the API rejects the key.
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let mut client = Self::new(config);
        client.create_session()?;
        Ok(client)
    }

    /// `connect` using configuration from `TONICPOW_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` for a bad environment, otherwise the
    /// error from `create_session`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::connect(ClientConfig::from_env()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            session_token: None,
            last_request: LastRequest::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The application session token, if a session is open.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Adopt a session token obtained elsewhere, or drop the current one.
    pub fn set_session_token(&mut self, token: Option<String>) {
        self.session_token = token.filter(|t| !t.is_empty());
    }

    pub fn last_request(&self) -> &LastRequest {
        &self.last_request
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    /// Absolute URL for an endpoint path such as `goals/details/3`.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url(), endpoint.trim_start_matches('/'))
    }

    /// Assemble a request with the API key, user agent, session cookie and
    /// an optional JSON body. `user_session_token` overrides the client's own
    /// session for this request only.
    pub(crate) fn build_request(
        &self,
        method: HttpMethod,
        url: String,
        body: Option<String>,
        user_session_token: Option<&str>,
    ) -> HttpRequest {
        let mut headers = vec![
            (API_KEY_HEADER.to_string(), self.config.api_key.clone()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
        ];

        let token = user_session_token
            .filter(|t| !t.is_empty())
            .or(self.session_token.as_deref());
        if let Some(token) = token {
            headers.push(("cookie".to_string(), format!("{SESSION_COOKIE}={token}")));
        }

        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        HttpRequest {
            method,
            path: url,
            headers,
            body,
        }
    }

    /// Execute `request`, record it, and fail unless the status is `expected`.
    pub(crate) fn round_trip(
        &mut self,
        request: &HttpRequest,
        expected: u16,
        scope: SessionScope,
    ) -> Result<HttpResponse, ApiError> {
        let target = without_query(&request.path);
        debug!(method = %request.method, url = target, "sending request");
        self.last_request = LastRequest {
            method: request.method.to_string(),
            url: request.path.clone(),
            status_code: 0,
            post_data: request.body.clone(),
            error: None,
        };

        let response = self.transport.execute(request)?;
        self.last_request.status_code = response.status;
        debug!(status = response.status, url = target, "received response");

        if scope == SessionScope::Application {
            if let Some(token) = response.session_cookie() {
                self.set_session_token(Some(token.to_string()));
            }
        }

        if let Err(err) = check_status(&response, expected) {
            warn!(
                status = response.status,
                expected,
                url = target,
                error = %err,
                "unexpected response status"
            );
            self.last_request.error = err.api_error().cloned();
            return Err(err);
        }
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub fn build_create_session(&self) -> HttpRequest {
        self.build_request(HttpMethod::Post, self.url("auth/session"), None, None)
    }

    pub fn build_prolong_session(&self, user_session_token: Option<&str>) -> HttpRequest {
        self.build_request(HttpMethod::Get, self.url("auth/session"), None, user_session_token)
    }

    pub fn build_end_session(&self, user_session_token: Option<&str>) -> HttpRequest {
        self.build_request(HttpMethod::Delete, self.url("auth/session"), None, user_session_token)
    }

    /// Open an application session with the API key. The token arrives in a
    /// `session_token` cookie and is kept for later requests.
    ///
    /// # Errors
    ///
    /// Fails unless the API answers 201.
    pub fn create_session(&mut self) -> Result<(), ApiError> {
        let request = self.build_create_session();
        self.round_trip(&request, STATUS_CREATED, SessionScope::Application)?;
        if self.session_token.is_none() {
            warn!("session created but no session cookie was returned");
        } else {
            info!(environment = %self.config.environment, "api session created");
        }
        Ok(())
    }

    /// Extend the application session, or a user's session when a token is
    /// given.
    ///
    /// # Errors
    ///
    /// Fails unless the API answers 200.
    pub fn prolong_session(&mut self, user_session_token: Option<&str>) -> Result<(), ApiError> {
        let request = self.build_prolong_session(user_session_token);
        self.round_trip(&request, STATUS_OK, SessionScope::for_token(user_session_token))?;
        Ok(())
    }

    /// End the application session (clearing the stored token), or a user's
    /// session when a token is given.
    ///
    /// # Errors
    ///
    /// Fails unless the API answers 200.
    pub fn end_session(&mut self, user_session_token: Option<&str>) -> Result<(), ApiError> {
        let scope = SessionScope::for_token(user_session_token);
        let request = self.build_end_session(user_session_token);
        self.round_trip(&request, STATUS_OK, scope)?;
        if scope == SessionScope::Application {
            self.session_token = None;
            info!("api session ended");
        }
        Ok(())
    }
}

/// The URL without its query string, which may carry an email address.
fn without_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// Serialize a request payload.
pub(crate) fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Decode a successful response body.
pub(crate) fn decode<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map a status other than `expected` to an error.
///
/// A body in the API's error shape with a non-empty `message` becomes
/// `ApiError::Api`; anything else keeps the raw body in
/// `ApiError::HttpError`.
pub fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    match serde_json::from_str::<ApiErrorBody>(&response.body) {
        Ok(error) if !error.message.is_empty() => Err(ApiError::Api {
            status: response.status,
            error,
        }),
        _ => Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        }),
    }
}

/// Check the status and decode the body of a response produced outside the
/// client, e.g. by a host that executed a `build_*` request itself.
///
/// # Errors
///
/// Returns the `check_status` error, or `DeserializationError` if the body
/// does not match `R`.
pub fn parse_response<R: DeserializeOwned>(
    response: &HttpResponse,
    expected: u16,
) -> Result<R, ApiError> {
    check_status(response, expected)?;
    decode(response)
}
