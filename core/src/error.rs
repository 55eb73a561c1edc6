//! Error types for the TonicPow API client.
//!
//! # Design
//! Validation failures (`MissingField`) are raised before any request is
//! built, so they never touch the network. A response with an unexpected
//! status becomes `Api` when its body decodes into the API's error shape,
//! and `HttpError` with the raw body otherwise.

use serde::{Deserialize, Serialize};

/// Error body returned by the API alongside a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub code: i64,
    pub message: String,
    /// Free-form detail; usually a string, sometimes an object.
    pub data: serde_json::Value,
    pub method: String,
    pub url: String,
    pub ip_address: String,
    pub request_guid: String,
    pub status_code: u16,
}

/// Errors returned by `Client` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field was zero or empty; no request was sent.
    #[error("missing required attribute: {0}")]
    MissingField(&'static str),

    /// The server returned an unexpected status with a structured error body.
    #[error("api error ({status}): {}", .error.message)]
    Api { status: u16, error: ApiErrorBody },

    /// The server returned an unexpected status and the body was not an
    /// API error.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The transport could not complete the round trip.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A login or session call succeeded without setting a session cookie.
    #[error("response did not include a session token")]
    MissingSessionToken,

    /// Invalid or missing client configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Status code of the failed response, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The decoded API error body, when the server sent one.
    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        match self {
            ApiError::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}
