//! Error types for recharge-tap
//!
//! This module defines the error hierarchy for the entire tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use serde_json::Value;
use thiserror::Error;

/// The main error type for recharge-tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An error response from the Recharge API, mapped onto the documented
    /// status-code taxonomy.
    #[error("HTTP-error-code: {status}, Error: {message}")]
    Api {
        status: u16,
        kind: ApiErrorKind,
        message: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Invalid replication key value '{value}' for stream '{stream}'")]
    ReplicationKey { stream: String, value: String },

    // ============================================================================
    // State / Catalog Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Stream '{stream}' not found in the stream table")]
    StreamNotFound { stream: String },

    #[error("No schema embedded for stream '{stream}'")]
    SchemaNotFound { stream: String },

    // ============================================================================
    // Business-Rule Errors
    // ============================================================================
    /// Raised after an otherwise successful run when a deprecated stream was
    /// part of the selection. Replication has already completed and
    /// checkpointed by the time this surfaces.
    #[error("{message}")]
    DeprecatedStream { stream: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Kinds of Recharge API errors, one per documented status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    PaymentRequired,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    UnsupportedMediaType,
    UnprocessableEntity,
    InvalidApiVersion,
    RateLimited,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
    /// Any other >= 500
    Server,
    /// Any other < 500
    Client,
}

impl ApiErrorKind {
    /// Map a status code onto its error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            402 => Self::PaymentRequired,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            406 => Self::NotAcceptable,
            409 => Self::Conflict,
            415 => Self::UnsupportedMediaType,
            422 => Self::UnprocessableEntity,
            426 => Self::InvalidApiVersion,
            429 => Self::RateLimited,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            503 => Self::ServiceUnavailable,
            s if s >= 500 => Self::Server,
            _ => Self::Client,
        }
    }

    /// The operator-facing message used when the response body carries none
    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "The request was not understood by Recharge.",
            Self::Unauthorized => "The request was not able to be authenticated.",
            Self::PaymentRequired => {
                "The request to the resource failed because of Payment issue."
            }
            Self::Forbidden => {
                "The request was authenticated but not authorized for the requested resource \
                 (Permission scope error)."
            }
            Self::NotFound => "The requested resource was not found.",
            Self::MethodNotAllowed => "The provided HTTP method is not supported by the URL.",
            Self::NotAcceptable => {
                "The request was unacceptable, or requesting a data source which is not allowed \
                 although permissions permit the request."
            }
            Self::Conflict => {
                "The request is in conflict, or would create a conflict with an existing resource."
            }
            Self::UnsupportedMediaType => "The request body was not a JSON object.",
            Self::UnprocessableEntity => {
                "The request was understood but cannot be processed due to invalid or missing \
                 supplemental information."
            }
            Self::InvalidApiVersion => "The request was made using an invalid API version.",
            Self::RateLimited => "The request has been rate limited.",
            Self::InternalServerError => {
                "The request could not be processed due to internal server error."
            }
            Self::NotImplemented => {
                "The resource requested has not been implemented in the current version."
            }
            Self::ServiceUnavailable => {
                "A third party service on which the request depends has timed out."
            }
            Self::Server | Self::Client => "Unknown Error",
        }
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Build an API error from a status code and the (possibly absent or
    /// non-JSON) response body. A body-supplied `error`/`errors` field takes
    /// precedence over the documented default message.
    pub fn api(status: u16, body: Option<&Value>) -> Self {
        let kind = ApiErrorKind::from_status(status);
        let message = body
            .and_then(extract_api_message)
            .unwrap_or_else(|| kind.default_message().to_string());
        Self::Api {
            status,
            kind,
            message,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Pull the API-supplied message out of an error body, if any
fn extract_api_message(body: &Value) -> Option<String> {
    let value = body.get("error").or_else(|| body.get("errors"))?;
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Result type alias for recharge-tap
pub type Result<T> = std::result::Result<T, Error>;
