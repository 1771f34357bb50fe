//! Error types for the API client, storage and configuration.
//!
//! # Design
//! `ApiError` mirrors the failure taxonomy callers branch on: one variant per
//! status class that triggers a distinct side effect, plus the "unexpected"
//! variants for failures that never reached the server or could not be
//! decoded. Status-carrying variants keep the parsed `ErrorPayload` so hooks
//! can surface the server's own message.

use crate::http::HttpResponse;
use crate::types::ErrorPayload;

/// Fallback shown when an error carries no usable text.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Errors raised by a [`Transport`](crate::transport::Transport) when no
/// response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failed: {0}")]
    Other(String),
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response reached the client (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// 401: the stored session is no longer valid.
    #[error("Request failed with status code 401")]
    Unauthorized(ErrorPayload),

    /// 403
    #[error("Request failed with status code 403")]
    Forbidden(ErrorPayload),

    /// 404: the requested resource does not exist.
    #[error("Request failed with status code 404")]
    NotFound(ErrorPayload),

    /// 422 with field-keyed messages.
    #[error("Request failed with status code 422")]
    Validation(ErrorPayload),

    /// Any 5xx status.
    #[error("Request failed with status code {status}")]
    Server { status: u16, payload: ErrorPayload },

    /// Any other non-2xx status.
    #[error("Request failed with status code {status}")]
    Http { status: u16, payload: ErrorPayload },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A local file operation failed (downloads).
    #[error("i/o failed: {0}")]
    Io(String),
}

/// Coarse classification used for notification policy and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Permission,
    NotFound,
    Validation,
    Server,
    Unknown,
    Unexpected,
}

impl ApiError {
    /// Classify a non-2xx response.
    pub fn from_response(response: &HttpResponse) -> Self {
        let payload = ErrorPayload::from_body(&response.body);
        match response.status {
            401 => ApiError::Unauthorized(payload),
            403 => ApiError::Forbidden(payload),
            404 => ApiError::NotFound(payload),
            422 => ApiError::Validation(payload),
            status @ 500.. => ApiError::Server { status, payload },
            status => ApiError::Http { status, payload },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unauthorized(_) => ErrorKind::Auth,
            ApiError::Forbidden(_) => ErrorKind::Permission,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Http { .. } => ErrorKind::Unknown,
            ApiError::Serialization(_) | ApiError::Deserialization(_) | ApiError::Io(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Validation(_) => Some(422),
            ApiError::Server { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            ApiError::Unauthorized(p)
            | ApiError::Forbidden(p)
            | ApiError::NotFound(p)
            | ApiError::Validation(p)
            | ApiError::Server { payload: p, .. }
            | ApiError::Http { payload: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Message shown in hook state: the response body's `message`, else this
    /// error's own description, else [`GENERIC_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        if let Some(message) = self
            .payload()
            .and_then(|p| p.message.as_deref())
            .filter(|m| !m.is_empty())
        {
            return message.to_string();
        }
        let own = self.to_string();
        if own.is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            own
        }
    }
}

/// Errors from a [`Storage`](crate::storage::Storage) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage i/o failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

/// Errors reading client configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} is not a whole number of seconds")]
    InvalidTimeout { var: &'static str, value: String },
}
