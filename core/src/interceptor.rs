//! Request and response interceptors applied to every call.
//!
//! # Design
//! The request side attaches the bearer token; it never fails a request.
//! The response side classifies failures, performs the side effects tied to
//! each class (toast, token purge, redirect) and hands the error back so the
//! caller still observes the failure. The notification policy itself is the
//! pure function [`notifications_for`], which keeps the wording testable
//! without any sinks attached.

use std::sync::Arc;

use crate::error::{ApiError, ErrorKind};
use crate::http::{HttpRequest, HttpResponse};
use crate::navigate::{Navigator, LOGIN_ROUTE};
use crate::notify::{Notifier, Toast};
use crate::storage::TokenStore;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const VALIDATION_FALLBACK_MESSAGE: &str = "Validation failed";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Injects `Authorization: Bearer <token>` when a token is stored.
#[derive(Clone)]
pub struct AuthInterceptor {
    tokens: TokenStore,
}

impl AuthInterceptor {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    pub fn apply(&self, request: &mut HttpRequest) {
        if let Some(token) = self.tokens.token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
    }
}

/// Classifies responses and runs the failure side effects.
#[derive(Clone)]
pub struct ErrorInterceptor {
    tokens: TokenStore,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ErrorInterceptor {
    pub fn new(tokens: TokenStore, notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            tokens,
            notifier,
            navigator,
        }
    }

    /// Pass 2xx responses through; turn anything else into an `ApiError`
    /// after its side effects have run.
    pub fn on_response(&self, response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.is_success() {
            tracing::debug!(status = response.status, bytes = response.body.len(), "response ok");
            return Ok(response);
        }
        let err = ApiError::from_response(&response);
        self.on_error(&err);
        Err(err)
    }

    /// Run the side effects for `err`. Every branch emits at least one toast;
    /// 422 emits one per field message.
    pub fn on_error(&self, err: &ApiError) {
        tracing::warn!(error = %err, kind = ?err.kind(), "request failed");

        if err.kind() == ErrorKind::Auth {
            if let Err(e) = self.tokens.clear() {
                tracing::warn!(error = %e, "failed to clear auth token");
            }
            self.navigator.navigate(LOGIN_ROUTE);
        }

        for message in notifications_for(err) {
            self.notifier.notify(Toast::error(message));
        }
    }
}

/// Toast texts for a failure, in emission order.
pub fn notifications_for(err: &ApiError) -> Vec<String> {
    let payload_message = || {
        err.payload()
            .and_then(|p| p.message.clone())
            .filter(|m| !m.is_empty())
    };
    match err.kind() {
        ErrorKind::Network => vec![NETWORK_ERROR_MESSAGE.to_string()],
        ErrorKind::Auth => vec![SESSION_EXPIRED_MESSAGE.to_string()],
        ErrorKind::Permission => vec![FORBIDDEN_MESSAGE.to_string()],
        ErrorKind::NotFound => vec![NOT_FOUND_MESSAGE.to_string()],
        ErrorKind::Validation => {
            let fields = err.payload().map(|p| p.field_messages()).unwrap_or_default();
            if fields.is_empty() {
                vec![payload_message().unwrap_or_else(|| VALIDATION_FALLBACK_MESSAGE.to_string())]
            } else {
                fields
            }
        }
        ErrorKind::Server => vec![SERVER_ERROR_MESSAGE.to_string()],
        ErrorKind::Unknown => {
            let status = err.status().unwrap_or_default();
            vec![payload_message().unwrap_or_else(|| format!("Request failed with status {status}"))]
        }
        ErrorKind::Unexpected => vec![UNEXPECTED_ERROR_MESSAGE.to_string()],
    }
}
