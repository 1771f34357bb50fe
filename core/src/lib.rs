//! Client core for the starter dashboard: HTTP wrapper, request hooks and
//! the mock session.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values, with a
//! pluggable [`Transport`] doing the I/O in between (host-does-IO pattern).
//! Every call goes through one shared [`ApiClient`] so the auth and error
//! interceptors apply uniformly.
//!
//! # Design
//! - `ApiClient` owns the configuration, transport and interceptors; verb
//!   helpers unwrap the `{ data, message?, success }` envelope.
//! - Failures surface as [`ApiError`] after the response interceptor has run
//!   its side effects (toast, token purge, redirect to `/login` on 401).
//! - Hooks in [`hooks`] layer an idle/loading/success/error state machine over
//!   the helpers; superseded calls are dropped rather than racing.
//! - [`SessionStore`] is the mock sign-in fixture, persisted through the
//!   same [`Storage`] the auth interceptor reads the token from.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod access;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod interceptor;
pub mod multipart;
pub mod navigate;
pub mod notify;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use access::{Capabilities, Capability, Role};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, ErrorKind, StorageError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Query, RequestOptions};
pub use multipart::{Files, UploadFile};
pub use navigate::{Navigator, RecordingNavigator};
pub use notify::{Notifier, Toast, ToastLevel, ToastQueue};
pub use session::{SessionStore, SessionUser};
pub use storage::{FileStorage, MemoryStorage, Storage, TokenStore};
pub use transport::{Transport, UreqTransport};
pub use types::{ApiResponse, ErrorPayload, HealthStatus, PaginatedResponse, Pagination};
