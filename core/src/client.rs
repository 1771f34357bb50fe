//! The shared API client: request building, interceptors and typed helpers.
//!
//! # Design
//! `ApiClient` is constructed once per process and passed by reference to
//! everything that issues requests, so interceptors apply uniformly. Each
//! verb helper goes through the same three steps:
//!
//! 1. `build_request` resolves the path, merges headers and the timeout, and
//!    runs the auth interceptor.
//! 2. `send` hands the request to the `Transport` and runs the response
//!    interceptor, which performs failure side effects before returning the
//!    error.
//! 3. The envelope is decoded and its `data` returned.
//!
//! Every failure, including ones that never reached the server, passes
//! through the response interceptor exactly once.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Query, RequestOptions};
use crate::interceptor::{AuthInterceptor, ErrorInterceptor};
use crate::multipart::{self, Files};
use crate::navigate::{LogNavigator, Navigator};
use crate::notify::{LogNotifier, Notifier};
use crate::storage::{MemoryStorage, Storage, TokenStore};
use crate::transport::{Transport, UreqTransport};
use crate::types::{ApiResponse, HealthStatus, PaginatedResponse};

const DEFAULT_DOWNLOAD_NAME: &str = "download";

pub struct ApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    storage: Option<Arc<dyn Storage>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> ApiClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new(self.config.timeout)));
        let storage = self.storage.unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LogNavigator));

        let tokens = TokenStore::new(storage);
        ApiClient {
            config: self.config,
            transport,
            auth: AuthInterceptor::new(tokens.clone()),
            errors: ErrorInterceptor::new(tokens.clone(), notifier, navigator),
            tokens,
        }
    }
}

pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    auth: AuthInterceptor,
    errors: ErrorInterceptor,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            transport: None,
            storage: None,
            notifier: None,
            navigator: None,
        }
    }

    /// Client with a `ureq` transport, in-memory storage and log sinks.
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Build / send
    // -----------------------------------------------------------------------

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
        body: Option<Vec<u8>>,
        options: &RequestOptions,
    ) -> HttpRequest {
        let mut url = self.config.resolve(path);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.pairs())
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encoded);
        }

        let mut request = HttpRequest {
            method,
            url,
            headers: self.config.default_headers.clone(),
            body,
            timeout: options.timeout.unwrap_or(self.config.timeout),
        };
        for (name, value) in &options.headers {
            request.set_header(name, value.clone());
        }
        self.auth.apply(&mut request);
        request
    }

    /// Execute through the transport and the response interceptor.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        match self.transport.execute(&request) {
            Ok(response) => self.errors.on_response(response),
            Err(e) => Err(self.fail(ApiError::Network(e))),
        }
    }

    /// Decode a success body into the common envelope.
    pub fn parse_envelope<T: DeserializeOwned>(
        &self,
        response: &HttpResponse,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.decode(response)
    }

    fn decode<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T, ApiError> {
        serde_json::from_slice(&response.body)
            .map_err(|e| self.fail(ApiError::Deserialization(e.to_string())))
    }

    fn encode<B: Serialize + ?Sized>(&self, body: Option<&B>) -> Result<Option<Vec<u8>>, ApiError> {
        body.map(serde_json::to_vec)
            .transpose()
            .map_err(|e| self.fail(ApiError::Serialization(e.to_string())))
    }

    fn fail(&self, err: ApiError) -> ApiError {
        self.errors.on_error(&err);
        err
    }

    fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let response = self.send(request)?;
        let envelope: ApiResponse<T> = self.decode(&response)?;
        Ok(envelope.data)
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T, ApiError> {
        self.get_with(path, query, &RequestOptions::default())
    }

    pub fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.call(self.build_request(HttpMethod::Get, path, query, None, options))
    }

    pub fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.with_body(HttpMethod::Post, path, body, options)
    }

    pub fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.with_body(HttpMethod::Put, path, body, options)
    }

    pub fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.with_body(HttpMethod::Patch, path, body, options)
    }

    pub fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.call(self.build_request(HttpMethod::Delete, path, &Query::new(), None, options))
    }

    fn with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let bytes = self.encode(body)?;
        self.call(self.build_request(method, path, &Query::new(), bytes, options))
    }

    /// POST one or more files as `multipart/form-data`, plus optional scalar
    /// fields.
    pub fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        files: impl Into<Files>,
        fields: Option<&Map<String, Value>>,
    ) -> Result<T, ApiError> {
        self.upload_with(path, files, fields, &RequestOptions::default())
    }

    /// `upload` with per-call overrides. The multipart `Content-Type` always
    /// replaces any caller-supplied one.
    pub fn upload_with<T: DeserializeOwned>(
        &self,
        path: &str,
        files: impl Into<Files>,
        fields: Option<&Map<String, Value>>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let form = multipart::encode(&files.into(), fields);
        let options = options.clone().header("Content-Type", form.content_type);
        self.call(self.build_request(HttpMethod::Post, path, &Query::new(), Some(form.bytes), &options))
    }

    /// Fetch a binary payload and save it as `dir/<file_name>` (default
    /// `download`). The payload is staged in a temporary file in `dir` that
    /// is released once it has been persisted under its final name.
    pub fn download(&self, path: &str, dir: &Path, file_name: Option<&str>) -> Result<(), ApiError> {
        self.download_with(path, dir, file_name, &RequestOptions::default())
    }

    /// `download` with per-call overrides; caller headers win over the
    /// default `Accept: */*`.
    pub fn download_with(
        &self,
        path: &str,
        dir: &Path,
        file_name: Option<&str>,
        options: &RequestOptions,
    ) -> Result<(), ApiError> {
        let name = file_name.unwrap_or(DEFAULT_DOWNLOAD_NAME);
        let name = Path::new(name)
            .file_name()
            .ok_or_else(|| self.fail(ApiError::Io(format!("invalid file name: {name:?}"))))?;

        let mut merged = RequestOptions::default().header("Accept", "*/*");
        merged.headers.extend(options.headers.iter().cloned());
        merged.timeout = options.timeout;
        let response = self.send(self.build_request(HttpMethod::Get, path, &Query::new(), None, &merged))?;

        let dest = dir.join(name);
        let save = || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(dir)?;
            std::io::Write::write_all(&mut tmp, &response.body)?;
            tmp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        };
        save().map_err(|e| self.fail(ApiError::Io(e.to_string())))?;

        tracing::debug!(path = %dest.display(), bytes = response.body.len(), "download saved");
        Ok(())
    }

    /// GET a paginated endpoint and return the whole envelope.
    pub fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<PaginatedResponse<T>, ApiError> {
        self.get_paginated_with(path, query, &RequestOptions::default())
    }

    pub fn get_paginated_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        options: &RequestOptions,
    ) -> Result<PaginatedResponse<T>, ApiError> {
        let request = self.build_request(HttpMethod::Get, path, query, None, options);
        let response = self.send(request)?;
        self.decode(&response)
    }

    pub fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health", &Query::new())
    }
}
