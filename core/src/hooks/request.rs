//! One stateful hook per request shape: GET, POST, PUT, DELETE and upload.
//!
//! Each hook owns a single [`RequestState`] and derefs to it, so callers read
//! `data()`, `error()` and `is_loading()` straight off the hook.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::state::RequestState;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{Query, RequestOptions};
use crate::multipart::Files;

/// Run one call through `state` and hand back the fresh data on success.
pub(crate) fn run<T>(
    state: &mut RequestState<T>,
    call: impl FnOnce() -> Result<T, ApiError>,
) -> Option<&T> {
    let ticket = state.begin();
    let succeeded = {
        let outcome = call();
        let ok = outcome.is_ok();
        state.settle(ticket, outcome) && ok
    };
    if succeeded {
        state.data()
    } else {
        None
    }
}

macro_rules! state_access {
    ($hook:ident) => {
        impl<T> Deref for $hook<T> {
            type Target = RequestState<T>;

            fn deref(&self) -> &Self::Target {
                &self.state
            }
        }

        impl<T> $hook<T> {
            pub fn state(&self) -> &RequestState<T> {
                &self.state
            }

            pub fn state_mut(&mut self) -> &mut RequestState<T> {
                &mut self.state
            }

            pub fn reset(&mut self) {
                self.state.reset();
            }
        }
    };
}

/// GET against a default URL, overridable per call.
#[derive(Debug)]
pub struct GetRequest<T> {
    url: String,
    state: RequestState<T>,
}

state_access!(GetRequest);

impl<T: DeserializeOwned> GetRequest<T> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: RequestState::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn execute(&mut self, client: &ApiClient, query: &Query) -> Option<&T> {
        run(&mut self.state, || client.get(&self.url, query))
    }

    pub fn execute_at(&mut self, client: &ApiClient, url: &str, query: &Query) -> Option<&T> {
        run(&mut self.state, || client.get(url, query))
    }
}

#[derive(Debug)]
pub struct PostRequest<T> {
    state: RequestState<T>,
}

state_access!(PostRequest);

impl<T: DeserializeOwned> Default for PostRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> PostRequest<T> {
    pub fn new() -> Self {
        Self {
            state: RequestState::new(),
        }
    }

    pub fn execute<B: Serialize + ?Sized>(
        &mut self,
        client: &ApiClient,
        url: &str,
        body: Option<&B>,
    ) -> Option<&T> {
        run(&mut self.state, || client.post(url, body, &RequestOptions::default()))
    }
}

#[derive(Debug)]
pub struct PutRequest<T> {
    state: RequestState<T>,
}

state_access!(PutRequest);

impl<T: DeserializeOwned> Default for PutRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> PutRequest<T> {
    pub fn new() -> Self {
        Self {
            state: RequestState::new(),
        }
    }

    pub fn execute<B: Serialize + ?Sized>(
        &mut self,
        client: &ApiClient,
        url: &str,
        body: Option<&B>,
    ) -> Option<&T> {
        run(&mut self.state, || client.put(url, body, &RequestOptions::default()))
    }
}

#[derive(Debug)]
pub struct DeleteRequest<T> {
    state: RequestState<T>,
}

state_access!(DeleteRequest);

impl<T: DeserializeOwned> Default for DeleteRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> DeleteRequest<T> {
    pub fn new() -> Self {
        Self {
            state: RequestState::new(),
        }
    }

    pub fn execute(&mut self, client: &ApiClient, url: &str) -> Option<&T> {
        run(&mut self.state, || client.delete(url, &RequestOptions::default()))
    }
}

#[derive(Debug)]
pub struct UploadRequest<T> {
    state: RequestState<T>,
}

state_access!(UploadRequest);

impl<T: DeserializeOwned> Default for UploadRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> UploadRequest<T> {
    pub fn new() -> Self {
        Self {
            state: RequestState::new(),
        }
    }

    pub fn execute(
        &mut self,
        client: &ApiClient,
        url: &str,
        files: impl Into<Files>,
        fields: Option<&Map<String, Value>>,
    ) -> Option<&T> {
        run(&mut self.state, || client.upload(url, files, fields))
    }
}
