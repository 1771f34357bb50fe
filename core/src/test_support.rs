use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::navigate::RecordingNavigator;
use crate::notify::ToastQueue;
use crate::storage::MemoryStorage;
use crate::transport::Transport;

/// Replays canned outcomes in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn push(&self, response: HttpResponse) {
        self.outcomes.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.push(HttpResponse::json(status, body));
    }

    pub fn push_err(&self, err: TransportError) {
        self.outcomes.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// A client wired to a scripted transport and recording sinks.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub toasts: Arc<ToastQueue>,
    pub navigator: Arc<RecordingNavigator>,
    pub client: ApiClient,
}

impl Harness {
    pub fn new() -> Self {
        let transport = Arc::new(ScriptedTransport::default());
        let storage = Arc::new(MemoryStorage::new());
        let toasts = Arc::new(ToastQueue::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let client = ApiClient::builder(ClientConfig::new("http://api.test"))
            .transport(transport.clone())
            .storage(storage.clone())
            .notifier(toasts.clone())
            .navigator(navigator.clone())
            .build();
        Self {
            transport,
            storage,
            toasts,
            navigator,
            client,
        }
    }
}
