//! Replays the API demo flows against a running fixture server.
//!
//! `API_BASE_URL` selects the server (e.g. `http://127.0.0.1:3000`);
//! `STARTER_STORAGE_DIR` keeps the token and session on disk between runs.

use std::sync::Arc;

use serde_json::{json, Value};
use starter_core::hooks::{GetRequest, PaginatedRequest, PostRequest};
use starter_core::notify::LogNotifier;
use starter_core::{
    ApiClient, ClientConfig, FileStorage, MemoryStorage, Notifier, Query, SessionStore, Storage,
    Toast,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env()?;
    let storage: Arc<dyn Storage> = match std::env::var("STARTER_STORAGE_DIR") {
        Ok(dir) => Arc::new(FileStorage::open(dir)?),
        Err(_) => Arc::new(MemoryStorage::new()),
    };
    let notifier = Arc::new(LogNotifier);
    let client = ApiClient::builder(config)
        .storage(storage.clone())
        .notifier(notifier.clone())
        .build();

    let mut session = SessionStore::open(storage);
    if !session.is_authenticated() && session.login("admin@example.com", "admin") {
        notifier.notify(Toast::success("Signed in as admin"));
    }

    match client.health_check() {
        Ok(health) => tracing::info!(status = %health.status, timestamp = %health.timestamp, "health"),
        Err(e) => tracing::warn!(error = %e, "health check failed"),
    }

    let mut test_get: GetRequest<Value> = GetRequest::new("/api/test");
    if let Some(data) = test_get.execute(&client, &Query::new()) {
        tracing::info!(%data, "GET /api/test");
        notifier.notify(Toast::success("GET request successful!"));
    }
    test_get.execute(&client, &Query::new().with("error", "true"));
    tracing::info!(error = ?test_get.error(), "GET /api/test?error=true");

    let mut create: PostRequest<Value> = PostRequest::new();
    let form = json!({"name": "Ada Lovelace", "email": "ada@example.com"});
    if let Some(data) = create.execute(&client, "/api/test", Some(&form)) {
        tracing::info!(%data, "POST /api/test");
        notifier.notify(Toast::success("POST request successful!"));
    }
    create.execute(&client, "/api/test", Some(&json!({"shouldError": true})));
    tracing::info!(error = ?create.error(), "POST /api/test with shouldError");

    let mut items: PaginatedRequest<Value> = PaginatedRequest::with_page("/api/items", 1, 5);
    items.execute(&client, None, None, &Query::new());
    items.next_page(&client);
    let pagination = items.pagination();
    tracing::info!(
        page = pagination.page,
        total_pages = pagination.total_pages,
        count = items.items().len(),
        "GET /api/items"
    );

    session.close();
    Ok(())
}
