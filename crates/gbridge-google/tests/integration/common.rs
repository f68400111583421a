//! Shared test helpers for Google API integration tests
//!
//! Each helper starts a mock server and returns adapters pointing at it.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::MockServer;

use gbridge_core::config::ApiConfig;
use gbridge_core::domain::ItemId;
use gbridge_google::client::GoogleClient;
use gbridge_google::drive::DriveFileStore;

/// Drive API path prefix on the mock server
pub const DRIVE_PATH: &str = "/drive/v3";

/// Batch endpoint path on the mock server
pub const BATCH_PATH: &str = "/batch/drive/v3";

/// Docs API path prefix on the mock server
pub const DOCS_PATH: &str = "/v1";

/// API settings pointing every endpoint at `server`
pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        drive_base_url: format!("{}{DRIVE_PATH}", server.uri()),
        docs_base_url: format!("{}{DOCS_PATH}", server.uri()),
        batch_url: format!("{}{BATCH_PATH}", server.uri()),
        max_retries: 2,
        ..ApiConfig::default()
    }
}

/// Starts a mock server and returns a client plus its API settings
pub async fn setup() -> (MockServer, Arc<GoogleClient>, ApiConfig) {
    let server = MockServer::start().await;
    let client = Arc::new(GoogleClient::new("test-access-token").with_max_retries(2));
    let api = api_config(&server);
    (server, client, api)
}

/// Starts a mock server and returns a Drive store with the given batch size
#[allow(dead_code)]
pub async fn setup_drive(max_batch_size: usize) -> (MockServer, DriveFileStore) {
    let (server, client, mut api) = setup().await;
    api.max_batch_size = max_batch_size;
    let store = DriveFileStore::new(client, &api);
    (server, store)
}

pub fn id(s: &str) -> ItemId {
    ItemId::new(s).expect("valid test id")
}

/// A Drive file resource as the API returns it
#[allow(dead_code)]
pub fn drive_file(id: &str, name: &str, mime_type: &str, modified: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": mime_type,
        "modifiedTime": modified,
        "parents": ["parent_1"],
        "webViewLink": format!("https://drive.google.com/file/d/{id}/view")
    })
}
