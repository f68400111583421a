//! Token refresh and platform credentials against mocked endpoints

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gbridge_core::ports::credentials::{Credentials, IOAuthBackend, ITokenStore};
use gbridge_google::auth::{
    fetch_metadata_token, CredentialResolver, FileTokenStore, GoogleOAuthBackend,
    ResolverSettings,
};

fn expired_credentials(token_uri: String) -> Credentials {
    Credentials {
        access_token: "stale".into(),
        refresh_token: Some("1//refresh".into()),
        token_uri,
        client_id: "client.apps.googleusercontent.com".into(),
        client_secret: Some("secret".into()),
        scopes: vec!["drive".into(), "documents".into()],
        expires_at: Some(Utc::now() - Duration::minutes(5)),
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "drive documents"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let backend = GoogleOAuthBackend::new(format!("{}/unused", server.uri()));
    let refreshed = backend
        .refresh(&expired_credentials(format!("{}/token", server.uri())))
        .await
        .unwrap();

    assert_eq!(refreshed.access_token, "ya29.fresh");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("1//refresh"));
    assert_eq!(refreshed.client_id, "client.apps.googleusercontent.com");
    assert_eq!(refreshed.scopes, vec!["drive".to_string(), "documents".to_string()]);
    assert!(refreshed.is_valid());
}

#[tokio::test]
async fn test_refresh_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let backend = GoogleOAuthBackend::new(format!("{}/unused", server.uri()));
    let result = backend
        .refresh(&expired_credentials(format!("{}/token", server.uri())))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_resolver_refreshes_cached_file_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path()));
    store
        .save("gbridge_token", &expired_credentials(format!("{}/token", server.uri())))
        .unwrap();

    let resolver = CredentialResolver::new(
        store.clone(),
        Arc::new(GoogleOAuthBackend::new(format!("{}/unused", server.uri()))),
        ResolverSettings {
            stem: "gbridge_token".into(),
            scopes: vec!["drive".into(), "documents".into()],
            interactive: Some(false),
            ..Default::default()
        },
    );

    let credentials = resolver.resolve().await.unwrap();
    assert_eq!(credentials.access_token, "ya29.fresh");

    let cached = store.load("gbridge_token").unwrap().unwrap();
    assert_eq!(cached.access_token, "ya29.fresh");
    let raw = std::fs::read_to_string(dir.path().join("gbridge_token.json")).unwrap();
    assert!(raw.contains(r#""token": "ya29.fresh""#));
}

#[tokio::test]
async fn test_metadata_server_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/computeMetadata/v1/instance/service-accounts/default/token"))
        .and(header("Metadata-Flavor", "Google"))
        .and(query_param("scopes", "drive,documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.platform",
            "expires_in": 1800,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!(
        "{}/computeMetadata/v1/instance/service-accounts/default/token",
        server.uri()
    );
    let backend = GoogleOAuthBackend::new(url);
    let credentials = backend
        .silent(&["drive".to_string(), "documents".to_string()])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credentials.access_token, "ya29.platform");
    assert!(credentials.covers(&["drive", "documents"]));
    assert!(!credentials.can_refresh());
}

#[tokio::test]
async fn test_metadata_server_absent() {
    let http = reqwest::Client::new();
    let result = fetch_metadata_token(&http, "http://127.0.0.1:1/token", &["drive".to_string()])
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_metadata_server_refuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let result = fetch_metadata_token(&http, &format!("{}/token", server.uri()), &[])
        .await
        .unwrap();
    assert!(result.is_none());
}
