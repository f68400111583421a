//! Batched copies against a mocked Drive batch endpoint

use std::collections::BTreeMap;

use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, Request, ResponseTemplate};

use gbridge_core::domain::{CopyPlan, RemoteError};
use gbridge_core::ports::remote_file_store::{CopiedFile, IRemoteFileStore};

use crate::common::{id, setup_drive, BATCH_PATH};

const RESPONSE_BOUNDARY: &str = "batch_resp";

/// (content id, source file id) pairs in request order
fn batch_items(body: &str) -> Vec<(String, String)> {
    let mut items = Vec::new();
    let mut content_id = None;
    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("Content-ID: <") {
            content_id = Some(rest.trim_end_matches('>').to_string());
        }
        if let Some(rest) = line.strip_prefix("POST ") {
            let source = rest
                .split("/files/")
                .nth(1)
                .and_then(|s| s.split('/').next())
                .unwrap()
                .to_string();
            items.push((content_id.take().unwrap(), source));
        }
    }
    items
}

/// Answers every part in reverse order; sources named `missing*` fail
/// and sources named `silent*` get no answer at all
fn respond_to_batch(request: &Request) -> ResponseTemplate {
    let body = String::from_utf8_lossy(&request.body);
    let mut out = String::new();
    for (content_id, source) in batch_items(&body).into_iter().rev() {
        if source.starts_with("silent") {
            continue;
        }
        let (status, payload) = if source.starts_with("missing") {
            (
                "404 Not Found",
                format!(r#"{{"error": {{"code": 404, "message": "File not found: {source}."}}}}"#),
            )
        } else {
            (
                "200 OK",
                format!(r#"{{"id": "copy_of_{source}", "name": "{source}.txt"}}"#),
            )
        };
        out.push_str(&format!(
            "--{RESPONSE_BOUNDARY}\r\nContent-Type: application/http\r\n\
             Content-ID: <response-{content_id}>\r\n\r\n\
             HTTP/1.1 {status}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n\
             {payload}\r\n"
        ));
    }
    out.push_str(&format!("--{RESPONSE_BOUNDARY}--\r\n"));
    ResponseTemplate::new(200).set_body_raw(
        out.into_bytes(),
        &format!("multipart/mixed; boundary={RESPONSE_BOUNDARY}"),
    )
}

fn plans(sources: &[&str]) -> Vec<CopyPlan> {
    sources
        .iter()
        .map(|s| CopyPlan::new(id(s), id("dest_dir"), format!("{s}.txt")))
        .collect()
}

async fn run_batch(
    store: &impl IRemoteFileStore,
    plans: &[CopyPlan],
) -> (Result<(), RemoteError>, BTreeMap<usize, Result<CopiedFile, RemoteError>>) {
    let mut results = BTreeMap::new();
    let outcome = store
        .submit_copy_batch(plans, &mut |index, result| {
            assert!(results.insert(index, result).is_none(), "duplicate callback");
        })
        .await;
    (outcome, results)
}

#[tokio::test]
async fn test_batch_split_into_chunks() {
    let (server, store) = setup_drive(2).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(header_regex("content-type", "^multipart/mixed; boundary=batch_"))
        .respond_with(respond_to_batch)
        .expect(2)
        .mount(&server)
        .await;

    let plans = plans(&["f0", "f1", "f2"]);
    let (outcome, results) = run_batch(&store, &plans).await;

    outcome.unwrap();
    assert_eq!(results.len(), 3);
    for (index, source) in ["f0", "f1", "f2"].iter().enumerate() {
        let copied = results[&index].as_ref().unwrap();
        assert_eq!(copied.id, id(&format!("copy_of_{source}")));
    }
}

#[tokio::test]
async fn test_batch_embeds_copy_requests() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(respond_to_batch)
        .mount(&server)
        .await;

    let (outcome, _) = run_batch(&store, &plans(&["f0"])).await;
    outcome.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains(
        "POST /drive/v3/files/f0/copy?fields=id,name&supportsAllDrives=true HTTP/1.1"
    ));
    assert!(body.contains(r#"{"name":"f0.txt","parents":["dest_dir"]}"#));
}

#[tokio::test]
async fn test_per_item_failures_reported() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(respond_to_batch)
        .mount(&server)
        .await;

    let plans = plans(&["f0", "missing1", "silent2"]);
    let (outcome, results) = run_batch(&store, &plans).await;

    outcome.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[&0].is_ok());
    assert_eq!(
        results[&1].clone().unwrap_err(),
        RemoteError::NotFound("File not found: missing1.".into())
    );
    assert_eq!(
        results[&2].clone().unwrap_err(),
        RemoteError::RemoteFault("no response for batch item".into())
    );
}

#[tokio::test]
async fn test_batch_transport_failure() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (outcome, results) = run_batch(&store, &plans(&["f0", "f1"])).await;
    assert_eq!(outcome.unwrap_err().kind(), "remote_fault");
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (outcome, results) = run_batch(&store, &[]).await;
    outcome.unwrap();
    assert!(results.is_empty());
}
