//! Docs document service against a mocked Docs v1 API

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use gbridge_core::domain::{EnvelopeStatus, RemoteError, RichTextOp};
use gbridge_core::ports::document_service::IDocumentService;
use gbridge_google::docs::DocsClient;
use gbridge_markdown::MarkdownService;

use crate::common::{id, setup, DOCS_PATH};

#[tokio::test]
async fn test_batch_update_posts_requests() {
    let (server, client, api) = setup().await;
    let docs = DocsClient::new(client, api.docs_base_url);

    Mock::given(method("POST"))
        .and(path(format!("{DOCS_PATH}/documents/doc_1:batchUpdate")))
        .and(body_json(json!({
            "requests": [{"insertText": {"location": {"index": 1}, "text": "Hello\n"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documentId": "doc_1",
            "replies": [{}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    docs.batch_update(&id("doc_1"), &[RichTextOp::insert_text(1, "Hello\n")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_document_missing() {
    let (server, client, api) = setup().await;
    let docs = DocsClient::new(client, api.docs_base_url);

    Mock::given(method("GET"))
        .and(path(format!("{DOCS_PATH}/documents/nope")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found."}
        })))
        .mount(&server)
        .await;

    let err = docs.get_document(&id("nope")).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));
}

#[tokio::test]
async fn test_markdown_write_through_docs_api() {
    let (server, client, api) = setup().await;
    let service = MarkdownService::new(Arc::new(DocsClient::new(client, api.docs_base_url)));

    Mock::given(method("POST"))
        .and(path(format!("{DOCS_PATH}/documents/doc_1:batchUpdate")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "doc_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = service.write_markdown(&id("doc_1"), "# Title\nPlain text\n").await;
    assert_eq!(env.status, EnvelopeStatus::Success);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let sent = body["requests"].as_array().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0]["insertText"]["location"]["index"], 1);
    assert_eq!(sent[1]["updateTextStyle"]["fields"], "bold,fontSize");
    assert_eq!(sent[1]["updateTextStyle"]["range"]["endIndex"], 7);
    assert_eq!(sent[2]["insertText"]["location"]["index"], 7);
}

#[tokio::test]
async fn test_markdown_read_through_docs_api() {
    let (server, client, api) = setup().await;
    let service = MarkdownService::new(Arc::new(DocsClient::new(client, api.docs_base_url)));

    Mock::given(method("GET"))
        .and(path(format!("{DOCS_PATH}/documents/doc_1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documentId": "doc_1",
            "title": "Notes",
            "body": {"content": [
                {"sectionBreak": {"sectionStyle": {}}},
                {"paragraph": {
                    "elements": [{"textRun": {"content": "Notes\n", "textStyle": {}}}],
                    "paragraphStyle": {"namedStyleType": "HEADING_1"}
                }},
                {"paragraph": {
                    "elements": [
                        {"textRun": {"content": "see ", "textStyle": {}}},
                        {"textRun": {
                            "content": "site",
                            "textStyle": {"link": {"url": "https://example.com"}, "underline": true}
                        }},
                        {"textRun": {"content": "\n", "textStyle": {}}}
                    ],
                    "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}
                }}
            ]}
        })))
        .mount(&server)
        .await;

    let env = service.read_markdown(&id("doc_1")).await;
    assert!(env.is_success());
    assert_eq!(
        env.response.data,
        Value::String("# Notes\nsee [site](https://example.com)".into())
    );
    assert_eq!(env.message, "Document with id doc_1 markdown returned.");
}
