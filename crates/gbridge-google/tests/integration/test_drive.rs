//! Drive file store against a mocked Drive v3 API

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use gbridge_core::domain::{ItemKind, RemoteError, FOLDER_MIME_TYPE};
use gbridge_core::ports::remote_file_store::{ChildFilter, IRemoteFileStore};
use gbridge_google::drive::ExploreOptions;

use crate::common::{drive_file, id, setup_drive, DRIVE_PATH};

#[tokio::test]
async fn test_get_metadata() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("GET"))
        .and(path(format!("{DRIVE_PATH}/files/src_1")))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param("supportsAllDrives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(drive_file(
            "src_1",
            "Reports",
            FOLDER_MIME_TYPE,
            "2024-05-01T12:00:00.000Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let item = store.get_metadata(&id("src_1")).await.unwrap();
    assert_eq!(item.name, "Reports");
    assert_eq!(item.kind, ItemKind::Folder);
    assert_eq!(item.parent_ids, vec![id("parent_1")]);
    assert_eq!(
        item.modified_time.unwrap().to_rfc3339(),
        "2024-05-01T12:00:00+00:00"
    );
}

#[tokio::test]
async fn test_get_metadata_not_found() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("GET"))
        .and(path(format!("{DRIVE_PATH}/files/gone")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "File not found: gone."}
        })))
        .mount(&server)
        .await;

    let err = store.get_metadata(&id("gone")).await.unwrap_err();
    assert_eq!(err, RemoteError::NotFound("File not found: gone.".into()));
}

#[tokio::test]
async fn test_list_children_query_and_pages() {
    let (server, store) = setup_drive(100).await;
    let files_path = format!("{DRIVE_PATH}/files");

    Mock::given(method("GET"))
        .and(path(files_path.as_str()))
        .and(query_param("pageToken", "page_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [drive_file("f3", "c.txt", "text/plain", "2024-01-03T00:00:00Z")]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(files_path.as_str()))
        .and(query_param(
            "q",
            "'dir_1' in parents and trashed = false and mimeType != 'application/vnd.google-apps.folder'",
        ))
        .and(query_param("includeItemsFromAllDrives", "true"))
        .and(query_param("pageSize", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                drive_file("f1", "a.txt", "text/plain", "2024-01-01T00:00:00Z"),
                drive_file("f2", "b.txt", "text/plain", "2024-01-02T00:00:00Z")
            ],
            "nextPageToken": "page_2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = store
        .list_all_children(&id("dir_1"), &ChildFilter::all().of_kind(ItemKind::File))
        .await
        .unwrap();
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test]
async fn test_create_folder() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .and(path(format!("{DRIVE_PATH}/files")))
        .and(body_partial_json(json!({
            "name": "Backup",
            "mimeType": FOLDER_MIME_TYPE,
            "parents": ["dest_1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new_dir"})))
        .expect(1)
        .mount(&server)
        .await;

    let folder = store.create_folder("Backup", &id("dest_1")).await.unwrap();
    assert_eq!(folder, id("new_dir"));
}

#[tokio::test]
async fn test_delete_item() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{DRIVE_PATH}/files/old_copy")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store.delete_item(&id("old_copy")).await.unwrap();
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let (server, store) = setup_drive(100).await;
    let file_path = format!("{DRIVE_PATH}/files/busy");

    Mock::given(method("GET"))
        .and(path(file_path.as_str()))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(file_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(drive_file(
            "busy",
            "x",
            "text/plain",
            "2024-01-01T00:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let item = store.get_metadata(&id("busy")).await.unwrap();
    assert_eq!(item.name, "x");
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("GET"))
        .and(path(format!("{DRIVE_PATH}/files/busy")))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = store.get_metadata(&id("busy")).await.unwrap_err();
    assert_eq!(err.kind(), "remote_fault");
}

#[tokio::test]
async fn test_explore_shared_drive() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("GET"))
        .and(path(format!("{DRIVE_PATH}/files")))
        .and(query_param("corpora", "drive"))
        .and(query_param("driveId", "shared_9"))
        .and(query_param(
            "q",
            "'dir_1' in parents and trashed = false and name contains 'plan' \
             and mimeType = 'application/vnd.google-apps.folder'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [drive_file("d1", "plans", FOLDER_MIME_TYPE, "2024-01-01T00:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ExploreOptions {
        name_contains: Some("plan".into()),
        folders_only: true,
        shared_drive_id: Some("shared_9".into()),
        ..Default::default()
    };
    let items = store.explore_folder(&id("dir_1"), &options).await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_folder());
}

#[tokio::test]
async fn test_create_document() {
    let (server, store) = setup_drive(100).await;

    Mock::given(method("POST"))
        .and(path(format!("{DRIVE_PATH}/files")))
        .and(body_partial_json(json!({
            "name": "Meeting notes",
            "mimeType": "application/vnd.google-apps.document",
            "parents": ["dir_1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(drive_file(
            "doc_1",
            "Meeting notes",
            "application/vnd.google-apps.document",
            "2024-01-01T00:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let doc = store
        .create_document("Meeting notes", Some(&id("dir_1")))
        .await
        .unwrap();
    assert_eq!(doc.id, id("doc_1"));
    assert!(doc.web_view_link.unwrap().contains("doc_1"));
}
