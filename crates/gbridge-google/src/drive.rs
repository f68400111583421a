//! Google Drive v3 file store
//!
//! [`DriveFileStore`] implements [`IRemoteFileStore`] over the Drive REST
//! API. Every call opts into shared drives (`supportsAllDrives`), and
//! listings include their items (`includeItemsFromAllDrives`).
//!
//! Copies go through the batch endpoint, in chunks of at most
//! `max_batch_size` requests.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use gbridge_core::config::ApiConfig;
use gbridge_core::domain::{
    CopyPlan, FileItem, ItemId, ItemKind, RemoteError, DOCUMENT_MIME_TYPE, FOLDER_MIME_TYPE,
};
use gbridge_core::ports::remote_file_store::{
    ChildFilter, ChildPage, CopiedFile, CopyCallback, IRemoteFileStore,
};

use crate::batch::{encode_copy_batch, parse_batch_response, BatchResponsePart};
use crate::client::GoogleClient;
use crate::GoogleError;

/// Fields requested for every file resource
pub const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,parents,webViewLink";

// ============================================================================
// DTOs
// ============================================================================

/// A Drive file resource as returned by `files.get` / `files.list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    parents: Vec<String>,
    web_view_link: Option<String>,
}

impl TryFrom<DriveFile> for FileItem {
    type Error = RemoteError;

    fn try_from(file: DriveFile) -> Result<Self, Self::Error> {
        Ok(FileItem {
            id: ItemId::new(file.id)?,
            kind: ItemKind::from_mime_type(&file.mime_type),
            name: file.name,
            mime_type: file.mime_type,
            modified_time: file.modified_time,
            parent_ids: file
                .parents
                .into_iter()
                .map(ItemId::new)
                .collect::<Result<_, _>>()?,
            web_view_link: file.web_view_link,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

// ============================================================================
// Query building
// ============================================================================

/// Quote a value for a Drive search query
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Filters for [`DriveFileStore::explore_folder`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreOptions {
    /// Only items whose name contains this text
    pub name_contains: Option<String>,
    /// Only items of one of these MIME types
    pub mime_types: Vec<String>,
    /// Only folders (overrides `mime_types`)
    pub folders_only: bool,
    /// Search within this shared drive
    pub shared_drive_id: Option<String>,
}

/// Build the `q` parameter for a child listing
pub fn children_query(parent: &ItemId, filter: &ChildFilter) -> String {
    let mut clauses = vec![
        format!("{} in parents", quote(parent.as_str())),
        "trashed = false".to_string(),
    ];
    if let Some(name) = &filter.name {
        clauses.push(format!("name = {}", quote(name)));
    }
    match filter.kind {
        Some(ItemKind::Folder) => clauses.push(format!("mimeType = {}", quote(FOLDER_MIME_TYPE))),
        Some(ItemKind::File) => clauses.push(format!("mimeType != {}", quote(FOLDER_MIME_TYPE))),
        None => {}
    }
    clauses.join(" and ")
}

/// Build the `q` parameter for a folder exploration
pub fn explore_query(folder: &ItemId, options: &ExploreOptions) -> String {
    let mut clauses = vec![
        format!("{} in parents", quote(folder.as_str())),
        "trashed = false".to_string(),
    ];
    if let Some(text) = &options.name_contains {
        clauses.push(format!("name contains {}", quote(text)));
    }
    if options.folders_only {
        clauses.push(format!("mimeType = {}", quote(FOLDER_MIME_TYPE)));
    } else if !options.mime_types.is_empty() {
        let any = options
            .mime_types
            .iter()
            .map(|m| format!("mimeType = {}", quote(m)))
            .collect::<Vec<_>>()
            .join(" or ");
        clauses.push(format!("({any})"));
    }
    clauses.join(" and ")
}

// ============================================================================
// DriveFileStore
// ============================================================================

/// Drive v3 adapter for the remote file store port
pub struct DriveFileStore {
    client: Arc<GoogleClient>,
    base_url: String,
    batch_url: String,
    page_size: u32,
    max_batch_size: usize,
}

impl DriveFileStore {
    pub fn new(client: Arc<GoogleClient>, api: &ApiConfig) -> Self {
        Self {
            client,
            base_url: api.drive_base_url.trim_end_matches('/').to_string(),
            batch_url: api.batch_url.clone(),
            page_size: api.page_size,
            max_batch_size: api.max_batch_size.max(1),
        }
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    fn file_url(&self, id: &ItemId) -> String {
        format!("{}/files/{}", self.base_url, id)
    }

    /// Path prefix of the API, used by embedded batch requests
    fn api_path(&self) -> String {
        url::Url::parse(&self.base_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/drive/v3".to_string())
    }

    async fn list_page(
        &self,
        query: &str,
        page_token: Option<&str>,
        shared_drive_id: Option<&str>,
    ) -> Result<FileList, GoogleError> {
        let url = self.files_url();
        let page_size = self.page_size.to_string();
        let fields = format!("nextPageToken,files({FILE_FIELDS})");

        let response = self
            .client
            .execute_with_retry(|| {
                let mut request = self.client.request(Method::GET, &url).query(&[
                    ("q", query),
                    ("fields", fields.as_str()),
                    ("pageSize", page_size.as_str()),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ]);
                if let Some(drive_id) = shared_drive_id {
                    request = request.query(&[("corpora", "drive"), ("driveId", drive_id)]);
                }
                if let Some(token) = page_token {
                    request = request.query(&[("pageToken", token)]);
                }
                request
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| GoogleError::InvalidResponse(e.to_string()))
    }

    /// List a folder's children with search filters, draining every page
    #[tracing::instrument(skip(self, options), fields(folder = %folder))]
    pub async fn explore_folder(
        &self,
        folder: &ItemId,
        options: &ExploreOptions,
    ) -> Result<Vec<FileItem>, RemoteError> {
        let query = explore_query(folder, options);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_page(
                    &query,
                    page_token.as_deref(),
                    options.shared_drive_id.as_deref(),
                )
                .await?;
            for file in page.files {
                items.push(FileItem::try_from(file)?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(count = items.len(), "Explored folder");
        Ok(items)
    }

    /// Create an empty native document, optionally inside a folder
    #[tracing::instrument(skip(self))]
    pub async fn create_document(
        &self,
        title: &str,
        parent: Option<&ItemId>,
    ) -> Result<FileItem, RemoteError> {
        let mut body = json!({ "name": title, "mimeType": DOCUMENT_MIME_TYPE });
        if let Some(parent) = parent {
            body["parents"] = json!([parent.as_str()]);
        }
        let url = format!("{}?fields={FILE_FIELDS}&supportsAllDrives=true", self.files_url());
        let file: DriveFile = self.client.post_json(&url, &body).await?;
        info!(id = %file.id, "Created document");
        FileItem::try_from(file)
    }

    /// Send one chunk and report each embedded response
    ///
    /// `offset` is the index of the chunk's first plan in the caller's slice.
    async fn submit_chunk(
        &self,
        chunk: &[CopyPlan],
        offset: usize,
        on_complete: &mut CopyCallback<'_>,
    ) -> Result<(), RemoteError> {
        let boundary = format!("batch_{}", uuid::Uuid::new_v4().simple());
        let batch = encode_copy_batch(chunk, &self.api_path(), &boundary);
        let content_type = batch.content_type();

        let response = self
            .client
            .execute_with_retry(|| {
                self.client
                    .request(Method::POST, &self.batch_url)
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(batch.body.clone())
            })
            .await?;

        let response_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(GoogleError::from)?;
        let parts = parse_batch_response(&response_type, &body)?;

        let mut answered = HashSet::new();
        for part in parts {
            if part.index >= chunk.len() || !answered.insert(part.index) {
                warn!(index = part.index, "Ignoring unexpected batch part");
                continue;
            }
            on_complete(offset + part.index, copy_result(&part));
        }

        for index in (0..chunk.len()).filter(|i| !answered.contains(i)) {
            on_complete(
                offset + index,
                Err(RemoteError::RemoteFault(
                    "no response for batch item".to_string(),
                )),
            );
        }
        Ok(())
    }
}

fn copy_result(part: &BatchResponsePart) -> Result<CopiedFile, RemoteError> {
    if !part.is_success() {
        let message = part.error_message();
        return Err(match part.status {
            404 => RemoteError::NotFound(message),
            400 => RemoteError::ValidationFault(message),
            _ => RemoteError::RemoteFault(message),
        });
    }
    let id = part
        .body
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RemoteError::ValidationFault("copy response without id".to_string()))?;
    Ok(CopiedFile {
        id: ItemId::new(id)?,
        name: part
            .body
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

#[async_trait::async_trait]
impl IRemoteFileStore for DriveFileStore {
    async fn get_metadata(&self, id: &ItemId) -> Result<FileItem, RemoteError> {
        let url = format!(
            "{}?fields={FILE_FIELDS}&supportsAllDrives=true",
            self.file_url(id)
        );
        let file: DriveFile = self.client.get_json(&url).await?;
        FileItem::try_from(file)
    }

    async fn list_children(
        &self,
        parent: &ItemId,
        filter: &ChildFilter,
        page_token: Option<&str>,
    ) -> Result<ChildPage, RemoteError> {
        let query = children_query(parent, filter);
        let page = self.list_page(&query, page_token, None).await?;
        Ok(ChildPage {
            items: page
                .files
                .into_iter()
                .map(FileItem::try_from)
                .collect::<Result<_, _>>()?,
            next_page_token: page.next_page_token,
        })
    }

    #[tracing::instrument(skip(self), fields(parent = %parent))]
    async fn create_folder(&self, name: &str, parent: &ItemId) -> Result<ItemId, RemoteError> {
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent.as_str()],
        });
        let url = format!("{}?fields=id&supportsAllDrives=true", self.files_url());
        let created: CreatedFile = self.client.post_json(&url, &body).await?;
        info!(id = %created.id, "Created folder");
        Ok(ItemId::new(created.id)?)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete_item(&self, id: &ItemId) -> Result<(), RemoteError> {
        let url = format!("{}?supportsAllDrives=true", self.file_url(id));
        self.client.delete(&url).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, plans, on_complete), fields(count = plans.len()))]
    async fn submit_copy_batch(
        &self,
        plans: &[CopyPlan],
        on_complete: &mut CopyCallback<'_>,
    ) -> Result<(), RemoteError> {
        for (n, chunk) in plans.chunks(self.max_batch_size).enumerate() {
            debug!(chunk = n, size = chunk.len(), "Submitting copy batch");
            self.submit_chunk(chunk, n * self.max_batch_size, on_complete)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[test]
    fn test_children_query_escapes() {
        let q = children_query(&id("p1"), &ChildFilter::all().named(r"it's a\b"));
        assert_eq!(
            q,
            r"'p1' in parents and trashed = false and name = 'it\'s a\\b'"
        );
    }

    #[test]
    fn test_children_query_kinds() {
        let q = children_query(&id("p1"), &ChildFilter::all().of_kind(ItemKind::Folder));
        assert!(q.ends_with("mimeType = 'application/vnd.google-apps.folder'"));
        let q = children_query(&id("p1"), &ChildFilter::all().of_kind(ItemKind::File));
        assert!(q.ends_with("mimeType != 'application/vnd.google-apps.folder'"));
    }

    #[test]
    fn test_explore_query() {
        let options = ExploreOptions {
            name_contains: Some("report".into()),
            mime_types: vec!["application/pdf".into(), "text/plain".into()],
            ..Default::default()
        };
        assert_eq!(
            explore_query(&id("f"), &options),
            "'f' in parents and trashed = false and name contains 'report' \
             and (mimeType = 'application/pdf' or mimeType = 'text/plain')"
        );

        let folders = ExploreOptions {
            folders_only: true,
            mime_types: vec!["ignored".into()],
            ..Default::default()
        };
        assert!(explore_query(&id("f"), &folders).ends_with(
            "and mimeType = 'application/vnd.google-apps.folder'"
        ));
    }

    #[test]
    fn test_drive_file_conversion() {
        let file: DriveFile = serde_json::from_value(json!({
            "id": "abc",
            "name": "Notes",
            "mimeType": FOLDER_MIME_TYPE,
            "modifiedTime": "2024-03-01T10:00:00.000Z",
            "parents": ["root_id"]
        }))
        .unwrap();
        let item = FileItem::try_from(file).unwrap();
        assert!(item.is_folder());
        assert_eq!(item.parent_ids, vec![id("root_id")]);
        assert!(item.modified_time.is_some());
        assert!(item.web_view_link.is_none());
    }

    #[test]
    fn test_copy_result_mapping() {
        let ok = BatchResponsePart {
            index: 0,
            status: 200,
            body: json!({"id": "c1", "name": "a"}),
        };
        assert_eq!(
            copy_result(&ok).unwrap(),
            CopiedFile {
                id: id("c1"),
                name: "a".into()
            }
        );

        let missing = BatchResponsePart {
            index: 0,
            status: 404,
            body: json!({"error": {"message": "File not found"}}),
        };
        assert_eq!(
            copy_result(&missing).unwrap_err(),
            RemoteError::NotFound("File not found".into())
        );
    }

    #[test]
    fn test_api_path_from_base_url() {
        let api = ApiConfig {
            drive_base_url: "http://127.0.0.1:9999/drive/v3/".into(),
            ..ApiConfig::default()
        };
        let store = DriveFileStore::new(Arc::new(GoogleClient::new("t")), &api);
        assert_eq!(store.api_path(), "/drive/v3");
    }
}
