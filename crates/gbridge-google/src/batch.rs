//! Drive batch requests (`multipart/mixed`)
//!
//! A batch is one POST to the batch endpoint whose body carries several
//! embedded HTTP requests. Each part is tagged with a `Content-ID`; the
//! server answers with a `multipart/mixed` body whose parts carry
//! `response-<id>` and the embedded HTTP response, in any order.

use serde_json::{json, Value};

use gbridge_core::domain::CopyPlan;

use crate::GoogleError;

/// Prefix of the per-part `Content-ID` values
const CONTENT_ID_PREFIX: &str = "item";

/// Fields requested from each copy response
pub const COPY_FIELDS: &str = "id,name";

/// Encoded batch body ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchBody {
    pub boundary: String,
    pub body: String,
}

impl BatchBody {
    /// Value for the outer `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }
}

/// One embedded response of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponsePart {
    /// Position of the matching request in the batch
    pub index: usize,
    /// HTTP status of the embedded response
    pub status: u16,
    /// Parsed JSON body, `Null` when empty or not JSON
    pub body: Value,
}

impl BatchResponsePart {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `error.message` of a failed part, or the status line
    pub fn error_message(&self) -> String {
        self.body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

/// Encode copy plans as a batch of `files.copy` calls
///
/// `api_path` is the path prefix of the Drive API (e.g. `/drive/v3`);
/// embedded requests use paths, not absolute URLs.
pub fn encode_copy_batch(plans: &[CopyPlan], api_path: &str, boundary: &str) -> BatchBody {
    let api_path = api_path.trim_end_matches('/');
    let mut body = String::new();

    for (i, plan) in plans.iter().enumerate() {
        let payload = json!({
            "name": plan.target_name,
            "parents": [plan.destination_folder_id.as_str()],
        });
        body.push_str(&format!("--{boundary}\r\n"));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str(&format!("Content-ID: <{CONTENT_ID_PREFIX}{i}>\r\n\r\n"));
        body.push_str(&format!(
            "POST {api_path}/files/{}/copy?fields={COPY_FIELDS}&supportsAllDrives=true HTTP/1.1\r\n",
            plan.source_id
        ));
        body.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.push_str(&payload.to_string());
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    BatchBody {
        boundary: boundary.to_string(),
        body,
    }
}

/// Extract the boundary parameter of a `multipart/mixed` content type
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Parse a batch response body into its embedded responses
///
/// Parts whose `Content-ID` cannot be mapped back to a request index are
/// dropped; the caller reports the requests that got no answer.
pub fn parse_batch_response(
    content_type: &str,
    body: &str,
) -> Result<Vec<BatchResponsePart>, GoogleError> {
    let boundary = boundary_from_content_type(content_type).ok_or_else(|| {
        GoogleError::InvalidResponse(format!("batch response without boundary: {content_type}"))
    })?;
    let normalized = body.replace("\r\n", "\n");
    let delimiter = format!("--{boundary}");

    let mut parts = Vec::new();
    for chunk in normalized.split(delimiter.as_str()).skip(1) {
        if chunk.starts_with("--") {
            break;
        }
        if let Some(part) = parse_part(chunk)? {
            parts.push(part);
        }
    }
    Ok(parts)
}

fn parse_part(chunk: &str) -> Result<Option<BatchResponsePart>, GoogleError> {
    let chunk = chunk.trim_start_matches('\n');
    let (outer_headers, inner) = chunk
        .split_once("\n\n")
        .ok_or_else(|| GoogleError::InvalidResponse("batch part without body".into()))?;

    let Some(index) = outer_headers.lines().find_map(content_id_index) else {
        return Ok(None);
    };

    let (status_and_headers, payload) = inner.split_once("\n\n").unwrap_or((inner, ""));
    let status_line = status_and_headers.lines().next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            GoogleError::InvalidResponse(format!("bad status line in batch part: {status_line}"))
        })?;

    let payload = payload.trim();
    let body = if payload.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(payload).unwrap_or(Value::Null)
    };

    Ok(Some(BatchResponsePart {
        index,
        status,
        body,
    }))
}

fn content_id_index(header: &str) -> Option<usize> {
    let (name, value) = header.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-id") {
        return None;
    }
    let id = value.trim().trim_start_matches('<').trim_end_matches('>');
    let id = id.strip_prefix("response-").unwrap_or(id);
    id.strip_prefix(CONTENT_ID_PREFIX)?.parse().ok()
}
