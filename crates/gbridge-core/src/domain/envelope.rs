//! Uniform result envelope
//!
//! Every user-facing operation reports its outcome in the same shape:
//!
//! ```json
//! {
//!   "status": "success",
//!   "response": { "meta_data": {...}, "data": {...}, "message": "..." },
//!   "message": "..."
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Outcome tag of an [`Envelope`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Skipped,
    Error,
}

/// Payload half of an [`Envelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    pub meta_data: Value,
    pub data: Value,
    pub message: String,
}

/// Tagged result of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub response: EnvelopeResponse,
    pub message: String,
}

impl Envelope {
    fn build(status: EnvelopeStatus, message: String, meta_data: Value, data: Value) -> Self {
        Self {
            status,
            response: EnvelopeResponse {
                meta_data,
                data,
                message: message.clone(),
            },
            message,
        }
    }

    pub fn success(message: impl Into<String>, meta_data: Value, data: Value) -> Self {
        Self::build(EnvelopeStatus::Success, message.into(), meta_data, data)
    }

    /// Success whose data is `{"records": [meta_data]}`
    pub fn success_record(message: impl Into<String>, meta_data: Value) -> Self {
        let data = json!({ "records": [meta_data.clone()] });
        Self::build(EnvelopeStatus::Success, message.into(), meta_data, data)
    }

    pub fn skipped(message: impl Into<String>, meta_data: Value) -> Self {
        let data = json!({ "records": [meta_data.clone()] });
        Self::build(EnvelopeStatus::Skipped, message.into(), meta_data, data)
    }

    pub fn error(message: impl Into<String>, meta_data: Value) -> Self {
        Self::build(EnvelopeStatus::Error, message.into(), meta_data, Value::Null)
    }

    /// Build an error envelope from any displayable error
    pub fn from_error(err: impl std::fmt::Display, meta_data: Value) -> Self {
        Self::error(format!("Error: {err}"), meta_data)
    }

    /// Replace the data payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.response.data = data;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}
