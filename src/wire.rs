use serde::Deserialize;
use serde_json::Value;

/// Success envelope returned by the backend: `{ code, message, data }`.
///
/// Only `data` is read; `code` and `message` are accepted in any shape.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub data: Value,
}

/// Best-effort body of a non-success response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
