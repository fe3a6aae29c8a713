use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    wire::{ApiEnvelope, ErrorBody},
    AppError, ErrorKind,
};

/// Maps a non-success status to the error kind the caller sees.
pub(crate) fn status_kind(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::UNAUTHORIZED => ErrorKind::Auth,
        _ => ErrorKind::Server,
    }
}

/// Builds the error for a non-success response.
///
/// The message comes from a JSON `message` field when present and non-empty,
/// otherwise it is `HTTP <status>`.
pub(crate) fn status_error(status: StatusCode, body: &str, url: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    AppError::new(status_kind(status), message)
        .with_status(status.as_u16())
        .with_url(url)
}

/// Parses a success body, which must be a JSON object or array.
pub(crate) fn parse_success_body(status: StatusCode, body: &str, url: &str) -> Result<Value, AppError> {
    let parse_error = || {
        AppError::from_kind(ErrorKind::Parse)
            .with_status(status.as_u16())
            .with_url(url)
    };

    if body.trim().is_empty() {
        return Err(parse_error());
    }
    let value: Value = serde_json::from_str(body).map_err(|_| parse_error())?;
    if !(value.is_object() || value.is_array()) {
        return Err(parse_error());
    }
    Ok(value)
}

/// Extracts the envelope's `data` and deserializes it into `T`.
///
/// Returns the typed value together with the raw `data` so it can be cached.
pub(crate) fn decode_payload<T: DeserializeOwned>(body: Value, url: &str) -> Result<(T, Value), AppError> {
    let invalid = |reason: String| {
        AppError::new(ErrorKind::Parse, format!("invalid API response envelope: {reason}"))
            .with_url(url)
    };
    if !body.is_object() {
        return Err(invalid("expected a JSON object".to_owned()));
    }
    let envelope: ApiEnvelope =
        serde_json::from_value(body).map_err(|err| invalid(err.to_string()))?;
    let data = decode_data(&envelope.data, url)?;
    Ok((data, envelope.data))
}

/// Deserializes an already-extracted `data` value into `T`.
pub(crate) fn decode_data<T: DeserializeOwned>(data: &Value, url: &str) -> Result<T, AppError> {
    T::deserialize(data).map_err(|err| {
        AppError::new(ErrorKind::Parse, format!("unexpected response data: {err}")).with_url(url)
    })
}
