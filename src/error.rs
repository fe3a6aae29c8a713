use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Failure category of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, reset or any other transport fault.
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// The attempt did not complete within its timeout.
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    /// Non-success HTTP status other than 401 and 404.
    #[serde(rename = "SERVER_ERROR")]
    Server,
    /// Response body was empty, not JSON, or not the expected shape.
    #[serde(rename = "PARSE_ERROR")]
    Parse,
    /// The request could not be built from the supplied options.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// HTTP 401.
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    /// HTTP 404.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    /// Wire code of this kind, e.g. `"TIMEOUT_ERROR"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Bilingual (Chinese / English) user-facing message.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Network => "网络连接失败 / Network connection failed",
            Self::Timeout => "请求超时 / Request timeout",
            Self::Server => "服务器错误 / Server error",
            Self::Parse => "数据解析失败 / Data parse error",
            Self::Validation => "数据验证失败 / Validation error",
            Self::Auth => "认证失败 / Authentication failed",
            Self::NotFound => "资源未找到 / Resource not found",
            Self::Unknown => "未知错误 / Unknown error",
        }
    }

    /// Whether failures of this kind are transient by default.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type returned by this crate.
///
/// Built only through [`AppError::new`] / [`AppError::from_kind`] and the
/// `with_*` builders; `retryable` follows [`ErrorKind::is_retryable`] unless
/// overridden with [`AppError::with_retryable`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
    retryable: bool,
    created_at_ms: u64,
}

impl AppError {
    /// Creates an error with an explicit message, stamped with the current time.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            source_url: None,
            retryable: kind.is_retryable(),
            created_at_ms: now_ms(),
        }
    }

    /// Creates an error carrying the kind's default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Attaches the HTTP status of the failed response.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attaches the URL of the failed request.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Overrides the kind-derived retryable flag.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::{AppError, ErrorKind};

    #[test]
    fn retryable_follows_kind() {
        for kind in [ErrorKind::Network, ErrorKind::Timeout, ErrorKind::Server] {
            assert!(AppError::from_kind(kind).is_retryable(), "{kind}");
        }
        for kind in [
            ErrorKind::Parse,
            ErrorKind::Validation,
            ErrorKind::Auth,
            ErrorKind::NotFound,
            ErrorKind::Unknown,
        ] {
            assert!(!AppError::from_kind(kind).is_retryable(), "{kind}");
        }
    }

    #[test]
    fn explicit_override_wins() {
        let err = AppError::from_kind(ErrorKind::Server).with_retryable(false);
        assert!(!err.is_retryable());
        let err = AppError::from_kind(ErrorKind::Auth).with_retryable(true);
        assert!(err.is_retryable());
    }

    #[test]
    fn display_and_serialize_use_wire_code() {
        let err = AppError::new(ErrorKind::Server, "boom")
            .with_status(500)
            .with_url("http://api/x");
        assert_eq!(err.to_string(), "SERVER_ERROR: boom");

        let json = serde_json::to_value(&err).expect("error must serialize");
        assert_eq!(json["kind"], "SERVER_ERROR");
        assert_eq!(json["http_status"], 500);
        assert_eq!(json["source_url"], "http://api/x");
        assert_eq!(json["retryable"], true);
    }

    #[test]
    fn from_kind_uses_bilingual_message() {
        let err = AppError::from_kind(ErrorKind::Timeout);
        assert_eq!(err.message(), "请求超时 / Request timeout");
        assert!(err.http_status().is_none());
        assert!(err.source_url().is_none());
        assert!(err.created_at_ms() > 0);
    }
}
