use reqwest::Method;
use serde::Serialize;

use crate::{AppError, ErrorKind, Result};

/// Per-call request, timeout, retry and cache behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestOptions {
    /// HTTP method, `GET` by default.
    pub method: Method,
    /// Extra headers; these override the default `Content-Type`.
    pub headers: Vec<(String, String)>,
    /// Serialized request body.
    pub body: Option<String>,
    /// Per-attempt timeout in milliseconds. `None` uses the configured default.
    pub timeout_ms: Option<u64>,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Delay before the first retry; doubled for every further retry.
    pub retry_base_delay_ms: u64,
    /// Serve and store `GET`/`HEAD` responses through the response cache.
    pub cache_enabled: bool,
    /// Lifetime of a cached response in milliseconds.
    pub cache_ttl_ms: u64,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout_ms: None,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            cache_enabled: false,
            cache_ttl_ms: 60_000,
        }
    }
}

impl RequestOptions {
    /// Default options for a `GET` request.
    pub fn get() -> Self {
        Self::default()
    }

    /// Default options for a `POST` request.
    pub fn post() -> Self {
        Self::default().method(Method::POST)
    }

    /// Sets the HTTP method. Lowercase spellings of standard methods are
    /// normalized, so `get` is treated as `GET`.
    pub fn method(mut self, method: Method) -> Self {
        self.method = normalize_method(method);
        self
    }

    /// Adds a header; a later header with the same name wins.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, value: &B) -> Result<Self> {
        let body = serde_json::to_string(value).map_err(|err| {
            AppError::new(
                ErrorKind::Validation,
                format!("request body could not be serialized: {err}"),
            )
        })?;
        self.body = Some(body);
        Ok(self)
    }

    /// Overrides the configured per-attempt timeout.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets how many times a retryable failure is retried.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    pub fn retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    /// Enables the response cache with the given TTL.
    pub fn cached(mut self, ttl_ms: u64) -> Self {
        self.cache_enabled = true;
        self.cache_ttl_ms = ttl_ms;
        self
    }
}

/// Maps a mixed-case standard method such as `get` to its canonical form.
pub(crate) fn normalize_method(method: Method) -> Method {
    let name = method.as_str();
    if !name.bytes().any(|b| b.is_ascii_lowercase()) {
        return method;
    }
    match Method::from_bytes(name.to_ascii_uppercase().as_bytes()) {
        Ok(upper) if is_standard(&upper) => upper,
        _ => method,
    }
}

fn is_standard(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
        Method::CONNECT,
        Method::TRACE,
    ]
    .contains(method)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use reqwest::Method;

    use super::RequestOptions;
    use crate::ErrorKind;

    #[test]
    fn defaults() {
        let opts = RequestOptions::default();
        assert_eq!(opts.method, Method::GET);
        assert_eq!(opts.timeout_ms, None);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.retry_base_delay_ms, 1_000);
        assert!(!opts.cache_enabled);
        assert_eq!(opts.cache_ttl_ms, 60_000);
    }

    #[test]
    fn builders_compose() {
        let mut body = BTreeMap::new();
        body.insert("id", 7);
        let opts = RequestOptions::post()
            .header("Authorization", "Bearer t")
            .json(&body)
            .expect("map must serialize")
            .timeout_ms(500)
            .max_retries(0)
            .cached(5_000);

        assert_eq!(opts.method, Method::POST);
        assert_eq!(opts.body.as_deref(), Some(r#"{"id":7}"#));
        assert_eq!(opts.headers, vec![("Authorization".into(), "Bearer t".into())]);
        assert_eq!(opts.timeout_ms, Some(500));
        assert_eq!(opts.max_retries, 0);
        assert!(opts.cache_enabled);
        assert_eq!(opts.cache_ttl_ms, 5_000);
    }

    #[test]
    fn unserializable_json_body_is_validation_error() {
        let mut body = HashMap::new();
        body.insert((1u8, 2u8), 3u8);
        let err = RequestOptions::post()
            .json(&body)
            .expect_err("tuple keys cannot become JSON object keys");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());
        assert!(err.message().contains("could not be serialized"));
    }

    #[test]
    fn lowercase_methods_are_normalized() {
        let lower = Method::from_bytes(b"get").expect("valid token");
        assert_ne!(lower, Method::GET);
        assert_eq!(RequestOptions::default().method(lower).method, Method::GET);

        let head = Method::from_bytes(b"Head").expect("valid token");
        assert_eq!(RequestOptions::default().method(head).method, Method::HEAD);

        let custom = Method::from_bytes(b"purge").expect("valid token");
        assert_eq!(RequestOptions::default().method(custom).method.as_str(), "purge");
    }
}
