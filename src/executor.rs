use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use crate::{
    decode::{parse_success_body, status_error},
    options::normalize_method,
    AppError, ErrorKind, RequestOptions, Result,
};

/// A single, fully resolved HTTP call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    /// Base URL joined with the endpoint, including the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Deadline of this attempt.
    pub timeout: Duration,
}

impl PreparedRequest {
    pub fn new(url: impl Into<String>, options: &RequestOptions, timeout: Duration) -> Self {
        Self {
            method: normalize_method(options.method.clone()),
            url: url.into(),
            headers: options.headers.clone(),
            body: options.body.clone(),
            timeout,
        }
    }
}

/// Performs one attempt of a request and returns the parsed JSON body.
///
/// Implementations must bound the attempt by [`PreparedRequest::timeout`] and
/// report failures as [`AppError`]. Dropping the returned future abandons the
/// attempt.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn attempt(&self, request: &PreparedRequest) -> Result<Value>;
}

/// [`Executor`] backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpExecutor {
    http: reqwest::Client,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest` client (proxy, TLS roots, pool settings).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn send(&self, request: &PreparedRequest) -> Result<Value> {
        let headers = build_headers(&request.headers, &request.url)?;
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| classify_transport(&err, &request.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport(&err, &request.url))?;

        if !status.is_success() {
            return Err(status_error(status, &body, &request.url));
        }
        parse_success_body(status, &body, &request.url)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn attempt(&self, request: &PreparedRequest) -> Result<Value> {
        match tokio::time::timeout(request.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AppError::from_kind(ErrorKind::Timeout).with_url(&request.url)),
        }
    }
}

/// Default `Content-Type: application/json`, overridden by caller headers.
fn build_headers(extra: &[(String, String)], url: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let invalid = || {
            AppError::new(ErrorKind::Validation, format!("invalid request header '{name}'"))
                .with_url(url)
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn classify_transport(err: &reqwest::Error, url: &str) -> AppError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(url, error = %err, kind = %kind, "transport failure");

    AppError::from_kind(kind).with_url(url)
}
