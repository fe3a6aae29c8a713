use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    cache::{cache_key, is_cacheable},
    decode::{decode_data, decode_payload},
    retry::backoff_delay,
    ApiConfig, ApiController, ConfigSource, Executor, HttpExecutor, PreparedRequest,
    RequestOptions, ResponseCache, Result,
};

#[derive(Clone)]
/// JSON API client with per-attempt timeout, retry backoff and response cache.
///
/// Cloning is cheap; clones share the executor, configuration and cache.
pub struct ApiClient {
    executor: Arc<dyn Executor>,
    config: Arc<dyn ConfigSource>,
    cache: ResponseCache,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url())
            .field("default_timeout_ms", &self.config.default_timeout_ms())
            .field("cache", &self.cache)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` with the default timeout.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::from_config(ApiConfig::new(base_url))
    }

    /// Creates a client from any configuration source.
    pub fn from_config(config: impl ConfigSource + 'static) -> Self {
        Self {
            executor: Arc::new(HttpExecutor::new()),
            config: Arc::new(config),
            cache: ResponseCache::new(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ApiConfig::from_env`] for the variables read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use social_api_http::ApiClient;
    ///
    /// let client = ApiClient::from_env().expect("invalid SOCIAL_API_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        ApiConfig::from_env().map(Self::from_config)
    }

    /// Replaces the request executor.
    pub fn with_executor(mut self, executor: impl Executor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Uses `cache`, typically a clone shared with other clients.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Creates a state-holding controller driven by this client.
    pub fn controller<T>(&self) -> ApiController<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        ApiController::new(self.clone())
    }

    /// Requests `endpoint` and decodes the envelope's `data` into `T`.
    ///
    /// Retryable failures are retried up to `options.max_retries` times with
    /// exponential backoff; the error of the last attempt is returned.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        self.run(endpoint, options, || {}).await
    }

    /// Shared body of [`ApiClient::fetch`] and [`ApiController::execute`].
    ///
    /// `on_loading` is called once, after a cache miss and before the first
    /// attempt.
    pub(crate) async fn run<T, F>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        on_loading: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(),
    {
        let url = format!("{}{}", self.config.base_url(), endpoint);
        let timeout_ms = options
            .timeout_ms
            .unwrap_or_else(|| self.config.default_timeout_ms());
        let request = PreparedRequest::new(url, options, Duration::from_millis(timeout_ms));

        let cache_key = (options.cache_enabled && is_cacheable(&options.method))
            .then(|| cache_key(&request.method, &request.url, request.body.as_deref()));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                match decode_data::<T>(&cached, &request.url) {
                    Ok(data) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(url = %request.url, "served from cache");
                        return Ok(data);
                    }
                    Err(_err) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(url = %request.url, error = %_err, "cached value does not decode, refetching");
                    }
                }
            }
        }

        on_loading();

        let mut attempts = 0usize;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(url = %request.url, method = %request.method, attempt = attempts + 1, "sending request");

            let result = self
                .executor
                .attempt(&request)
                .await
                .and_then(|body| decode_payload::<T>(body, &request.url));

            match result {
                Ok((data, raw)) => {
                    if let Some(key) = cache_key {
                        self.cache
                            .set(key, raw, Duration::from_millis(options.cache_ttl_ms));
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(url = %request.url, "request succeeded");
                    return Ok(data);
                }
                Err(error) => {
                    let retry = attempts;
                    attempts += 1;
                    if !error.is_retryable() || attempts > options.max_retries {
                        #[cfg(feature = "tracing")]
                        tracing::error!(
                            url = %request.url,
                            kind = %error.kind(),
                            status = ?error.http_status(),
                            attempts,
                            "request failed: {}",
                            error.message()
                        );
                        return Err(error);
                    }

                    let delay = backoff_delay(options.retry_base_delay_ms, retry);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        url = %request.url,
                        kind = %error.kind(),
                        "retrying request after {} ms",
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::ApiClient;
    use crate::{ConfigSource, Executor, PreparedRequest, RequestOptions, Result};

    #[derive(Clone, Default)]
    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Executor for CountingExecutor {
        async fn attempt(&self, _request: &PreparedRequest) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"code": 0, "message": "success", "data": [1, 2]}))
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_loading_hook() {
        let executor = CountingExecutor::default();
        let client = ApiClient::new("http://api.local").with_executor(executor.clone());
        let options = RequestOptions::get().cached(60_000);
        let loading = AtomicUsize::new(0);

        for _ in 0..2 {
            let data: Vec<u32> = client
                .run("/n", &options, || {
                    loading.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .expect("request must succeed");
            assert_eq!(data, vec![1, 2]);
        }

        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loading.load(Ordering::SeqCst), 1, "only the miss reports loading");
    }

    #[test]
    fn debug_shows_config_and_cache() {
        let client = ApiClient::new("http://api.local/");
        let debug = format!("{client:?}");
        assert!(debug.contains("http://api.local"));
        assert!(debug.contains("ResponseCache"));
    }

    #[test]
    fn clones_share_the_cache() {
        let client = ApiClient::new("http://api.local");
        let other = client.clone();
        other
            .cache()
            .set("k", serde_json::json!(1), std::time::Duration::from_secs(1));
        assert_eq!(client.cache().len(), 1);
    }

    #[test]
    fn from_config_accepts_custom_sources() {
        struct Fixed;
        impl ConfigSource for Fixed {
            fn base_url(&self) -> String {
                "http://fixed".to_owned()
            }
            fn default_timeout_ms(&self) -> u64 {
                5
            }
        }
        let debug = format!("{:?}", ApiClient::from_config(Fixed));
        assert!(debug.contains("http://fixed"));
        assert!(debug.contains("default_timeout_ms: 5"));
    }
}
