//! Typed endpoints of the video catalog backend.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    types::Health, ApiClient, Category, ErrorKind, RequestOptions, Result, Statistics, Video,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// Video catalog API over an [`ApiClient`].
#[derive(Clone, Debug)]
pub struct VideoApi {
    client: ApiClient,
    options: RequestOptions,
}

impl VideoApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Sets the timeout, retry and cache behavior used for every call.
    ///
    /// The method and body are chosen per endpoint.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn get_videos(&self, limit: u32, offset: u32) -> Result<Vec<Video>> {
        self.get(&format!("/api/videos?limit={limit}&offset={offset}"))
            .await
    }

    /// Returns `None` when the backend reports the video as not found.
    pub async fn get_video(&self, video_id: i64) -> Result<Option<Video>> {
        match self.get(&format!("/api/videos/{video_id}")).await {
            Ok(video) => Ok(Some(video)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn search_videos(&self, keyword: &str, limit: u32, offset: u32) -> Result<Vec<Video>> {
        let keyword = urlencoding::encode(keyword);
        self.get(&format!(
            "/api/videos/search?keyword={keyword}&limit={limit}&offset={offset}"
        ))
        .await
    }

    pub async fn get_videos_by_category(
        &self,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Video>> {
        let category = urlencoding::encode(category);
        self.get(&format!(
            "/api/videos/category?category={category}&limit={limit}&offset={offset}"
        ))
        .await
    }

    pub async fn get_top_videos(&self, limit: u32) -> Result<Vec<Video>> {
        self.get(&format!("/api/videos/top?limit={limit}")).await
    }

    /// Increments the play counter; `false` if the backend rejected the call.
    pub async fn update_play_count(&self, video_id: i64) -> bool {
        let options = RequestOptions {
            cache_enabled: false,
            ..self.options.clone().method(reqwest::Method::POST)
        };
        self.client
            .fetch::<Value>(&format!("/api/videos/{video_id}/play"), &options)
            .await
            .is_ok()
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        self.get("/api/categories").await
    }

    pub async fn get_statistics(&self) -> Result<Statistics> {
        self.get("/api/statistics").await
    }

    /// `true` iff the backend answers with `status: "healthy"`.
    pub async fn health_check(&self) -> bool {
        matches!(
            self.get::<Health>("/api/health").await,
            Ok(health) if health.status == "healthy"
        )
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let options = RequestOptions {
            method: reqwest::Method::GET,
            body: None,
            ..self.options.clone()
        };
        self.client.fetch(endpoint, &options).await
    }
}
