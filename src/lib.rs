//! `social-api-http` is an async client for JSON APIs that answer with a
//! `{ code, message, data }` envelope.
//!
//! Every call goes through the same pipeline:
//! - an optional [`ResponseCache`] lookup for `GET`/`HEAD` requests
//! - one [`Executor`] attempt bounded by a timeout
//! - retries of transient failures with exponential backoff
//!
//! [`ApiClient::fetch`] returns `Result<T, AppError>`. [`ApiController`]
//! wraps the same pipeline for UI layers: it publishes a [`RequestState`]
//! instead of returning errors and owns cancellation of its current call.

mod cache;
mod catalog;
mod client;
mod config;
mod controller;
mod decode;
mod error;
mod executor;
mod options;
mod retry;
mod state;
mod types;
mod wire;

pub use cache::{cache_key, is_cacheable, ResponseCache};
pub use catalog::{VideoApi, DEFAULT_PAGE_SIZE, DEFAULT_TOP_LIMIT};
pub use client::ApiClient;
pub use config::{ApiConfig, ConfigSource, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
pub use controller::ApiController;
pub use error::{AppError, ErrorKind};
pub use executor::{Executor, HttpExecutor, PreparedRequest};
pub use options::RequestOptions;
pub use retry::backoff_delay;
pub use state::{RequestState, Status};
pub use types::{Category, Statistics, Video};

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, AppError>;
