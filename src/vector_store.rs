//! Remote vector index gateway.
//!
//! Defines the [`VectorIndex`] trait the reconciler and retriever are
//! written against, plus [`OpenAiVectorStore`], the implementation over
//! the OpenAI Files / Vector Stores HTTP API.
//!
//! Every HTTP request goes through the shared [`RetryPolicy`]: transient
//! failures (HTTP 429/5xx, network errors, per-request timeouts) are
//! retried with backoff and jitter; client errors propagate immediately.

use async_trait::async_trait;
use reqwest::{multipart, Method};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::config::Config;
use crate::retry::RetryPolicy;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const STORE_ID_ENV: &str = "OPENAI_VECTOR_STORE_ID";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Error taxonomy for gateway calls. [`StoreError::is_retryable`] is the
/// classification the retry policy runs on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation}: HTTP {status}: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("{operation}: unexpected response shape")]
    Malformed { operation: &'static str },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            StoreError::Network(_) => true,
            StoreError::MissingApiKey | StoreError::Malformed { .. } => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A file currently attached to the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub filename: String,
}

/// Outcome of waiting for the index to finish processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Ready,
    PartiallyFailed,
    TimedOut,
}

/// One ranked hit from the remote semantic search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub file_id: String,
    pub filename: String,
    pub score: f64,
    pub content: String,
}

/// Minimal contract the pipeline needs from the external store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the known store id when one is configured, otherwise create
    /// a new store with the given name.
    async fn create_or_get_store(&self, name: &str) -> StoreResult<String>;

    /// Upload file content; returns the remote file id. The file is not
    /// yet attached to any store.
    async fn upload_file(&self, filename: &str, content: &str) -> StoreResult<String>;

    /// Attach an uploaded file to the store.
    async fn attach_file(&self, store_id: &str, file_id: &str) -> StoreResult<()>;

    /// Detach a file from the store and delete the underlying file.
    /// "Already absent" is success, not failure.
    async fn detach_and_delete_file(&self, store_id: &str, file_id: &str) -> StoreResult<()>;

    /// List every file attached to the store, with its stored filename.
    async fn list_files(&self, store_id: &str) -> StoreResult<Vec<RemoteFile>>;

    /// Poll until the store has no files in progress, or `timeout` passes.
    async fn wait_until_processed(
        &self,
        store_id: &str,
        timeout: Duration,
    ) -> StoreResult<IndexStatus>;

    /// Semantic search over the store. Consumed by the retriever, not the
    /// reconciler.
    async fn search(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> StoreResult<Vec<SearchHit>>;
}

/// [`VectorIndex`] over the OpenAI Files / Vector Stores API.
pub struct OpenAiVectorStore {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    known_store_id: Option<String>,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl OpenAiVectorStore {
    /// Build a gateway from configuration and environment.
    ///
    /// Requires `OPENAI_API_KEY`. A known store id is taken from
    /// `OPENAI_VECTOR_STORE_ID`, falling back to `store.vector_store_id`
    /// in the config file.
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(StoreError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.retry.timeout_secs))
            .build()?;

        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let known_store_id = std::env::var(STORE_ID_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| config.store.vector_store_id.clone());

        Ok(Self {
            client,
            api_key,
            base_url,
            known_store_id,
            retry: RetryPolicy::from_config(&config.retry),
            poll_interval: Duration::from_secs(config.store.poll_interval_secs),
        })
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn read_json(operation: &'static str, response: reqwest::Response) -> StoreResult<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            operation,
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        })
    }

    async fn get_json(&self, operation: &'static str, url: String) -> StoreResult<Value> {
        let response = self.request(Method::GET, &url).send().await?;
        Self::read_json(operation, response).await
    }

    async fn post_json(
        &self,
        operation: &'static str,
        url: String,
        body: Value,
    ) -> StoreResult<Value> {
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        Self::read_json(operation, response).await
    }

    /// DELETE where 404 counts as success.
    async fn delete_tolerant(&self, operation: &'static str, url: String) -> StoreResult<()> {
        let response = self.request(Method::DELETE, &url).send().await?;
        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            if status.as_u16() == 404 {
                debug!(operation, "remote object already absent");
            }
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            operation,
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        })
    }

    async fn file_metadata(&self, file_id: &str) -> StoreResult<RemoteFile> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let json = self
            .retry
            .run("file_metadata", StoreError::is_retryable, || {
                self.get_json("file_metadata", url.clone())
            })
            .await?;
        let filename = json
            .get("filename")
            .and_then(Value::as_str)
            .ok_or(StoreError::Malformed {
                operation: "file_metadata",
            })?;
        Ok(RemoteFile {
            id: file_id.to_string(),
            filename: filename.to_string(),
        })
    }
}

#[async_trait]
impl VectorIndex for OpenAiVectorStore {
    async fn create_or_get_store(&self, name: &str) -> StoreResult<String> {
        if let Some(id) = &self.known_store_id {
            debug!(store_id = %id, "reusing configured vector store");
            return Ok(id.clone());
        }

        let url = format!("{}/vector_stores", self.base_url);
        let body = serde_json::json!({ "name": name });
        let json = self
            .retry
            .run("create_store", StoreError::is_retryable, || {
                self.post_json("create_store", url.clone(), body.clone())
            })
            .await?;

        json.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(StoreError::Malformed {
                operation: "create_store",
            })
    }

    async fn upload_file(&self, filename: &str, content: &str) -> StoreResult<String> {
        let url = format!("{}/files", self.base_url);
        let json = self
            .retry
            .run("upload_file", StoreError::is_retryable, || async {
                // The form is consumed per request, so it is rebuilt on
                // every attempt.
                let part = multipart::Part::text(content.to_string())
                    .file_name(filename.to_string());
                let form = multipart::Form::new()
                    .text("purpose", "assistants")
                    .part("file", part);
                let response = self
                    .request(Method::POST, &url)
                    .multipart(form)
                    .send()
                    .await?;
                Self::read_json("upload_file", response).await
            })
            .await?;

        json.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(StoreError::Malformed {
                operation: "upload_file",
            })
    }

    async fn attach_file(&self, store_id: &str, file_id: &str) -> StoreResult<()> {
        let url = format!("{}/vector_stores/{}/files", self.base_url, store_id);
        let body = serde_json::json!({ "file_id": file_id });
        self.retry
            .run("attach_file", StoreError::is_retryable, || {
                self.post_json("attach_file", url.clone(), body.clone())
            })
            .await?;
        Ok(())
    }

    async fn detach_and_delete_file(&self, store_id: &str, file_id: &str) -> StoreResult<()> {
        let detach_url = format!(
            "{}/vector_stores/{}/files/{}",
            self.base_url, store_id, file_id
        );
        self.retry
            .run("detach_file", StoreError::is_retryable, || {
                self.delete_tolerant("detach_file", detach_url.clone())
            })
            .await?;

        let delete_url = format!("{}/files/{}", self.base_url, file_id);
        self.retry
            .run("delete_file", StoreError::is_retryable, || {
                self.delete_tolerant("delete_file", delete_url.clone())
            })
            .await
    }

    async fn list_files(&self, store_id: &str) -> StoreResult<Vec<RemoteFile>> {
        let mut file_ids = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/vector_stores/{}/files?limit=100",
                self.base_url, store_id
            );
            if let Some(cursor) = &after {
                url.push_str("&after=");
                url.push_str(cursor);
            }

            let json = self
                .retry
                .run("list_files", StoreError::is_retryable, || {
                    self.get_json("list_files", url.clone())
                })
                .await?;

            let data = json
                .get("data")
                .and_then(Value::as_array)
                .ok_or(StoreError::Malformed {
                    operation: "list_files",
                })?;
            for item in data {
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or(StoreError::Malformed {
                        operation: "list_files",
                    })?;
                file_ids.push(id.to_string());
            }

            let has_more = json.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            after = json
                .get("last_id")
                .and_then(Value::as_str)
                .map(str::to_string);
            if !has_more || after.is_none() {
                break;
            }
        }

        // Vector-store file objects carry no filename; resolve each one
        // through the files endpoint.
        let mut files = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            files.push(self.file_metadata(&id).await?);
        }
        Ok(files)
    }

    async fn wait_until_processed(
        &self,
        store_id: &str,
        timeout: Duration,
    ) -> StoreResult<IndexStatus> {
        let url = format!("{}/vector_stores/{}", self.base_url, store_id);
        let deadline = Instant::now() + timeout;

        loop {
            let json = self
                .retry
                .run("poll_store", StoreError::is_retryable, || {
                    self.get_json("poll_store", url.clone())
                })
                .await?;

            let counts = json.get("file_counts").cloned().unwrap_or(Value::Null);
            let in_progress = counts
                .get("in_progress")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let failed = counts.get("failed").and_then(Value::as_u64).unwrap_or(0);

            if in_progress == 0 {
                return Ok(if failed > 0 {
                    IndexStatus::PartiallyFailed
                } else {
                    IndexStatus::Ready
                });
            }
            if Instant::now() >= deadline {
                return Ok(IndexStatus::TimedOut);
            }

            debug!(in_progress, "waiting for index processing");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn search(
        &self,
        store_id: &str,
        query: &str,
        max_results: usize,
    ) -> StoreResult<Vec<SearchHit>> {
        let url = format!("{}/vector_stores/{}/search", self.base_url, store_id);
        let body = serde_json::json!({
            "query": query,
            "max_num_results": max_results,
        });

        let json = self
            .retry
            .run("search", StoreError::is_retryable, || {
                self.post_json("search", url.clone(), body.clone())
            })
            .await?;

        let data = json
            .get("data")
            .and_then(Value::as_array)
            .ok_or(StoreError::Malformed { operation: "search" })?;

        let mut hits = Vec::with_capacity(data.len());
        for item in data {
            let content = item
                .get("content")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();

            hits.push(SearchHit {
                file_id: item
                    .get("file_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                filename: item
                    .get("filename")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                score: item.get("score").and_then(Value::as_f64).unwrap_or(0.0),
                content: content.trim().to_string(),
            });
        }
        Ok(hits)
    }
}
