use crate::error::{Md2NotionError, Result};
use crate::types::UploadConfig;
use reqwest::Method;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Bounded exponential backoff: `base_backoff * 2^attempt` after each
/// retryable failure, up to `max_retries` retries beyond the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts the policy. The operation is a factory so each attempt issues a
/// fresh request; tests drive it with fake operations and a zero backoff.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let backoff = policy.base_backoff * 2u32.saturating_pow(attempt);
                warn!(
                    "Transient failure (retry {}/{}): {}; backing off {:?}",
                    attempt + 1,
                    policy.max_retries,
                    err,
                    backoff
                );
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Maps a non-success Notion response status onto the error taxonomy.
/// 429 and 5xx are retryable; 401/404 and other 4xx abort the document.
fn classify(status: u16, message: String) -> Md2NotionError {
    match status {
        401 => Md2NotionError::Auth { message },
        404 => Md2NotionError::NotFound { message },
        429 => Md2NotionError::RateLimited { message },
        500..=599 => Md2NotionError::Server { status, message },
        _ => Md2NotionError::Api { status, message },
    }
}

/// Thin Notion API client covering only what the import needs: a
/// connectivity probe, child-page creation, and ordered append of block
/// batches under a page.
pub struct NotionClient {
    http: reqwest::Client,
    token: String,
    config: UploadConfig,
}

impl NotionClient {
    pub fn new(token: impl Into<String>, config: UploadConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            token: token.into(),
            config,
        })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.config.max_retries,
            base_backoff: self.config.retry_backoff,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", NOTION_API_BASE, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// `GET /users/me`; returns the integration name on success.
    pub async fn test_connection(&self) -> Result<String> {
        let response = self.request(Method::GET, "/users/me").send().await?;
        let body = Self::check(response).await?;
        Ok(body
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }

    /// Creates an empty child page under `parent_id` and returns its ID.
    /// Blocks are appended afterwards in batches rather than inlined here,
    /// so one code path handles documents of every size.
    pub async fn create_page(&self, parent_id: &str, title: &str) -> Result<String> {
        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": { "title": [{ "text": { "content": title } }] },
            "children": [],
        });

        let policy = self.retry_policy();
        let page = with_retries(&policy, || {
            let request = self.request(Method::POST, "/pages").json(&body);
            async move { Self::check(request.send().await?).await }
        })
        .await?;

        let page_id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Md2NotionError::Api {
                status: 200,
                message: "Page creation response carried no id".to_string(),
            })?
            .to_string();

        if let Some(url) = page.get("url").and_then(Value::as_str) {
            info!("Created page '{}': {}", title, url);
        }
        Ok(page_id)
    }

    /// Appends `chunks` under `block_id` strictly in order, one request per
    /// chunk, pausing `request_delay` between requests to respect the ~3
    /// req/s rate limit. A chunk that still fails after retries aborts the
    /// remaining chunks; blocks already appended stay on the page (the API
    /// is append-only, partial upload is a visible outcome).
    pub async fn append_batches(&self, block_id: &str, chunks: &[Vec<Value>]) -> Result<usize> {
        let policy = self.retry_policy();
        let path = format!("/blocks/{}/children", block_id);
        let mut sent = 0;

        for (idx, chunk) in chunks.iter().enumerate() {
            if idx > 0 {
                sleep(self.config.request_delay).await;
            }

            let result = with_retries(&policy, || {
                let request = self
                    .request(Method::PATCH, &path)
                    .json(&json!({ "children": chunk }));
                async move { Self::check(request.send().await?).await }
            })
            .await;

            if let Err(err) = result {
                warn!(
                    "Aborting after batch {}/{}: {} blocks already appended remain on the page",
                    idx + 1,
                    chunks.len(),
                    sent
                );
                return Err(err);
            }

            sent += chunk.len();
            debug!("Appended batch {}/{} ({} blocks)", idx + 1, chunks.len(), chunk.len());
        }

        Ok(sent)
    }

    async fn check(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let message = Self::error_message(response).await;
        Err(classify(status.as_u16(), message))
    }

    /// Notion error bodies carry a human-readable `message`; fall back to
    /// the raw body when the response is not the expected JSON shape.
    async fn error_message(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(text)
    }
}
