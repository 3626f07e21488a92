use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::{
    BackendError, CollectionMap, ExecutionOutcome, HealthReport, QueryBackend, QueryProposal,
};

const HEALTH_PATH: &str = "health/";
const CHAT_PATH: &str = "api/chat/";
const EXECUTE_PATH: &str = "api/execute-query/";
const COLLECTIONS_PATH: &str = "api/collections/";

/// Longest slice of a non-JSON error body kept for display.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Deserialize)]
struct CollectionsBody {
    #[serde(default)]
    collections: CollectionMap,
}

pub struct HttpBackend {
    base: Url,
    display: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = normalize_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            display: base.as_str().trim_end_matches('/').to_string(),
            base,
            client: builder.build()?,
        })
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn read(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(StatusCode, String), BackendError> {
        let res = request.send().await?;
        let status = res.status();
        let text = res.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "Backend responded");
        Ok((status, text))
    }
}

/// Parses the configured base URL and guarantees a trailing slash so endpoint
/// paths join underneath any path prefix instead of replacing it.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("API URL is empty");
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|e| anyhow!("invalid API URL '{}': {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("API URL '{}' must use http or https", raw);
    }
    Ok(url)
}

fn clip(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > ERROR_BODY_LIMIT {
        let head: String = trimmed.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// Decodes a `{success, error?, ...}` envelope.
///
/// A `success: false` body wins over the HTTP status because the backend
/// reports its own failures with a 400/500 and a JSON error message.
fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    text: &str,
) -> Result<T, BackendError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) if status.is_success() => return Err(BackendError::Decode(e.to_string())),
        Err(_) => {
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body: clip(text),
            });
        }
    };

    match value.get("success").and_then(Value::as_bool) {
        Some(false) => Err(BackendError::Reported(
            value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string(),
        )),
        _ if !status.is_success() => Err(BackendError::HttpStatus {
            status: status.as_u16(),
            body: clip(text),
        }),
        Some(true) => {
            serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
        }
        None => Err(BackendError::Decode(
            "response is missing the 'success' field".to_string(),
        )),
    }
}

/// Reads a health body on any status. Only a body that is not a JSON object
/// is an error; field mismatches come back as a degraded report.
fn decode_health(status: StatusCode, text: &str) -> Result<HealthReport, BackendError> {
    let report = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| HealthReport::from_value(&value));
    match report {
        Some(report) => Ok(report),
        None if !status.is_success() => Err(BackendError::HttpStatus {
            status: status.as_u16(),
            body: clip(text),
        }),
        None => Err(BackendError::Decode(format!(
            "health response is not a JSON object: {}",
            clip(text)
        ))),
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    fn endpoint(&self) -> &str {
        &self.display
    }

    async fn health(&self) -> Result<HealthReport, BackendError> {
        let url = self.url(HEALTH_PATH)?;
        let (status, text) = self.read(self.client.get(url)).await?;
        let report = decode_health(status, &text)?;
        if !report.is_healthy() {
            warn!(
                status = %report.status,
                message = %report.message,
                "Backend reported degraded health"
            );
        }
        Ok(report)
    }

    async fn generate_query(&self, question: &str) -> Result<QueryProposal, BackendError> {
        let url = self.url(CHAT_PATH)?;
        let payload = json!({ "question": question });
        let (status, text) = self.read(self.client.post(url).json(&payload)).await?;
        decode_envelope(status, &text)
    }

    async fn execute_query(
        &self,
        question: &str,
        query: &str,
    ) -> Result<ExecutionOutcome, BackendError> {
        let url = self.url(EXECUTE_PATH)?;
        let payload = json!({ "question": question, "query": query });
        let (status, text) = self.read(self.client.post(url).json(&payload)).await?;
        decode_envelope(status, &text)
    }

    async fn collections(&self) -> Result<CollectionMap, BackendError> {
        let url = self.url(COLLECTIONS_PATH)?;
        let (status, text) = self.read(self.client.get(url)).await?;
        let body: CollectionsBody = decode_envelope(status, &text)?;
        Ok(body.collections)
    }
}
