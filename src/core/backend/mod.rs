mod http;

pub use http::HttpBackend;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Body of `GET /health/`.
///
/// Fields are read one by one from the JSON object. A missing or wrong-typed
/// field takes its default, so a malformed report reads as "not healthy"
/// instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub mongodb_connected: bool,
    pub collections_count: Option<u64>,
}

impl HealthReport {
    /// `None` when the body is not a JSON object at all.
    pub fn from_value(value: &Value) -> Option<Self> {
        let body = value.as_object()?;
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            status: text("status"),
            message: text("message"),
            mongodb_connected: body
                .get("mongodb_connected")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            collections_count: body.get("collections_count").and_then(Value::as_u64),
        })
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.mongodb_connected
    }
}

/// A query proposed by `POST /api/chat/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryProposal {
    #[serde(default)]
    pub question: String,
    pub query: String,
}

/// Successful body of `POST /api/execute-query/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutionOutcome {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct CollectionInfo {
    pub fields: Vec<String>,
    pub document_count: u64,
}

pub type CollectionMap = BTreeMap<String, CollectionInfo>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a usable response (refused, reset, timed out).
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// `{"success": false, "error": ...}` from the backend.
    #[error("{0}")]
    Reported(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl BackendError {
    /// True for everything except a failure the backend itself reported.
    pub fn is_transport(&self) -> bool {
        !matches!(self, BackendError::Reported(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Transport(format!("request timed out: {}", err))
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// The four calls the chat client makes against the query backend.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Base URL the backend is reached at, for display only.
    fn endpoint(&self) -> &str;

    async fn health(&self) -> Result<HealthReport, BackendError>;

    async fn generate_query(&self, question: &str) -> Result<QueryProposal, BackendError>;

    async fn execute_query(
        &self,
        question: &str,
        query: &str,
    ) -> Result<ExecutionOutcome, BackendError>;

    async fn collections(&self) -> Result<CollectionMap, BackendError>;
}

/// One display line per collection, sorted by name.
pub fn summarize_collections(collections: &CollectionMap) -> Vec<String> {
    collections
        .iter()
        .map(|(name, info)| {
            let noun = if info.document_count == 1 {
                "document"
            } else {
                "documents"
            };
            if info.fields.is_empty() {
                format!("{} ({} {})", name, info.document_count, noun)
            } else {
                let mut fields = info.fields.clone();
                fields.sort();
                format!(
                    "{} ({} {}) fields: {}",
                    name,
                    info.document_count,
                    noun,
                    fields.join(", ")
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_report_requires_status_and_connection_flag() {
        let healthy = HealthReport::from_value(&json!({
            "status": "healthy",
            "message": "ok",
            "mongodb_connected": true,
            "collections_count": 3
        }))
        .unwrap();
        assert!(healthy.is_healthy());
        assert_eq!(healthy.collections_count, Some(3));

        let missing_flag = HealthReport::from_value(&json!({ "status": "healthy" })).unwrap();
        assert!(!missing_flag.is_healthy());

        let errored = HealthReport::from_value(&json!({
            "status": "error",
            "message": "Health check failed: timeout",
            "mongodb_connected": false
        }))
        .unwrap();
        assert!(!errored.is_healthy());
        assert_eq!(errored.collections_count, None);
    }

    #[test]
    fn wrong_typed_health_fields_read_as_degraded() {
        let stringly = HealthReport::from_value(&json!({
            "status": "healthy",
            "mongodb_connected": "yes",
            "collections_count": "2"
        }))
        .unwrap();
        assert!(!stringly.is_healthy());
        assert_eq!(stringly.collections_count, None);

        let numeric_status = HealthReport::from_value(&json!({
            "status": 1,
            "message": null,
            "mongodb_connected": true
        }))
        .unwrap();
        assert!(!numeric_status.is_healthy());
        assert_eq!(numeric_status.message, "");
    }

    #[test]
    fn health_report_ignores_fields_it_does_not_read() {
        let report = HealthReport::from_value(&json!({
            "status": "healthy",
            "mongodb_connected": true,
            "collections_count": 2,
            "collections": null
        }))
        .unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.collections_count, Some(2));

        assert!(HealthReport::from_value(&json!(["healthy"])).is_none());
        assert!(HealthReport::from_value(&json!("healthy")).is_none());
    }

    #[test]
    fn only_reported_failures_are_not_transport() {
        assert!(BackendError::Transport("refused".into()).is_transport());
        assert!(
            BackendError::HttpStatus {
                status: 502,
                body: String::new()
            }
            .is_transport()
        );
        assert!(BackendError::Decode("eof".into()).is_transport());
        assert!(!BackendError::Reported("Question is required".into()).is_transport());
    }

    #[test]
    fn summarize_collections_sorts_fields_and_pluralizes() {
        let mut map = CollectionMap::new();
        map.insert(
            "orders".to_string(),
            CollectionInfo {
                fields: vec!["status".into(), "_id".into(), "amount".into()],
                document_count: 12,
            },
        );
        map.insert(
            "audit".to_string(),
            CollectionInfo {
                fields: vec![],
                document_count: 1,
            },
        );
        let lines = summarize_collections(&map);
        assert_eq!(
            lines,
            vec![
                "audit (1 document)".to_string(),
                "orders (12 documents) fields: _id, amount, status".to_string(),
            ]
        );
    }
}
