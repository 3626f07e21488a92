use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::backend::{
    BackendError, CollectionMap, ExecutionOutcome, HealthReport, QueryBackend, QueryProposal,
};
use crate::core::session::{ConnectionState, QuerySession};

/// Scripted backend that records every call it receives.
/// Any response left unset behaves like a refused connection.
#[derive(Default)]
pub(super) struct FakeBackend {
    health: Option<Result<HealthReport, BackendError>>,
    generate: Option<Result<QueryProposal, BackendError>>,
    execute: Option<Result<ExecutionOutcome, BackendError>>,
    calls: Mutex<Vec<String>>,
}

fn refused() -> BackendError {
    BackendError::Transport("connection refused".to_string())
}

impl FakeBackend {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn with_health(mut self, outcome: Result<HealthReport, BackendError>) -> Self {
        self.health = Some(outcome);
        self
    }

    pub(super) fn with_generate(mut self, outcome: Result<QueryProposal, BackendError>) -> Self {
        self.generate = Some(outcome);
        self
    }

    pub(super) fn with_execute(mut self, outcome: Result<ExecutionOutcome, BackendError>) -> Self {
        self.execute = Some(outcome);
        self
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl QueryBackend for FakeBackend {
    fn endpoint(&self) -> &str {
        "fake://backend"
    }

    async fn health(&self) -> Result<HealthReport, BackendError> {
        self.record("health".to_string());
        self.health.clone().unwrap_or_else(|| Err(refused()))
    }

    async fn generate_query(&self, question: &str) -> Result<QueryProposal, BackendError> {
        self.record(format!("generate:{}", question));
        self.generate.clone().unwrap_or_else(|| Err(refused()))
    }

    async fn execute_query(
        &self,
        question: &str,
        query: &str,
    ) -> Result<ExecutionOutcome, BackendError> {
        self.record(format!("execute:{}|{}", question, query));
        self.execute.clone().unwrap_or_else(|| Err(refused()))
    }

    async fn collections(&self) -> Result<CollectionMap, BackendError> {
        self.record("collections".to_string());
        Err(refused())
    }
}

pub(super) fn healthy(collections_count: Option<u64>) -> HealthReport {
    HealthReport {
        status: "healthy".to_string(),
        message: "MongoDB AI Chat API is running".to_string(),
        mongodb_connected: true,
        collections_count,
    }
}

pub(super) fn proposal(question: &str, query: &str) -> QueryProposal {
    QueryProposal {
        question: question.to_string(),
        query: query.to_string(),
    }
}

pub(super) fn outcome(result: serde_json::Value, answer: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        question: String::new(),
        query: String::new(),
        result,
        answer: answer.to_string(),
    }
}

/// A session that already passed its health check.
pub(super) fn connected_session() -> QuerySession {
    let mut session = QuerySession::new();
    session.apply_health(Ok(healthy(Some(3))));
    assert_eq!(session.connection(), ConnectionState::Connected);
    assert!(session.log().is_empty());
    session
}
