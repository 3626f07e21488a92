//! The query approval session.
//!
//! A session sequences two backend calls into a confirm-before-execute flow:
//! a question produces a proposed query, and only an explicit approval sends
//! that exact query for execution. Everything that happens is appended to a
//! [`ConversationLog`].
//!
//! Each operation comes in two halves so a frontend can run the network call
//! on another task: `begin_*` checks preconditions and records the request,
//! `apply_*` records the outcome. The `async` wrappers (`submit_question`,
//! `resolve_proposal`, `check_backend_health`) run both halves around the call
//! for callers that can simply await.

mod log;
#[cfg(test)]
mod tests;

pub use log::{ConversationLog, EMPTY_RESULT_TEXT, Event, EventKind, NoticeLevel};

use tracing::{debug, info, warn};

use crate::core::backend::{
    BackendError, ExecutionOutcome, HealthReport, QueryBackend, QueryProposal,
};
use crate::core::safety;

pub const CANCELLED_NOTICE: &str = "Query execution cancelled.";
pub const EMPTY_DATABASE_NOTICE: &str =
    "Connected, but the database has no collections. Every query will come back empty.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Checking,
    Connected,
    Error,
}

/// A generated query waiting for the user to approve or cancel it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProposal {
    pub question: String,
    pub query: String,
}

#[derive(Debug)]
pub struct QuerySession {
    log: ConversationLog,
    pending: Option<PendingProposal>,
    connection: ConnectionState,
    busy: bool,
    draft: String,
}

impl Default for QuerySession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySession {
    pub fn new() -> Self {
        Self {
            log: ConversationLog::new(),
            pending: None,
            connection: ConnectionState::Checking,
            busy: false,
            draft: String::new(),
        }
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn pending(&self) -> Option<&PendingProposal> {
        self.pending.as_ref()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The question being typed.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.log.append(Event::notice(level, message));
    }

    // ── health ──

    pub fn begin_health_check(&mut self) {
        self.connection = ConnectionState::Checking;
    }

    pub fn apply_health(&mut self, outcome: Result<HealthReport, BackendError>) {
        match outcome {
            Ok(report) if report.is_healthy() => {
                self.connection = ConnectionState::Connected;
                info!(collections = ?report.collections_count, "Query backend is healthy");
                if report.collections_count == Some(0) {
                    self.notice(NoticeLevel::Warning, EMPTY_DATABASE_NOTICE);
                }
            }
            Ok(report) => {
                self.connection = ConnectionState::Error;
                let detail = if report.message.is_empty() {
                    format!("backend status '{}'", report.status)
                } else {
                    report.message
                };
                self.notice(
                    NoticeLevel::Error,
                    format!("Database connection failed: {}", detail),
                );
            }
            Err(err) => {
                self.connection = ConnectionState::Error;
                warn!("Health check could not reach the backend: {}", err);
                self.notice(
                    NoticeLevel::Error,
                    format!("Cannot reach the query backend: {}", err),
                );
            }
        }
    }

    pub async fn check_backend_health<B: QueryBackend + ?Sized>(&mut self, backend: &B) {
        self.begin_health_check();
        let outcome = backend.health().await;
        self.apply_health(outcome);
    }

    // ── question -> proposal ──

    /// Accepts a question if it is non-blank, nothing is in flight and the
    /// backend is connected. On acceptance the draft is cleared, the question
    /// is logged and the trimmed text is returned for the generate call.
    /// Anything else is ignored.
    pub fn begin_question(&mut self, text: &str) -> Option<String> {
        let question = text.trim();
        if question.is_empty() {
            debug!("Ignoring blank question");
            return None;
        }
        if self.busy {
            debug!("Ignoring question while a request is in flight");
            return None;
        }
        if self.connection != ConnectionState::Connected {
            debug!(state = ?self.connection, "Ignoring question while not connected");
            return None;
        }

        let question = question.to_string();
        self.draft.clear();
        self.busy = true;
        self.log.append(Event::user_question(question.clone()));
        Some(question)
    }

    pub fn apply_generation(
        &mut self,
        question: String,
        outcome: Result<QueryProposal, BackendError>,
    ) {
        self.busy = false;
        match outcome {
            Ok(proposal) => {
                let warnings = safety::scan_query(&proposal.query);
                if !warnings.is_empty() {
                    warn!(
                        query = %proposal.query,
                        ?warnings,
                        "Proposed query contains write operations"
                    );
                }
                self.log.append(Event::generated_query(
                    question.clone(),
                    proposal.query.clone(),
                    warnings,
                ));
                self.pending = Some(PendingProposal {
                    question,
                    query: proposal.query,
                });
            }
            Err(err) => {
                let message = failure_notice("Query generation", &err);
                self.notice(NoticeLevel::Error, message);
            }
        }
    }

    pub async fn submit_question<B: QueryBackend + ?Sized>(&mut self, backend: &B, text: &str) {
        let Some(question) = self.begin_question(text) else {
            return;
        };
        let outcome = backend.generate_query(&question).await;
        self.apply_generation(question, outcome);
    }

    // ── proposal -> execution ──

    /// Consumes the pending proposal. A cancel is fully handled here and
    /// returns `None`; an approval returns the proposal to execute.
    pub fn begin_resolution(&mut self, approve: bool) -> Option<PendingProposal> {
        if self.busy {
            debug!("Ignoring proposal resolution while a request is in flight");
            return None;
        }
        let Some(proposal) = self.pending.take() else {
            debug!("Ignoring proposal resolution with nothing pending");
            return None;
        };
        if !approve {
            info!(query = %proposal.query, "Proposal cancelled");
            self.notice(NoticeLevel::Info, CANCELLED_NOTICE);
            return None;
        }
        info!(query = %proposal.query, "Proposal approved");
        self.busy = true;
        Some(proposal)
    }

    pub fn apply_execution(
        &mut self,
        proposal: PendingProposal,
        outcome: Result<ExecutionOutcome, BackendError>,
    ) {
        self.busy = false;
        match outcome {
            Ok(outcome) => {
                let answer = if outcome.answer.trim().is_empty() {
                    "The backend returned no answer for this result.".to_string()
                } else {
                    outcome.answer.clone()
                };
                self.log.append(Event::execution_result(
                    proposal.question,
                    proposal.query,
                    outcome.result,
                    outcome.answer,
                ));
                self.notice(NoticeLevel::Info, answer);
            }
            Err(err) => {
                let message = failure_notice("Query execution", &err);
                self.notice(NoticeLevel::Error, message);
            }
        }
    }

    pub async fn resolve_proposal<B: QueryBackend + ?Sized>(
        &mut self,
        backend: &B,
        approve: bool,
    ) {
        let Some(proposal) = self.begin_resolution(approve) else {
            return;
        };
        let outcome = backend
            .execute_query(&proposal.question, &proposal.query)
            .await;
        self.apply_execution(proposal, outcome);
    }
}

fn failure_notice(action: &str, err: &BackendError) -> String {
    if err.is_transport() {
        format!("{} failed: cannot reach the query backend ({})", action, err)
    } else {
        format!("{} failed: {}", action, err)
    }
}
