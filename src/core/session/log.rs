use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Display text for an execution that matched nothing.
pub const EMPTY_RESULT_TEXT: &str = "No results found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    UserQuestion,
    GeneratedQuery {
        question: String,
        query: String,
        warnings: Vec<String>,
    },
    ExecutionResult {
        question: String,
        query: String,
        result: Value,
        answer: String,
    },
    SystemNotice {
        level: NoticeLevel,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// What a frontend shows for this entry.
    pub content: String,
    pub kind: EventKind,
}

impl Event {
    fn new(content: String, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            content,
            kind,
        }
    }

    pub fn user_question(question: impl Into<String>) -> Self {
        Self::new(question.into(), EventKind::UserQuestion)
    }

    pub fn generated_query(question: String, query: String, warnings: Vec<String>) -> Self {
        Self::new(
            query.clone(),
            EventKind::GeneratedQuery {
                question,
                query,
                warnings,
            },
        )
    }

    pub fn execution_result(
        question: String,
        query: String,
        result: Value,
        answer: String,
    ) -> Self {
        Self::new(
            render_result(&result),
            EventKind::ExecutionResult {
                question,
                query,
                result,
                answer,
            },
        )
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::new(message.into(), EventKind::SystemNotice { level })
    }

    pub fn is_notice(&self) -> bool {
        matches!(self.kind, EventKind::SystemNotice { .. })
    }
}

/// An empty result list reads as [`EMPTY_RESULT_TEXT`]; anything else is
/// shown in full as pretty-printed JSON.
pub fn render_result(result: &Value) -> String {
    match result {
        Value::Array(items) if items.is_empty() => EMPTY_RESULT_TEXT.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Append-only record of everything that happened in a session.
#[derive(Debug, Default)]
pub struct ConversationLog {
    events: Vec<Event>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Events appended at or after `index`; empty when `index` is past the end.
    pub fn since(&self, index: usize) -> &[Event] {
        self.events.get(index..).unwrap_or(&[])
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
