use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use console::style;

use crate::core::backend::QueryBackend;
use crate::core::session::{ConnectionState, Event, EventKind, NoticeLevel, QuerySession};
use crate::core::terminal;
use crate::interfaces::Frontend;

/// Plain prompt frontend: one question at a time, approval by `inquire`
/// confirmation. With a one-shot question it answers it and returns.
pub struct LinePrompt {
    session: QuerySession,
    backend: Arc<dyn QueryBackend>,
    one_shot: Option<String>,
    printed: usize,
}

impl LinePrompt {
    pub fn new(
        session: QuerySession,
        backend: Arc<dyn QueryBackend>,
        one_shot: Option<String>,
    ) -> Self {
        Self {
            session,
            backend,
            one_shot,
            printed: 0,
        }
    }

    fn print_new_events(&mut self) {
        let echo_questions = self.one_shot.is_some();
        for event in self.session.log().since(self.printed) {
            print_event(event, echo_questions);
        }
        self.printed = self.session.log().len();
    }

    async fn ask(&mut self, question: &str) -> Result<()> {
        self.session
            .submit_question(self.backend.as_ref(), question)
            .await;
        self.print_new_events();

        if self.session.pending().is_none() {
            return Ok(());
        }

        // Esc counts as a cancel.
        let approve = inquire::Confirm::new("Run this query?")
            .with_default(false)
            .with_help_message("Nothing touches the database until you answer yes")
            .prompt_skippable()?
            .unwrap_or(false);

        self.session
            .resolve_proposal(self.backend.as_ref(), approve)
            .await;
        self.print_new_events();
        Ok(())
    }

    fn last_was_error(&self) -> bool {
        matches!(
            self.session.log().last().map(|e| &e.kind),
            Some(EventKind::SystemNotice {
                level: NoticeLevel::Error
            })
        )
    }
}

fn print_event(event: &Event, echo_questions: bool) {
    match &event.kind {
        EventKind::UserQuestion => {
            if echo_questions {
                println!("{} {}", style("Question:").bold().cyan(), event.content);
            }
        }
        EventKind::GeneratedQuery { warnings, .. } => {
            println!("{}", style("Proposed query:").bold());
            println!("  {}", style(&event.content).yellow());
            for warning in warnings {
                terminal::print_warn(&format!("This query {}", warning));
            }
        }
        EventKind::ExecutionResult { .. } => {
            println!("{}", style("Result:").bold());
            for line in event.content.lines() {
                println!("  {}", line);
            }
        }
        EventKind::SystemNotice { level } => terminal::print_notice(*level, &event.content),
    }
}

#[async_trait(?Send)]
impl Frontend for LinePrompt {
    async fn run(&mut self) -> Result<()> {
        if self.one_shot.is_none() {
            terminal::print_banner();
        }
        terminal::print_step(&format!("Connecting to {}", self.backend.endpoint()));
        self.session
            .check_backend_health(self.backend.as_ref())
            .await;
        self.print_new_events();
        if self.session.connection() != ConnectionState::Connected {
            bail!("the query backend is not available");
        }

        if let Some(question) = self.one_shot.clone() {
            if question.trim().is_empty() {
                bail!("--question needs some text");
            }
            self.ask(&question).await?;
            if self.last_was_error() {
                bail!("the question could not be answered");
            }
            return Ok(());
        }

        terminal::print_success("Connected. Ask a question, or leave the line empty to quit.");
        loop {
            let Some(text) = inquire::Text::new("Ask:")
                .with_help_message("Esc or an empty line quits")
                .prompt_skippable()?
            else {
                break;
            };
            if text.trim().is_empty() {
                break;
            }
            self.ask(&text).await?;
        }

        terminal::print_goodbye();
        Ok(())
    }
}
