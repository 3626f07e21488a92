use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::backend::summarize_collections;
use crate::core::session::ConnectionState;

use super::{BackendEvent, ChatInterface};

impl ChatInterface {
    pub(super) fn spawn_health_check(&mut self) {
        self.session.begin_health_check();
        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.health().await;
            let _ = tx.send(BackendEvent::Health(outcome)).await;
        });
    }

    pub(super) fn submit_draft(&mut self) {
        if self.session.pending().is_some() {
            debug!("Ignoring submit while a proposal awaits approval");
            return;
        }
        if self.session.connection() != ConnectionState::Connected && !self.session.is_busy() {
            self.cmd_output_lines.clear();
            self.push_cmd_output("Not connected to the query backend. Try /health.".to_string());
            return;
        }

        let draft = self.session.draft().to_string();
        let Some(question) = self.session.begin_question(&draft) else {
            return;
        };
        self.cursor_pos = 0;
        self.cmd_output_visible = false;
        self.cmd_output_lines.clear();
        self.start_spinner("Generating query...");

        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.generate_query(&question).await;
            let _ = tx
                .send(BackendEvent::Generated { question, outcome })
                .await;
        });
    }

    pub(super) fn resolve_pending(&mut self, approve: bool) {
        let Some(proposal) = self.session.begin_resolution(approve) else {
            self.scroll_to_bottom();
            return;
        };
        self.start_spinner("Running query...");

        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = backend
                .execute_query(&proposal.question, &proposal.query)
                .await;
            let _ = tx
                .send(BackendEvent::Executed { proposal, outcome })
                .await;
        });
    }

    pub(super) fn fetch_collections(&mut self) {
        self.cmd_output_lines.clear();
        self.push_cmd_output("Loading collections...".to_string());

        let backend = self.backend.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.collections().await;
            let _ = tx.send(BackendEvent::Collections(outcome)).await;
        });
    }

    fn start_spinner(&mut self, label: &'static str) {
        self.busy_label = label;
        self.spinner_tick = 0;
        self.scroll_to_bottom();
    }

    pub(super) fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Health(outcome) => self.session.apply_health(outcome),
            BackendEvent::Generated { question, outcome } => {
                self.session.apply_generation(question, outcome);
                if self.session.pending().is_some() {
                    // Text typed while generating must not carry into the approval prompt.
                    self.session.draft_mut().clear();
                    self.cursor_pos = 0;
                    self.autocomplete_visible = false;
                    self.autocomplete_candidates.clear();
                }
            }
            BackendEvent::Executed { proposal, outcome } => {
                self.session.apply_execution(proposal, outcome)
            }
            BackendEvent::Collections(Ok(collections)) => {
                self.cmd_output_lines.clear();
                if collections.is_empty() {
                    self.push_cmd_output("The database has no collections.".to_string());
                } else {
                    self.push_cmd_output(format!("Collections ({}):", collections.len()));
                    for line in summarize_collections(&collections) {
                        self.push_cmd_output(format!("  {}", line));
                    }
                }
            }
            BackendEvent::Collections(Err(err)) => {
                warn!("Listing collections failed: {}", err);
                self.cmd_output_lines.clear();
                self.push_cmd_output(format!("Could not list collections: {}", err));
            }
        }
        self.scroll_to_bottom();
    }

    /// Applies everything the spawned calls have reported so far.
    pub(super) fn drain_backend_events(&mut self) {
        let mut events = Vec::new();
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                // The interface holds a sender, so this only happens on teardown.
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }
        for event in events {
            self.apply_backend_event(event);
        }
    }
}
