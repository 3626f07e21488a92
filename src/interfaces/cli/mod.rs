mod commands;
mod dispatch;
mod events;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::backend::{
    BackendError, CollectionMap, ExecutionOutcome, HealthReport, QueryBackend, QueryProposal,
};
use crate::core::session::{PendingProposal, QuerySession};
use crate::interfaces::Frontend;

struct CommandInfo {
    name: &'static str,
    description: &'static str,
}

const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "/help",
        description: "Show all available commands",
    },
    CommandInfo {
        name: "/health",
        description: "Re-check the backend connection",
    },
    CommandInfo {
        name: "/collections",
        description: "List collections in the database",
    },
    CommandInfo {
        name: "/clear",
        description: "Clear chat display",
    },
    CommandInfo {
        name: "/quit",
        description: "Exit mongo-chat",
    },
    CommandInfo {
        name: "/exit",
        description: "Exit mongo-chat",
    },
];

/// Outcome of a backend call made on a spawned task.
enum BackendEvent {
    Health(Result<HealthReport, BackendError>),
    Generated {
        question: String,
        outcome: Result<QueryProposal, BackendError>,
    },
    Executed {
        proposal: PendingProposal,
        outcome: Result<ExecutionOutcome, BackendError>,
    },
    Collections(Result<CollectionMap, BackendError>),
}

/// Full-screen chat. The session is only touched on the UI task; backend
/// calls report back through `events_rx`.
pub struct ChatInterface {
    session: QuerySession,
    backend: Arc<dyn QueryBackend>,
    events_tx: mpsc::Sender<BackendEvent>,
    events_rx: mpsc::Receiver<BackendEvent>,

    // Display state
    cursor_pos: usize, // in chars
    scroll_offset: u16,
    spinner_tick: usize,
    busy_label: &'static str,
    display_from: usize,
    should_quit: bool,

    // Autocomplete state
    autocomplete_visible: bool,
    autocomplete_selected: usize,
    autocomplete_candidates: Vec<usize>, // indices into COMMANDS

    // Command output panel
    cmd_output_lines: Vec<String>,
    cmd_output_visible: bool,
}

impl ChatInterface {
    pub fn new(session: QuerySession, backend: Arc<dyn QueryBackend>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(32);
        Self {
            session,
            backend,
            events_tx,
            events_rx,
            cursor_pos: 0,
            scroll_offset: 0,
            spinner_tick: 0,
            busy_label: "",
            display_from: 0,
            should_quit: false,
            autocomplete_visible: false,
            autocomplete_selected: 0,
            autocomplete_candidates: vec![],
            cmd_output_lines: vec![],
            cmd_output_visible: false,
        }
    }

    fn update_autocomplete(&mut self) {
        let draft = self.session.draft();
        if draft.starts_with('/') && !draft.contains(' ') {
            self.autocomplete_candidates = COMMANDS
                .iter()
                .enumerate()
                .filter(|(_, c)| c.name.starts_with(draft))
                .map(|(i, _)| i)
                .collect();
            if !self.autocomplete_candidates.is_empty() {
                self.autocomplete_visible = true;
                if self.autocomplete_selected >= self.autocomplete_candidates.len() {
                    self.autocomplete_selected = self.autocomplete_candidates.len() - 1;
                }
            } else {
                self.autocomplete_visible = false;
                self.autocomplete_selected = 0;
            }
        } else {
            self.autocomplete_visible = false;
            self.autocomplete_selected = 0;
            self.autocomplete_candidates.clear();
        }
    }

    fn accept_autocomplete(&mut self) {
        if let Some(&cmd_idx) = self.autocomplete_candidates.get(self.autocomplete_selected) {
            let draft = self.session.draft_mut();
            draft.clear();
            draft.push_str(COMMANDS[cmd_idx].name);
            self.cursor_pos = draft.chars().count();
        }
        self.autocomplete_visible = false;
        self.autocomplete_candidates.clear();
    }

    fn push_cmd_output(&mut self, msg: String) {
        self.cmd_output_lines.push(msg);
        self.cmd_output_visible = true;
    }

    fn scroll_to_bottom(&mut self) {
        // Clamped while rendering.
        self.scroll_offset = u16::MAX;
    }

    /// Waiting on the user to approve or cancel a proposal.
    fn awaiting_approval(&self) -> bool {
        self.session.pending().is_some() && !self.session.is_busy()
    }
}

#[async_trait(?Send)]
impl Frontend for ChatInterface {
    async fn run(&mut self) -> Result<()> {
        self.run_tui().await
    }
}
