use anyhow::{Result, bail};

use crate::core::backend::QueryBackend;
use crate::core::session::{ConnectionState, EventKind, QuerySession};
use crate::core::terminal;

/// One-shot probe. Succeeds only when the backend reports a live MongoDB
/// connection.
pub(super) async fn run_health(backend: &dyn QueryBackend) -> Result<()> {
    terminal::print_step(&format!("Checking {}", backend.endpoint()));

    let mut session = QuerySession::new();
    session.check_backend_health(backend).await;

    for event in session.log() {
        if let EventKind::SystemNotice { level } = event.kind {
            terminal::print_notice(level, &event.content);
        }
    }

    if session.connection() != ConnectionState::Connected {
        bail!("backend health check failed");
    }
    terminal::print_success("Backend is healthy and connected to MongoDB");
    Ok(())
}
