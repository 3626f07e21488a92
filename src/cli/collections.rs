use anyhow::{Result, anyhow};
use console::style;

use crate::core::backend::{QueryBackend, summarize_collections};
use crate::core::terminal;

pub(super) async fn run_collections(backend: &dyn QueryBackend) -> Result<()> {
    let collections = backend
        .collections()
        .await
        .map_err(|err| anyhow!("listing collections at {} failed: {}", backend.endpoint(), err))?;

    if collections.is_empty() {
        terminal::print_warn("The database has no collections.");
        return Ok(());
    }

    terminal::print_step(&format!("{} collections", collections.len()));
    for line in summarize_collections(&collections) {
        println!("  {}", style(line).cyan());
    }
    Ok(())
}
