mod collections;
mod health;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;
use tracing::info;

use crate::core::backend::{HttpBackend, QueryBackend};
use crate::core::config::ChatConfig;
use crate::core::session::QuerySession;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::interfaces::Frontend;
use crate::interfaces::cli::ChatInterface;
use crate::interfaces::line::LinePrompt;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Chat")
        .command("tui", "Start the full-screen chat (default)")
        .command("ask", "Ask questions at a line prompt")
        .print();

    GuideSection::new("Backend")
        .command("health", "Check that the backend can reach MongoDB")
        .command("collections", "List collections and document counts")
        .print();

    GuideSection::new("Options")
        .command("--api-url <url>", "Query backend base URL")
        .command("--question, -q <text>", "With 'ask': answer one question and exit")
        .blank()
        .text("The backend URL can also be set with MONGO_CHAT_API_URL or in")
        .text("config.toml under the data directory (MONGO_CHAT_DATA_DIR).")
        .print();

    println!(
        "\n {} {} [command] [options]\n",
        style("Usage:").bold(),
        style("mongo-chat").green()
    );
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClientFlags {
    pub api_url: Option<String>,
    pub question: Option<String>,
}

pub(crate) fn parse_client_flags(args: &[String], start: usize) -> ClientFlags {
    let mut flags = ClientFlags::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--api-url" => {
                if i + 1 < args.len() {
                    flags.api_url = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--question" | "-q" => {
                if i + 1 < args.len() {
                    flags.question = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    flags
}

/// Picks the command and the index its flags start at. No command, or a
/// leading flag, means the full-screen chat.
pub(crate) fn split_command(args: &[String]) -> (&str, usize) {
    match args.get(1).map(String::as_str) {
        None => ("tui", 1),
        Some(help @ ("--help" | "-h")) => (help, 2),
        Some(flag) if flag.starts_with('-') => ("tui", 1),
        Some(cmd) => (cmd, 2),
    }
}

fn connect(config: &ChatConfig) -> Result<Arc<dyn QueryBackend>> {
    let backend = HttpBackend::new(&config.api_url, config.request_timeout())
        .with_context(|| format!("cannot use API URL '{}'", config.api_url))?;
    Ok(Arc::new(backend))
}

pub async fn run_main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args: Vec<String> = std::env::args().collect();
    let (cmd, flag_start) = split_command(&args);

    if matches!(cmd, "help" | "--help" | "-h") {
        print_help();
        return Ok(());
    }
    if !matches!(cmd, "tui" | "ask" | "health" | "collections") {
        print_error(&format!("Unknown command: {}", cmd));
        print_help();
        bail!("unknown command '{}'", cmd);
    }

    let flags = parse_client_flags(&args, flag_start);
    let config = ChatConfig::load()?.with_api_url_override(flags.api_url);
    crate::logging::init(&ChatConfig::data_dir(), cmd == "tui");
    info!(command = cmd, api_url = %config.api_url, "mongo-chat starting");

    let backend = connect(&config)?;
    match cmd {
        "tui" => {
            let mut frontend = ChatInterface::new(QuerySession::new(), backend);
            frontend.run().await
        }
        "ask" => {
            let mut frontend = LinePrompt::new(QuerySession::new(), backend, flags.question);
            frontend.run().await
        }
        "health" => health::run_health(backend.as_ref()).await,
        _ => collections::run_collections(backend.as_ref()).await,
    }
}

/// True when the error is the user leaving a prompt with Esc or Ctrl+C.
pub fn is_user_cancel(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<inquire::InquireError>(),
        Some(inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted)
    )
}
