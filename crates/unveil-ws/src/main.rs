//! `unveil-ws <file.html> [port] [--settings <file.json>] [--no-auto-scan]`:
//! serve a page agent for one HTML document.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use unveil::{MemoryDocument, Page};
use unveil_ws::{start_server, WebSocketState};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
  env_logger::builder()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .init();

  let cli = Cli::parse();
  let settings = match cli.settings() {
    Ok(settings) => settings,
    Err(e) => {
      log::error!("{e}");
      return ExitCode::FAILURE;
    }
  };

  let html = match std::fs::read_to_string(&cli.page) {
    Ok(html) => html,
    Err(e) => {
      log::error!("cannot read {}: {e}", cli.page.display());
      return ExitCode::FAILURE;
    }
  };

  let page = Page::new(MemoryDocument::parse_html(&html));
  let agent = page.inject();
  if settings.auto_scan {
    let records = agent.find_hidden_elements();
    log::info!("{}: {} hidden elements", cli.page.display(), records.len());
  }

  match start_server(WebSocketState::with_port(agent, cli.port)).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(_) => ExitCode::FAILURE,
  }
}
