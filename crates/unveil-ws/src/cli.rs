/*! Command line of the `unveil-ws` binary. */

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value as JsonValue;
use unveil::client::{MemoryStore, Settings, Store};
use unveil::{UnveilError, UnveilResult};
use unveil_ws::DEFAULT_WS_PORT;

/// Serve a page agent for one HTML document over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "unveil-ws", version)]
pub(crate) struct Cli {
  /// HTML document to load
  pub(crate) page: PathBuf,

  /// WebSocket port
  #[arg(default_value_t = DEFAULT_WS_PORT)]
  pub(crate) port: u16,

  /// JSON object of stored settings (camelCase keys, e.g. `{"autoScan": false}`)
  #[arg(long)]
  pub(crate) settings: Option<PathBuf>,

  /// Skip the startup scan whatever the settings say
  #[arg(long)]
  pub(crate) no_auto_scan: bool,
}

impl Cli {
  /// Settings from the `--settings` file over the defaults, then flags.
  pub(crate) fn settings(&self) -> UnveilResult<Settings> {
    let store = MemoryStore::new();
    if let Some(path) = &self.settings {
      let json = std::fs::read_to_string(path)
        .map_err(|e| UnveilError::Storage(format!("{}: {e}", path.display())))?;
      seed_store(&store, &json)?;
    }
    let mut settings = Settings::load(&store);
    if self.no_auto_scan {
      settings.auto_scan = false;
    }
    Ok(settings)
  }
}

fn seed_store(store: &dyn Store, json: &str) -> UnveilResult<()> {
  match serde_json::from_str(json) {
    Ok(JsonValue::Object(values)) => {
      for (key, value) in values {
        store.set(&key, value)?;
      }
      Ok(())
    }
    Ok(other) => Err(UnveilError::Storage(format!(
      "settings must be a JSON object, got {other}"
    ))),
    Err(e) => Err(UnveilError::Storage(e.to_string())),
  }
}
