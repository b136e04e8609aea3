/*!
User settings.

Each field is stored under its own camelCase key. Missing or mistyped keys
fall back to the documented default.
*/

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use ts_rs::TS;

use super::Store;
use crate::types::{UnveilError, UnveilResult};

/// Flat settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Settings {
  /// Scan as soon as the page is available. Default: true.
  pub auto_scan: bool,
  /// Highlight color for the results UI. Default: `#40e0d0`.
  pub highlight_color: String,
  /// Cap applied by [`apply_settings`](super::apply_settings). Default: 1000.
  pub max_elements: usize,
  /// Keep zero-size elements in shaped results. Default: false.
  pub include_zero_size_elements: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      auto_scan: true,
      highlight_color: "#40e0d0".to_string(),
      max_elements: 1000,
      include_zero_size_elements: false,
    }
  }
}

impl Settings {
  fn to_object(&self) -> UnveilResult<serde_json::Map<String, JsonValue>> {
    match serde_json::to_value(self) {
      Ok(JsonValue::Object(map)) => Ok(map),
      Ok(other) => Err(UnveilError::Storage(format!("settings encoded as {other}"))),
      Err(e) => Err(UnveilError::Storage(e.to_string())),
    }
  }

  /// Read settings, defaulting every key that is absent or invalid.
  pub fn load(store: &dyn Store) -> Self {
    let defaults = Self::default();
    let Ok(keys) = defaults.to_object() else {
      return defaults;
    };

    let mut merged = serde_json::Map::new();
    for (key, default) in keys {
      let value = match store.get(&key) {
        Some(stored) if std::mem::discriminant(&stored) == std::mem::discriminant(&default) => stored,
        Some(stored) => {
          log::warn!("ignoring stored {key}: {stored}");
          default
        }
        None => default,
      };
      merged.insert(key, value);
    }
    serde_json::from_value(JsonValue::Object(merged)).unwrap_or_else(|e| {
      log::warn!("invalid stored settings, using defaults: {e}");
      defaults
    })
  }

  /// Write every key.
  pub fn save(&self, store: &dyn Store) -> UnveilResult<()> {
    for (key, value) in self.to_object()? {
      store.set(&key, value)?;
    }
    Ok(())
  }

  /// Merge stored values over the defaults and write the result back.
  pub fn initialize(store: &dyn Store) -> UnveilResult<Self> {
    let settings = Self::load(store);
    settings.save(store)?;
    Ok(settings)
  }
}
