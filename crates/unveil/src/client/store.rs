/*! Opaque key/value persistence owned by the caller. */

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use crate::types::UnveilResult;

/// Key/value store of JSON blobs. The core never interprets what callers keep here.
pub trait Store {
  /// Stored value, if any.
  fn get(&self, key: &str) -> Option<JsonValue>;
  /// Insert or overwrite.
  fn set(&self, key: &str, value: JsonValue) -> UnveilResult<()>;
  /// Delete. Absent keys are fine.
  fn remove(&self, key: &str) -> UnveilResult<()>;
}

/// In-memory [`Store`].
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
  /// An empty store.
  pub fn new() -> Self {
    Self::default()
  }
}

impl Store for MemoryStore {
  fn get(&self, key: &str) -> Option<JsonValue> {
    self.values.lock().get(key).cloned()
  }

  fn set(&self, key: &str, value: JsonValue) -> UnveilResult<()> {
    self.values.lock().insert(key.to_string(), value);
    Ok(())
  }

  fn remove(&self, key: &str) -> UnveilResult<()> {
    self.values.lock().remove(key);
    Ok(())
  }
}
