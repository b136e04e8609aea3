/*! Per-element actions a control surface can request. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A reversible state transition applied to one live element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ElementAction {
  /// Reveal and keep revealed until `Hide`.
  Show,
  /// Restore the state captured by the first `Show`.
  Hide,
  /// Scroll into view with a transient reveal and highlight.
  Scroll,
}

impl ElementAction {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Show => "show",
      Self::Hide => "hide",
      Self::Scroll => "scroll",
    }
  }
}

impl std::fmt::Display for ElementAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_names() {
    let action: ElementAction = serde_json::from_str("\"scroll\"").unwrap();
    assert_eq!(action, ElementAction::Scroll);
    assert_eq!(serde_json::to_string(&ElementAction::Hide).unwrap(), "\"hide\"");
    assert!(serde_json::from_str::<ElementAction>("\"toggle\"").is_err());
  }
}
