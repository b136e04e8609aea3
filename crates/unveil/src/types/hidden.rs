/*! The four mechanisms that remove an element from rendering. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How an element is hidden. Variants are listed in classification priority:
/// an element matching several conditions is recorded under the first one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum HiddenKind {
  /// `hidden` boolean attribute.
  Attribute,
  /// Computed `display: none`.
  Display,
  /// Computed `visibility: hidden`.
  Visibility,
  /// Computed opacity of exactly zero.
  Opacity,
}

impl HiddenKind {
  /// All kinds in priority order.
  pub const ALL: [Self; 4] = [
    Self::Attribute,
    Self::Display,
    Self::Visibility,
    Self::Opacity,
  ];

  /// Human-readable explanation paired with the kind.
  pub const fn reason(self) -> &'static str {
    match self {
      Self::Attribute => "hidden attribute",
      Self::Display => "display: none",
      Self::Visibility => "visibility: hidden",
      Self::Opacity => "opacity: 0",
    }
  }

  /// Wire name (`attribute`, `display`, ...).
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Attribute => "attribute",
      Self::Display => "display",
      Self::Visibility => "visibility",
      Self::Opacity => "opacity",
    }
  }
}

impl std::fmt::Display for HiddenKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
