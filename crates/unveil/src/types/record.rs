/*! The serializable snapshot of one hidden element. */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{HiddenKind, Position};

/// One hidden element as seen by a single scan pass.
///
/// A record is a location descriptor, not a handle: `selector` and `xpath`
/// are re-resolved against the live document on every action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HiddenElementRecord {
  /// Unique within one scan pass (`element_{index}_{millis}`).
  pub id: String,
  pub tag_name: String,
  /// Raw `class` attribute, possibly empty.
  #[serde(default)]
  pub class_name: String,
  pub text_preview: String,
  pub selector: String,
  #[serde(default)]
  pub xpath: String,
  pub hidden_kind: HiddenKind,
  #[serde(default)]
  pub hidden_reason: String,
  #[serde(default)]
  pub attributes: BTreeMap<String, String>,
  #[serde(default)]
  pub position: Position,
}

impl HiddenElementRecord {
  /// Build a descriptor from just a locator pair. Used by callers that kept
  /// only the selector/xpath of an earlier snapshot.
  pub fn from_locator(
    selector: impl Into<String>,
    xpath: impl Into<String>,
    hidden_kind: HiddenKind,
  ) -> Self {
    Self {
      id: String::new(),
      tag_name: String::new(),
      class_name: String::new(),
      text_preview: String::new(),
      selector: selector.into(),
      xpath: xpath.into(),
      hidden_kind,
      hidden_reason: hidden_kind.reason().to_string(),
      attributes: BTreeMap::new(),
      position: Position::default(),
    }
  }
}
