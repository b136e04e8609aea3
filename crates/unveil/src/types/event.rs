/*! Events broadcast by a page agent. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::HiddenElementRecord;

/// Events emitted when the page agent produces something an observer may want.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum Event {
  /// A scan finished. Fire-and-forget push to observing control surfaces.
  #[serde(rename = "SCAN_COMPLETE")]
  ScanComplete { elements: Vec<HiddenElementRecord> },
}
