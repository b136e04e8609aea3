/*!
Caller-side result shaping. The scanner returns raw output; caps, filters and
grouping are applied here.
*/

use serde::Serialize;
use ts_rs::TS;

use super::{Settings, Store};
use crate::types::{HiddenElementRecord, HiddenKind, UnveilError, UnveilResult};

/// Store key of the last snapshot.
pub const RESULTS_KEY: &str = "hiddenFinderResults";

/// Drop zero-size entries unless allowed, then cap at `max_elements`.
pub fn apply_settings(
  records: Vec<HiddenElementRecord>,
  settings: &Settings,
) -> Vec<HiddenElementRecord> {
  records
    .into_iter()
    .filter(|r| settings.include_zero_size_elements || !r.position.is_zero_size())
    .take(settings.max_elements)
    .collect()
}

/// Records grouped by [`HiddenKind`], each group in scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Categories {
  /// [`HiddenKind::Attribute`] records.
  pub attribute: Vec<HiddenElementRecord>,
  /// [`HiddenKind::Display`] records.
  pub display: Vec<HiddenElementRecord>,
  /// [`HiddenKind::Visibility`] records.
  pub visibility: Vec<HiddenElementRecord>,
  /// [`HiddenKind::Opacity`] records.
  pub opacity: Vec<HiddenElementRecord>,
}

impl Categories {
  /// Bucket `records` by kind.
  pub fn from_records(records: &[HiddenElementRecord]) -> Self {
    let mut categories = Self::default();
    for record in records {
      categories.bucket_mut(record.hidden_kind).push(record.clone());
    }
    categories
  }

  fn bucket_mut(&mut self, kind: HiddenKind) -> &mut Vec<HiddenElementRecord> {
    match kind {
      HiddenKind::Attribute => &mut self.attribute,
      HiddenKind::Display => &mut self.display,
      HiddenKind::Visibility => &mut self.visibility,
      HiddenKind::Opacity => &mut self.opacity,
    }
  }

  /// One bucket.
  pub fn get(&self, kind: HiddenKind) -> &[HiddenElementRecord] {
    match kind {
      HiddenKind::Attribute => &self.attribute,
      HiddenKind::Display => &self.display,
      HiddenKind::Visibility => &self.visibility,
      HiddenKind::Opacity => &self.opacity,
    }
  }

  /// `(kind, count)` for every kind, in priority order.
  pub fn counts(&self) -> [(HiddenKind, usize); 4] {
    HiddenKind::ALL.map(|kind| (kind, self.get(kind).len()))
  }

  /// Records across all buckets.
  pub fn total(&self) -> usize {
    self.counts().iter().map(|(_, n)| n).sum()
  }
}

/// Persist a snapshot under [`RESULTS_KEY`].
pub fn store_results(store: &dyn Store, records: &[HiddenElementRecord]) -> UnveilResult<()> {
  let value = serde_json::to_value(records).map_err(|e| UnveilError::Storage(e.to_string()))?;
  store.set(RESULTS_KEY, value)
}

/// The stored snapshot, if one is present and readable.
pub fn last_results(store: &dyn Store) -> Option<Vec<HiddenElementRecord>> {
  let value = store.get(RESULTS_KEY)?;
  match serde_json::from_value(value) {
    Ok(records) => Some(records),
    Err(e) => {
      log::warn!("discarding unreadable {RESULTS_KEY}: {e}");
      None
    }
  }
}

/// Remove the stored snapshot.
pub fn clear_results(store: &dyn Store) -> UnveilResult<()> {
  store.remove(RESULTS_KEY)
}
