/*! Geometry types for element boxes. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Bounding box of an element in viewport coordinates, captured at scan time.
///
/// Informational only: never used to re-locate an element.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Position {
  pub top: f64,
  pub left: f64,
  pub width: f64,
  pub height: f64,
}

impl Position {
  pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
    Self {
      top,
      left,
      width,
      height,
    }
  }

  /// True when the box has no rendered area (either dimension is zero or negative).
  pub fn is_zero_size(&self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }

  /// Bottom edge (`top + height`).
  pub fn bottom(&self) -> f64 {
    self.top + self.height
  }

  /// Right edge (`left + width`).
  pub fn right(&self) -> f64 {
    self.left + self.width
  }
}
