/*!
Page time.

Timers are scheduled against a monotonic millisecond clock owned by the
agent. [`SystemClock`] follows wall time; [`ManualClock`] only moves when told
to, which makes timer behaviour deterministic in tests and replay.
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic milliseconds since an arbitrary origin.
pub trait Clock: std::fmt::Debug + Send + Sync {
  /// Current time.
  fn now_ms(&self) -> u64;
}

/// Milliseconds elapsed since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
  origin: Instant,
}

impl SystemClock {
  /// A clock reading zero now.
  pub fn new() -> Self {
    Self {
      origin: Instant::now(),
    }
  }
}

impl Default for SystemClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for SystemClock {
  fn now_ms(&self) -> u64 {
    u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
  }
}

/// A clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: AtomicU64,
}

impl ManualClock {
  /// A clock stopped at zero.
  pub const fn new() -> Self {
    Self {
      now: AtomicU64::new(0),
    }
  }

  /// Move time forward by `ms`.
  pub fn advance(&self, ms: u64) {
    self.now.fetch_add(ms, Ordering::SeqCst);
  }

  /// Jump to an absolute time.
  pub fn set(&self, ms: u64) {
    self.now.store(ms, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_ms(&self) -> u64 {
    self.now.load(Ordering::SeqCst)
  }
}
