/*! Bounded polling for a page that is still coming up. */

use std::time::Duration;

use crate::types::ChannelError;

/// Default number of polls after injection.
pub const DEFAULT_ATTEMPTS: u32 = 10;
/// Default spacing between polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "RetryPolicy does nothing until run"]
pub struct RetryPolicy {
  attempts: u32,
  interval: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      attempts: DEFAULT_ATTEMPTS,
      interval: DEFAULT_INTERVAL,
    }
  }
}

impl RetryPolicy {
  /// Maximum polls. Default: 10.
  pub const fn attempts(mut self, attempts: u32) -> Self {
    self.attempts = attempts;
    self
  }

  /// Wait before each poll. Default: 100ms.
  pub const fn interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Polls before giving up.
  pub const fn max_attempts(&self) -> u32 {
    self.attempts
  }

  /// Call `op` until it yields `Some`, sleeping `interval` before each call.
  /// Errors count as a miss. Fails with [`ChannelError::Exhausted`].
  pub fn run<T>(
    &self,
    mut op: impl FnMut(u32) -> Result<Option<T>, ChannelError>,
  ) -> Result<T, ChannelError> {
    for attempt in 1..=self.attempts {
      std::thread::sleep(self.interval);
      match op(attempt) {
        Ok(Some(value)) => return Ok(value),
        Ok(None) => log::debug!("poll {attempt}/{} not ready", self.attempts),
        Err(e) => log::debug!("poll {attempt}/{} failed: {e}", self.attempts),
      }
    }
    Err(ChannelError::Exhausted {
      attempts: self.attempts,
    })
  }
}
