/*!
Background timer driver.

Hosts without an event loop of their own start a [`Ticker`] to call
[`PageAgent::tick`] at a fixed interval. The thread stops when the handle is
dropped.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::PageAgent;
use crate::dom::Dom;

/// Default tick interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Handle to a running ticker thread. Stops on drop.
pub struct Ticker {
  stop_signal: Arc<AtomicBool>,
  thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Ticker {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Ticker").finish_non_exhaustive()
  }
}

impl Ticker {
  fn stop(&self) {
    self.stop_signal.store(true, Ordering::SeqCst);
  }
}

impl Drop for Ticker {
  fn drop(&mut self) {
    self.stop();
    if let Some(t) = self.thread.take() {
      drop(t.join());
    }
  }
}

impl<D: Dom + Send + 'static> PageAgent<D> {
  /// Fire due timers from a background thread every `interval`.
  #[must_use = "Ticker stops when dropped"]
  pub fn start_ticker(&self, interval: Duration) -> Ticker {
    let stop_signal = Arc::new(AtomicBool::new(false));
    let stop_signal_clone = Arc::clone(&stop_signal);
    let agent = self.clone();

    let thread = thread::spawn(move || {
      while !stop_signal_clone.load(Ordering::SeqCst) {
        let loop_start = Instant::now();

        let fired = agent.tick();
        if fired > 0 {
          log::debug!("ticker fired {fired} timers");
        }

        let elapsed = loop_start.elapsed();
        if elapsed < interval {
          thread::sleep(interval - elapsed);
        }
      }
    });

    Ticker {
      stop_signal,
      thread: Some(thread),
    }
  }
}
