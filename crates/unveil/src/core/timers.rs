/*!
Deterministic timer queue.

At most one timer is pending per key. Scheduling under a key that already has
a pending timer replaces it, and both `schedule` and `cancel` hand back the
displaced payload so the caller can carry its state forward.
*/

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Pending<P> {
  due_ms: u64,
  seq: u64,
  payload: P,
}

/// Timers keyed by `K`, carrying payload `P`.
#[derive(Debug, Clone)]
pub(crate) struct TimerQueue<K, P> {
  pending: HashMap<K, Pending<P>>,
  next_seq: u64,
}

impl<K, P> Default for TimerQueue<K, P> {
  fn default() -> Self {
    Self {
      pending: HashMap::new(),
      next_seq: 0,
    }
  }
}

impl<K: Clone + Eq + Hash, P> TimerQueue<K, P> {
  /// Arm a timer, replacing (and returning) any timer pending under `key`.
  pub(crate) fn schedule(&mut self, key: K, due_ms: u64, payload: P) -> Option<P> {
    let seq = self.next_seq;
    self.next_seq += 1;
    self
      .pending
      .insert(
        key,
        Pending {
          due_ms,
          seq,
          payload,
        },
      )
      .map(|p| p.payload)
  }

  /// Disarm the timer under `key`, returning its payload.
  pub(crate) fn cancel(&mut self, key: &K) -> Option<P> {
    self.pending.remove(key).map(|p| p.payload)
  }

  /// Payload of the timer pending under `key`.
  pub(crate) fn get(&self, key: &K) -> Option<&P> {
    self.pending.get(key).map(|p| &p.payload)
  }

  pub(crate) fn contains(&self, key: &K) -> bool {
    self.pending.contains_key(key)
  }

  pub(crate) fn len(&self) -> usize {
    self.pending.len()
  }

  /// Remove every timer due at or before `now_ms`, ordered by due time then
  /// arming order.
  pub(crate) fn pop_due(&mut self, now_ms: u64) -> Vec<(K, P)> {
    let due_keys: Vec<K> = self
      .pending
      .iter()
      .filter(|(_, p)| p.due_ms <= now_ms)
      .map(|(k, _)| k.clone())
      .collect();

    let mut due: Vec<(K, Pending<P>)> = due_keys
      .into_iter()
      .filter_map(|k| self.pending.remove(&k).map(|p| (k, p)))
      .collect();
    due.sort_by_key(|(_, p)| (p.due_ms, p.seq));
    due.into_iter().map(|(k, p)| (k, p.payload)).collect()
  }
}
