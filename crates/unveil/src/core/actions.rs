/*!
Element actions: `show`, `hide`, `scroll`, and the timers that undo them.

Every action re-resolves its record against the live document first. Timers
are replaced, never stacked: arming one cancels whatever was pending under
the same element and kind.
*/

use std::hash::Hash;

use super::locate::locate;
use super::registry::{apply_hiding, reveal, InlineSnapshot, OutlineState};
use super::{AgentState, PageAgent, ScrollRestore, Timer, TimerKind};
use crate::dom::{Dom, ScrollOptions};
use crate::scan::is_hidden;
use crate::types::{HiddenElementRecord, UnveilError, UnveilResult};

impl<N: Clone + Eq + Hash> AgentState<N> {
  /// Drop the shadow entry of an element that has no captured original and
  /// nothing pending.
  fn release_if_idle(&mut self, node: &N) {
    let idle = self.registry.get(node).is_some_and(|s| s.original.is_none())
      && !self.timers.contains(&(node.clone(), TimerKind::ShowOutline))
      && !self.timers.contains(&(node.clone(), TimerKind::ScrollRestore));
    if idle {
      self.registry.remove(node);
    }
  }

  /// Drop everything held for an element that left the document.
  fn forget(&mut self, node: &N) {
    self.registry.remove(node);
    self.timers.cancel(&(node.clone(), TimerKind::ShowOutline));
    self.timers.cancel(&(node.clone(), TimerKind::ScrollRestore));
  }
}

impl<D: Dom> PageAgent<D> {
  /// Reveal the element and keep it revealed.
  ///
  /// The element's original inline state is captured on the first call only;
  /// repeated calls re-apply the reveal and re-arm the outline timer.
  pub fn try_show(&self, record: &HiddenElementRecord) -> UnveilResult<()> {
    let mut dom = self.inner.dom.lock();
    let node = locate(&*dom, record)?;
    let now = self.now();
    let mut guard = self.inner.state.lock();
    let state = &mut *guard;

    let pending_scroll = state
      .timers
      .cancel(&(node.clone(), TimerKind::ScrollRestore));

    let shadow = state.registry.entry(node.clone());
    if shadow.original.is_none() {
      // A pending scroll reveal means the live styles are transient.
      shadow.original = Some(match pending_scroll {
        Some(Timer::ScrollRestore(restore)) => restore.prior,
        Some(Timer::ShowOutline(_)) | None => InlineSnapshot::capture(&*dom, &node),
      });
    }
    shadow.temporarily_shown = true;
    let outline = shadow
      .original
      .as_ref()
      .map(|o| o.outline.clone())
      .unwrap_or_default();

    reveal(&mut *dom, &node)?;
    OutlineState::cue(&mut *dom, &node)?;
    state.timers.schedule(
      (node, TimerKind::ShowOutline),
      now.saturating_add(self.inner.config.show_outline_ms),
      Timer::ShowOutline(outline),
    );
    Ok(())
  }

  /// Undo a `show`: restore the captured original state and drop all shadow
  /// state. Fails without touching the element if nothing was captured.
  pub fn try_hide(&self, record: &HiddenElementRecord) -> UnveilResult<()> {
    let mut dom = self.inner.dom.lock();
    let node = locate(&*dom, record)?;
    let mut guard = self.inner.state.lock();
    let state = &mut *guard;

    let Some(original) = state.registry.get(&node).and_then(|s| s.original.clone()) else {
      return Err(UnveilError::NoCapturedState {
        selector: record.selector.clone(),
      });
    };

    original.restore(&mut *dom, &node)?;
    if !is_hidden(&*dom, &node)? {
      apply_hiding(&mut *dom, &node, record.hidden_kind)?;
    }

    state.registry.remove(&node);
    state.timers.cancel(&(node.clone(), TimerKind::ShowOutline));
    state.timers.cancel(&(node, TimerKind::ScrollRestore));
    Ok(())
  }

  /// Scroll the element into view, revealing it until the restore timer
  /// fires if it is currently hidden.
  pub fn try_scroll(&self, record: &HiddenElementRecord) -> UnveilResult<()> {
    let mut dom = self.inner.dom.lock();
    let node = locate(&*dom, record)?;
    let now = self.now();
    let currently_hidden = is_hidden(&*dom, &node)?;
    let mut guard = self.inner.state.lock();
    let state = &mut *guard;

    let key = (node.clone(), TimerKind::ScrollRestore);
    let (was_hidden, prior) = match state.timers.cancel(&key) {
      // Last scroll wins, but the first reveal's snapshot is what gets restored.
      Some(Timer::ScrollRestore(previous)) => (previous.was_hidden || currently_hidden, previous.prior),
      Some(Timer::ShowOutline(_)) | None => {
        let mut prior = InlineSnapshot::capture(&*dom, &node);
        if let Some(Timer::ShowOutline(outline)) =
          state.timers.get(&(node.clone(), TimerKind::ShowOutline))
        {
          prior.outline = outline.clone();
        }
        (currently_hidden, prior)
      }
    };

    if currently_hidden {
      reveal(&mut *dom, &node)?;
    }
    dom.scroll_into_view(&node, ScrollOptions::smooth_center())?;
    OutlineState::cue(&mut *dom, &node)?;

    state.registry.entry(node);
    state.timers.schedule(
      key,
      now.saturating_add(self.inner.config.scroll_restore_ms),
      Timer::ScrollRestore(ScrollRestore {
        kind: record.hidden_kind,
        was_hidden,
        prior,
      }),
    );
    Ok(())
  }

  /// Fire every due timer. Returns how many fired.
  pub fn tick(&self) -> usize {
    let now = self.now();
    let mut dom = self.inner.dom.lock();
    let mut guard = self.inner.state.lock();
    let state = &mut *guard;

    let due = state.timers.pop_due(now);
    let fired = due.len();
    for ((node, _), timer) in due {
      if !dom.is_connected(&node) {
        log::debug!("dropping state of disconnected element {node:?}");
        state.forget(&node);
        continue;
      }
      if let Err(e) = Self::fire(&mut *dom, state, &node, timer) {
        log::warn!("timer for {node:?} failed: {e}");
      }
    }
    fired
  }

  fn fire(
    dom: &mut D,
    state: &mut AgentState<D::Node>,
    node: &D::Node,
    timer: Timer,
  ) -> UnveilResult<()> {
    match timer {
      Timer::ShowOutline(outline) => outline.apply(dom, node)?,
      Timer::ScrollRestore(restore) => {
        restore.prior.outline.apply(dom, node)?;
        let shown = state
          .registry
          .get(node)
          .is_some_and(|s| s.temporarily_shown);
        if restore.was_hidden && !shown {
          restore.prior.restore_visibility(dom, node)?;
          if !is_hidden(dom, node)? {
            apply_hiding(dom, node, restore.kind)?;
          }
        }
        state.release_if_idle(node);
      }
    }
    Ok(())
  }
}
