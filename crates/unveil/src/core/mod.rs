/*!
Page agent - the in-page host for scanning and element mutation.

# Module Structure

- `mod.rs` - [`Page`], [`PageAgent`], [`AgentBuilder`], event emission
- `actions.rs` - `show`, `hide`, `scroll` and timer firing
- `locate.rs` - record to live element resolution
- `registry.rs` - shadow-state side table
- `timers.rs` - deterministic timer queue
- `clock.rs` - page time

# Example

```
use unveil::{HiddenKind, MemoryDocument, Page};

let page = Page::new(MemoryDocument::parse_fragment(
  r#"<div id="a" style="display:none">Hi</div>"#,
));
let agent = page.inject();

let records = agent.find_hidden_elements();
assert_eq!(records[0].hidden_kind, HiddenKind::Display);
assert!(agent.show(&records[0]));
assert!(agent.hide(&records[0]));
```
*/

mod actions;
mod clock;
mod locate;
mod registry;
mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use locate::find_element_by_data;

use std::sync::{Arc, OnceLock};

use async_broadcast::{InactiveReceiver, Sender};
use parking_lot::Mutex;

use crate::dom::Dom;
use crate::scan;
use crate::types::{ElementAction, Event, HiddenElementRecord, HiddenKind, UnveilResult};
use registry::{InlineSnapshot, OutlineState, ShadowRegistry};
use timers::TimerQueue;

/// Outline cue duration after `show`.
pub const DEFAULT_SHOW_OUTLINE_MS: u64 = 2000;
/// Delay before a `scroll` reveal is undone.
pub const DEFAULT_SCROLL_RESTORE_MS: u64 = 2000;
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TimerKind {
  /// Removes the `show` outline cue.
  ShowOutline,
  /// Undoes a `scroll` reveal.
  ScrollRestore,
}

#[derive(Debug, Clone)]
enum Timer {
  ShowOutline(OutlineState),
  ScrollRestore(ScrollRestore),
}

/// What a pending scroll restore needs to put back.
#[derive(Debug, Clone)]
struct ScrollRestore {
  kind: HiddenKind,
  was_hidden: bool,
  /// Inline state before the first of any chained scroll reveals.
  prior: InlineSnapshot,
}

struct AgentState<N> {
  registry: ShadowRegistry<N>,
  timers: TimerQueue<(N, TimerKind), Timer>,
  last_snapshot: Vec<HiddenElementRecord>,
}

impl<N> Default for AgentState<N> {
  fn default() -> Self {
    Self {
      registry: ShadowRegistry::default(),
      timers: TimerQueue::default(),
      last_snapshot: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct AgentConfig {
  show_outline_ms: u64,
  scroll_restore_ms: u64,
}

struct Inner<D: Dom> {
  /// Lock order: `dom` before `state`.
  dom: Arc<Mutex<D>>,
  state: Mutex<AgentState<D::Node>>,
  clock: Arc<dyn Clock>,
  config: AgentConfig,
  events_tx: Sender<Event>,
  events_keepalive: InactiveReceiver<Event>,
}

/// The in-page agent. Scans the document and applies reversible actions.
///
/// Clone is cheap (Arc bump) - share freely across threads.
pub struct PageAgent<D: Dom> {
  inner: Arc<Inner<D>>,
}

impl<D: Dom> Clone for PageAgent<D> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<D: Dom> std::fmt::Debug for PageAgent<D> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PageAgent").finish_non_exhaustive()
  }
}

/// Builder for configuring a page agent.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use unveil::{AgentBuilder, ManualClock, MemoryDocument, Page};
///
/// let clock = Arc::new(ManualClock::new());
/// let builder = AgentBuilder::default()
///   .clock(clock.clone())
///   .scroll_restore_ms(500);
/// let page = Page::with_builder(MemoryDocument::new(), builder);
/// let agent = page.inject();
/// assert_eq!(agent.pending_timers(), 0);
/// ```
#[derive(Debug, Clone)]
#[must_use = "Builder does nothing until .build() is called"]
pub struct AgentBuilder {
  clock: Option<Arc<dyn Clock>>,
  show_outline_ms: u64,
  scroll_restore_ms: u64,
  event_capacity: usize,
}

impl Default for AgentBuilder {
  fn default() -> Self {
    Self {
      clock: None,
      show_outline_ms: DEFAULT_SHOW_OUTLINE_MS,
      scroll_restore_ms: DEFAULT_SCROLL_RESTORE_MS,
      event_capacity: EVENT_CHANNEL_CAPACITY,
    }
  }
}

impl AgentBuilder {
  /// Time source for timers. Default: [`SystemClock`].
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  /// How long the `show` outline cue stays. Default: 2000ms.
  pub const fn show_outline_ms(mut self, ms: u64) -> Self {
    self.show_outline_ms = ms;
    self
  }

  /// How long a `scroll` reveal lasts. Default: 2000ms.
  pub const fn scroll_restore_ms(mut self, ms: u64) -> Self {
    self.scroll_restore_ms = ms;
    self
  }

  /// Event channel capacity. Oldest events are dropped on overflow. Default: 64.
  pub const fn event_capacity(mut self, capacity: usize) -> Self {
    self.event_capacity = capacity;
    self
  }

  /// Build an agent over a shared document.
  pub fn build<D: Dom>(self, dom: Arc<Mutex<D>>) -> PageAgent<D> {
    let (mut tx, rx) = async_broadcast::broadcast(self.event_capacity.max(1));
    tx.set_overflow(true);

    PageAgent {
      inner: Arc::new(Inner {
        dom,
        state: Mutex::new(AgentState::default()),
        clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
        config: AgentConfig {
          show_outline_ms: self.show_outline_ms,
          scroll_restore_ms: self.scroll_restore_ms,
        },
        events_tx: tx,
        events_keepalive: rx.deactivate(),
      }),
    }
  }
}

impl<D: Dom> PageAgent<D> {
  /// Subscribe to agent events.
  pub fn subscribe(&self) -> async_broadcast::Receiver<Event> {
    self.inner.events_keepalive.activate_cloned()
  }

  fn emit(&self, event: Event) {
    if let Err(e) = self.inner.events_tx.try_broadcast(event) {
      if e.is_full() {
        log::error!("Event channel overflow - events are being dropped.");
      }
    }
  }

  fn now(&self) -> u64 {
    self.inner.clock.now_ms()
  }

  /// Scan the document, remember the snapshot and broadcast `ScanComplete`.
  pub fn find_hidden_elements(&self) -> Vec<HiddenElementRecord> {
    let records = scan::scan(&*self.inner.dom.lock());
    self.inner.state.lock().last_snapshot.clone_from(&records);
    self.emit(Event::ScanComplete {
      elements: records.clone(),
    });
    records
  }

  /// The most recent snapshot produced by [`find_hidden_elements`](Self::find_hidden_elements).
  pub fn last_snapshot(&self) -> Vec<HiddenElementRecord> {
    self.inner.state.lock().last_snapshot.clone()
  }

  /// Resolve a record to its live element.
  pub fn find_element(&self, record: &HiddenElementRecord) -> Option<D::Node> {
    find_element_by_data(&*self.inner.dom.lock(), record)
  }

  /// Reveal the element. `false` if it cannot be found.
  pub fn show(&self, record: &HiddenElementRecord) -> bool {
    Self::report(ElementAction::Show, self.try_show(record))
  }

  /// Restore the element to the state captured by the first `show`.
  /// `false` if it cannot be found or was never shown.
  pub fn hide(&self, record: &HiddenElementRecord) -> bool {
    Self::report(ElementAction::Hide, self.try_hide(record))
  }

  /// Scroll the element into view with a transient reveal and highlight.
  pub fn scroll(&self, record: &HiddenElementRecord) -> bool {
    Self::report(ElementAction::Scroll, self.try_scroll(record))
  }

  /// Apply `action` to the element described by `record`.
  pub fn perform(&self, action: ElementAction, record: &HiddenElementRecord) -> bool {
    match action {
      ElementAction::Show => self.show(record),
      ElementAction::Hide => self.hide(record),
      ElementAction::Scroll => self.scroll(record),
    }
  }

  /// Like [`perform`](Self::perform) with the failure cause.
  pub fn try_perform(&self, action: ElementAction, record: &HiddenElementRecord) -> UnveilResult<()> {
    match action {
      ElementAction::Show => self.try_show(record),
      ElementAction::Hide => self.try_hide(record),
      ElementAction::Scroll => self.try_scroll(record),
    }
  }

  fn report(action: ElementAction, result: UnveilResult<()>) -> bool {
    match result {
      Ok(()) => true,
      Err(e) => {
        log::warn!("{action} failed: {e}");
        false
      }
    }
  }

  /// Number of armed timers across all elements.
  pub fn pending_timers(&self) -> usize {
    self.inner.state.lock().timers.len()
  }

  /// Whether the record's live element carries shadow state.
  pub fn has_shadow_state(&self, record: &HiddenElementRecord) -> bool {
    let dom = self.inner.dom.lock();
    let Some(node) = find_element_by_data(&*dom, record) else {
      return false;
    };
    self.inner.state.lock().registry.contains(&node)
  }

  /// Read the document.
  pub fn with_dom<R>(&self, f: impl FnOnce(&D) -> R) -> R {
    f(&self.inner.dom.lock())
  }

  /// Mutate the document directly (host-side edits between actions).
  pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
    f(&mut self.inner.dom.lock())
  }
}

/// One document context. Hosts at most one [`PageAgent`].
pub struct Page<D: Dom> {
  dom: Arc<Mutex<D>>,
  builder: AgentBuilder,
  agent: OnceLock<PageAgent<D>>,
}

impl<D: Dom> std::fmt::Debug for Page<D> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Page")
      .field("injected", &self.is_injected())
      .finish_non_exhaustive()
  }
}

impl<D: Dom> Page<D> {
  /// A page whose agent uses the default [`AgentBuilder`].
  pub fn new(dom: D) -> Self {
    Self::with_builder(dom, AgentBuilder::default())
  }

  /// A page whose agent will be built with `builder` on injection.
  pub fn with_builder(dom: D, builder: AgentBuilder) -> Self {
    Self {
      dom: Arc::new(Mutex::new(dom)),
      builder,
      agent: OnceLock::new(),
    }
  }

  /// Install the agent. Idempotent: later calls return the existing agent.
  pub fn inject(&self) -> PageAgent<D> {
    if let Some(agent) = self.agent.get() {
      log::debug!("page agent already injected");
      return agent.clone();
    }
    self
      .agent
      .get_or_init(|| {
        log::debug!("injecting page agent");
        self.builder.clone().build(Arc::clone(&self.dom))
      })
      .clone()
  }

  /// The injected agent, if any.
  pub fn agent(&self) -> Option<PageAgent<D>> {
    self.agent.get().cloned()
  }

  /// Whether [`inject`](Self::inject) has run.
  pub fn is_injected(&self) -> bool {
    self.agent.get().is_some()
  }

  /// Read the document.
  pub fn with_dom<R>(&self, f: impl FnOnce(&D) -> R) -> R {
    f(&self.dom.lock())
  }
}
