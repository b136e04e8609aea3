/*!
Unveil - find, reveal and re-hide elements hidden from rendering.

```
use unveil::{ElementAction, HiddenKind, MemoryDocument, Page};

// One document context; injection is idempotent
let page = Page::new(MemoryDocument::parse_fragment(
  r#"<div id="a" style="display:none">Hi</div>"#,
));
let agent = page.inject();

// Scan: one serializable record per hidden element
let records = agent.find_hidden_elements();
assert_eq!(records[0].selector, "#a");
assert_eq!(records[0].hidden_kind, HiddenKind::Display);

// Records are re-resolved against the live document on every action
assert!(agent.perform(ElementAction::Show, &records[0]));
assert!(agent.perform(ElementAction::Hide, &records[0]));

// Timers (outline removal, scroll restore) fire on tick
agent.tick();
```
*/

mod core;
mod ticker;
mod types;

pub mod client;
pub mod dom;
pub mod protocol;
pub mod scan;

pub use types::*;

pub use crate::core::{
  find_element_by_data, AgentBuilder, Clock, ManualClock, Page, PageAgent, SystemClock,
  DEFAULT_SCROLL_RESTORE_MS, DEFAULT_SHOW_OUTLINE_MS,
};
pub use crate::dom::{Dom, MemoryDocument, NodeId};
pub use crate::ticker::{Ticker, DEFAULT_TICK_INTERVAL_MS};
