/*! Core types for unveil.

Regenerate TypeScript types: `cargo test -p unveil export_bindings`
*/

#![allow(missing_docs)]

mod action;
mod error;
mod event;
mod geometry;
mod hidden;
mod record;

pub use action::ElementAction;
pub use error::{ChannelError, DomError, DomResult, UnveilError, UnveilResult};
pub use event::Event;
pub use geometry::Position;
pub use hidden::HiddenKind;
pub use record::HiddenElementRecord;
