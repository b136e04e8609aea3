/*!
Host document abstraction.

The scanner and the page agent only talk to a document through the [`Dom`]
trait. [`MemoryDocument`] is a complete in-process implementation backed by
an arena tree, an HTML parser, a style cascade over `cssparser`, selector
matching through `selectors` and the generic [`xpath`] engine.
*/

mod css;
pub mod memory;
mod traits;
pub mod xpath;

pub(crate) use css::parse_float;
pub use memory::{MemoryDocument, NodeId};
pub use traits::{ComputedStyle, Dom, ScrollAlign, ScrollBehavior, ScrollOptions, StyleProperty};
