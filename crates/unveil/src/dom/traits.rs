/*!
Document abstraction traits.

These traits define the contract between the scanner/page agent and a host
document. Hosts (an in-memory tree, a browser binding) implement [`Dom`];
core code only uses this trait, never a concrete document type.
*/

use std::fmt;
use std::hash::Hash;

use crate::types::{DomResult, Position};

/// Inline style properties the page agent reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
  /// `display`
  Display,
  /// `visibility`
  Visibility,
  /// `opacity`
  Opacity,
  /// `outline`, used for the reveal cue.
  Outline,
  /// `outline-offset`
  OutlineOffset,
}

impl StyleProperty {
  /// CSS property name.
  pub const fn css_name(self) -> &'static str {
    match self {
      Self::Display => "display",
      Self::Visibility => "visibility",
      Self::Opacity => "opacity",
      Self::Outline => "outline",
      Self::OutlineOffset => "outline-offset",
    }
  }
}

/// The computed values relevant to hidden-element classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
  /// Computed `display`, e.g. `block` or `none`.
  pub display: String,
  /// Computed `visibility`. Inherited.
  pub visibility: String,
  /// Computed `opacity` as written, e.g. `0`, `.5` or `0.0`.
  pub opacity: String,
}

impl Default for ComputedStyle {
  fn default() -> Self {
    Self {
      display: "inline".to_string(),
      visibility: "visible".to_string(),
      opacity: "1".to_string(),
    }
  }
}

impl ComputedStyle {
  /// True when the opacity parses (leading-number semantics) to exactly zero.
  #[allow(clippy::float_cmp)]
  pub fn is_transparent(&self) -> bool {
    super::parse_float(&self.opacity).is_some_and(|v| v == 0.0)
  }
}

/// How a scroll is animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
  /// Host default.
  #[default]
  Auto,
  /// Animated.
  Smooth,
  /// Jump.
  Instant,
}

/// Where the element lands in the viewport along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
  /// Leading edge.
  #[default]
  Start,
  /// Middle of the viewport.
  Center,
  /// Trailing edge.
  End,
  /// Least movement that makes the element visible.
  Nearest,
}

/// Options for [`Dom::scroll_into_view`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOptions {
  /// Animation.
  pub behavior: ScrollBehavior,
  /// Vertical alignment.
  pub block: ScrollAlign,
  /// Horizontal alignment.
  pub inline: ScrollAlign,
}

impl ScrollOptions {
  /// Smooth scroll that centers the element on both axes.
  pub const fn smooth_center() -> Self {
    Self {
      behavior: ScrollBehavior::Smooth,
      block: ScrollAlign::Center,
      inline: ScrollAlign::Center,
    }
  }
}

/// A live document the scanner can read and the page agent can mutate.
///
/// `Node` is the host's element handle. It must be cheap to clone and stable
/// for the lifetime of the element: the page agent keys its shadow-state side
/// table by it.
pub trait Dom {
  /// Element handle type for this host.
  type Node: Clone + Eq + Hash + fmt::Debug + Send + 'static;

  /// Every connected element in document order.
  fn elements(&self) -> Vec<Self::Node>;

  /// The root element (`<html>`), if any.
  fn document_element(&self) -> Option<Self::Node>;

  /// Lowercase tag name.
  fn tag_name(&self, node: &Self::Node) -> String;

  /// Parent element. `None` for the root element and detached nodes.
  fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

  /// Element children in document order.
  fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

  /// All attributes in source order.
  fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

  /// Value of one attribute, by lowercase name.
  fn attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
    self
      .attributes(node)
      .into_iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v)
  }

  /// Whether the attribute is present, whatever its value.
  fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
    self.attribute(node, name).is_some()
  }

  /// Add or replace an attribute.
  fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> DomResult<()>;

  /// Remove an attribute. Removing an absent one is not an error.
  fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> DomResult<()>;

  /// Concatenated descendant text (`textContent`).
  fn text_content(&self, node: &Self::Node) -> String;

  /// Rendered text (`innerText`). Hosts without layout return `None`.
  fn rendered_text(&self, _node: &Self::Node) -> Option<String> {
    None
  }

  /// Computed style. Failing here only skips this element during a scan.
  fn computed_style(&self, node: &Self::Node) -> DomResult<ComputedStyle>;

  /// Inline declaration value, or the empty string when not set.
  fn inline_style(&self, node: &Self::Node, property: StyleProperty) -> String;

  /// Set an inline declaration. The empty string removes it.
  fn set_inline_style(
    &mut self,
    node: &Self::Node,
    property: StyleProperty,
    value: &str,
  ) -> DomResult<()>;

  /// Layout box relative to the viewport. Zero-sized when the host has no layout.
  fn bounding_rect(&self, node: &Self::Node) -> Position;

  /// Scroll the nearest scrollable ancestors so the element is in view.
  fn scroll_into_view(&mut self, node: &Self::Node, options: ScrollOptions) -> DomResult<()>;

  /// Whether the node is still attached to the document.
  fn is_connected(&self, node: &Self::Node) -> bool;

  /// All elements matching a CSS selector, in document order.
  fn query_selector_all(&self, selector: &str) -> DomResult<Vec<Self::Node>>;

  /// First node (in document order) selected by an XPath expression.
  fn evaluate_xpath(&self, xpath: &str) -> DomResult<Option<Self::Node>>
  where
    Self: Sized,
  {
    super::xpath::evaluate_first(self, xpath)
  }
}
