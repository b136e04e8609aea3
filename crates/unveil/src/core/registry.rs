/*!
Shadow-state side table.

Per-element bookkeeping for reversible mutations lives here, keyed by the
document's own node handle. Nothing is written onto the element itself.
An entry is created by the first mutating action against an element and
removed when the element is fully restored.
*/

use std::collections::HashMap;
use std::hash::Hash;

use crate::dom::{Dom, StyleProperty};
use crate::types::{DomResult, HiddenKind};

/// Transient outline applied as a visual cue.
pub(crate) const OUTLINE_CUE: &str = "1.5px dashed brown";
pub(crate) const OUTLINE_OFFSET_CUE: &str = "2px";

/// Inline outline declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct OutlineState {
  pub(crate) outline: String,
  pub(crate) outline_offset: String,
}

impl OutlineState {
  pub(crate) fn capture<D: Dom>(dom: &D, node: &D::Node) -> Self {
    Self {
      outline: dom.inline_style(node, StyleProperty::Outline),
      outline_offset: dom.inline_style(node, StyleProperty::OutlineOffset),
    }
  }

  pub(crate) fn apply<D: Dom>(&self, dom: &mut D, node: &D::Node) -> DomResult<()> {
    dom.set_inline_style(node, StyleProperty::Outline, &self.outline)?;
    dom.set_inline_style(node, StyleProperty::OutlineOffset, &self.outline_offset)
  }

  pub(crate) fn cue<D: Dom>(dom: &mut D, node: &D::Node) -> DomResult<()> {
    dom.set_inline_style(node, StyleProperty::Outline, OUTLINE_CUE)?;
    dom.set_inline_style(node, StyleProperty::OutlineOffset, OUTLINE_OFFSET_CUE)
  }
}

/// Everything a reveal touches: `hidden` presence plus the inline
/// `display`/`visibility`/`opacity`/`outline`/`outline-offset` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InlineSnapshot {
  pub(crate) hidden: bool,
  pub(crate) display: String,
  pub(crate) visibility: String,
  pub(crate) opacity: String,
  pub(crate) outline: OutlineState,
}

impl InlineSnapshot {
  pub(crate) fn capture<D: Dom>(dom: &D, node: &D::Node) -> Self {
    Self {
      hidden: dom.has_attribute(node, "hidden"),
      display: dom.inline_style(node, StyleProperty::Display),
      visibility: dom.inline_style(node, StyleProperty::Visibility),
      opacity: dom.inline_style(node, StyleProperty::Opacity),
      outline: OutlineState::capture(dom, node),
    }
  }

  /// Put back `hidden` and the three visibility-related inline styles.
  pub(crate) fn restore_visibility<D: Dom>(&self, dom: &mut D, node: &D::Node) -> DomResult<()> {
    if self.hidden {
      dom.set_attribute(node, "hidden", "")?;
    } else {
      dom.remove_attribute(node, "hidden")?;
    }
    dom.set_inline_style(node, StyleProperty::Display, &self.display)?;
    dom.set_inline_style(node, StyleProperty::Visibility, &self.visibility)?;
    dom.set_inline_style(node, StyleProperty::Opacity, &self.opacity)
  }

  pub(crate) fn restore<D: Dom>(&self, dom: &mut D, node: &D::Node) -> DomResult<()> {
    self.restore_visibility(dom, node)?;
    self.outline.apply(dom, node)
  }
}

/// Force an element visible: drop `hidden`, override the three styles inline.
pub(crate) fn reveal<D: Dom>(dom: &mut D, node: &D::Node) -> DomResult<()> {
  dom.remove_attribute(node, "hidden")?;
  dom.set_inline_style(node, StyleProperty::Display, "block")?;
  dom.set_inline_style(node, StyleProperty::Visibility, "visible")?;
  dom.set_inline_style(node, StyleProperty::Opacity, "1")
}

/// Apply the hiding effect a [`HiddenKind`] implies.
pub(crate) fn apply_hiding<D: Dom>(dom: &mut D, node: &D::Node, kind: HiddenKind) -> DomResult<()> {
  match kind {
    HiddenKind::Attribute => {
      dom.set_attribute(node, "hidden", "")?;
      dom.set_inline_style(node, StyleProperty::Display, "none")
    }
    HiddenKind::Display => dom.set_inline_style(node, StyleProperty::Display, "none"),
    HiddenKind::Visibility => dom.set_inline_style(node, StyleProperty::Visibility, "hidden"),
    HiddenKind::Opacity => dom.set_inline_style(node, StyleProperty::Opacity, "0"),
  }
}

/// Bookkeeping for one live element.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShadowState {
  /// Captured once, on the first `show`.
  pub(crate) original: Option<InlineSnapshot>,
  /// Set by an explicit `show`; scroll restores leave the element alone.
  pub(crate) temporarily_shown: bool,
}

/// Side table from node handle to [`ShadowState`].
#[derive(Debug, Clone)]
pub(crate) struct ShadowRegistry<N> {
  entries: HashMap<N, ShadowState>,
}

impl<N> Default for ShadowRegistry<N> {
  fn default() -> Self {
    Self {
      entries: HashMap::new(),
    }
  }
}

impl<N: Clone + Eq + Hash> ShadowRegistry<N> {
  pub(crate) fn get(&self, node: &N) -> Option<&ShadowState> {
    self.entries.get(node)
  }

  /// Entry for `node`, created on first use.
  pub(crate) fn entry(&mut self, node: N) -> &mut ShadowState {
    self.entries.entry(node).or_default()
  }

  pub(crate) fn remove(&mut self, node: &N) -> Option<ShadowState> {
    self.entries.remove(node)
  }

  pub(crate) fn contains(&self, node: &N) -> bool {
    self.entries.contains_key(node)
  }
}
