/*! Selector matching for [`MemoryDocument`] through the `selectors` crate. */

use std::fmt;

use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
  self, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
  NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::SelectorImpl;
use selectors::{Element, NthIndexCache, OpaqueElement};

use super::{ElementData, MemoryDocument, NodeData, NodeId};
use crate::dom::css::SelectorList;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// An element of a [`MemoryDocument`] as seen by the selector matcher.
#[derive(Clone, Copy)]
pub(super) struct MemoryElement<'a> {
  doc: &'a MemoryDocument,
  id: NodeId,
  data: &'a ElementData,
}

impl fmt::Debug for MemoryElement<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<{} #{}>", self.data.tag, self.id)
  }
}

impl<'a> MemoryElement<'a> {
  /// `None` unless `id` is an element.
  pub(super) fn new(doc: &'a MemoryDocument, id: NodeId) -> Option<Self> {
    match doc.node_data(id)? {
      NodeData::Element(data) => Some(Self { doc, id, data }),
      NodeData::Document | NodeData::Text(_) => None,
    }
  }

  fn attr(&self, name: &str) -> Option<&'a str> {
    self
      .data
      .attributes
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
  }

  fn siblings(&self) -> &'a [NodeId] {
    self
      .doc
      .tree
      .parent(self.id)
      .map_or(&[], |parent| self.doc.tree.children(parent))
  }

  fn first_element(&self, mut ids: impl Iterator<Item = &'a NodeId>) -> Option<Self> {
    let doc = self.doc;
    ids.find_map(|&id| Self::new(doc, id))
  }
}

impl Element for MemoryElement<'_> {
  type Impl = Simple;

  fn opaque(&self) -> OpaqueElement {
    OpaqueElement::new(self.data)
  }

  fn parent_element(&self) -> Option<Self> {
    let parent = self.doc.tree.parent(self.id)?;
    Self::new(self.doc, parent)
  }

  fn parent_node_is_shadow_root(&self) -> bool {
    false
  }

  fn containing_shadow_host(&self) -> Option<Self> {
    None
  }

  fn is_pseudo_element(&self) -> bool {
    false
  }

  fn prev_sibling_element(&self) -> Option<Self> {
    let siblings = self.siblings();
    let position = siblings.iter().position(|&id| id == self.id)?;
    self.first_element(siblings.get(..position)?.iter().rev())
  }

  fn next_sibling_element(&self) -> Option<Self> {
    let siblings = self.siblings();
    let position = siblings.iter().position(|&id| id == self.id)?;
    self.first_element(siblings.get(position + 1..)?.iter())
  }

  fn first_element_child(&self) -> Option<Self> {
    self.first_element(self.doc.tree.children(self.id).iter())
  }

  fn is_html_element_in_html_document(&self) -> bool {
    true
  }

  fn has_local_name(&self, local_name: &CssLocalName) -> bool {
    self.data.tag == *local_name.0
  }

  fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
    &**ns == HTML_NAMESPACE
  }

  fn is_same_type(&self, other: &Self) -> bool {
    self.data.tag == other.data.tag
  }

  fn attr_matches(
    &self,
    ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
    local_name: &CssLocalName,
    operation: &AttrSelectorOperation<&CssString>,
  ) -> bool {
    if let NamespaceConstraint::Specific(url) = ns {
      if !url.is_empty() {
        return false;
      }
    }
    self
      .data
      .attributes
      .iter()
      .any(|(name, value)| *name == *local_name.0 && operation.eval_str(value))
  }

  fn match_non_ts_pseudo_class(
    &self,
    pc: &NonTSPseudoClass,
    _context: &mut MatchingContext<'_, Simple>,
  ) -> bool {
    match *pc {}
  }

  fn match_pseudo_element(
    &self,
    pe: &PseudoElement,
    _context: &mut MatchingContext<'_, Simple>,
  ) -> bool {
    match *pe {}
  }

  fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

  fn is_link(&self) -> bool {
    matches!(self.data.tag.as_str(), "a" | "area") && self.attr("href").is_some()
  }

  fn is_html_slot_element(&self) -> bool {
    self.data.tag == "slot"
  }

  fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
    self
      .attr("id")
      .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
  }

  fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
    self.attr("class").is_some_and(|classes| {
      classes
        .split_ascii_whitespace()
        .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
    })
  }

  fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
    None
  }

  fn is_part(&self, _name: &CssLocalName) -> bool {
    false
  }

  fn is_empty(&self) -> bool {
    self
      .doc
      .tree
      .children(self.id)
      .iter()
      .all(|&child| match self.doc.node_data(child) {
        Some(NodeData::Element(_)) => false,
        Some(NodeData::Text(text)) => text.is_empty(),
        Some(NodeData::Document) | None => true,
      })
  }

  fn is_root(&self) -> bool {
    self.doc.tree.parent(self.id) == Some(MemoryDocument::DOCUMENT)
  }
}

/// Matches selector lists against elements, sharing `:nth-*` bookkeeping
/// across calls. Use one matcher per pass over an unchanged document.
#[derive(Default)]
pub(super) struct Matcher {
  nth_index_cache: NthIndexCache,
}

impl Matcher {
  /// Highest specificity among the selectors in `list` that match `element`.
  pub(super) fn specificity(
    &mut self,
    list: &SelectorList,
    element: &MemoryElement<'_>,
  ) -> Option<u32> {
    let mut context = MatchingContext::new(
      MatchingMode::Normal,
      None,
      &mut self.nth_index_cache,
      QuirksMode::NoQuirks,
      NeedsSelectorFlags::No,
      IgnoreNthChildForInvalidation::No,
    );
    list
      .0
      .iter()
      .filter(|selector| matching::matches_selector(selector, 0, None, element, &mut context))
      .map(selectors::parser::Selector::specificity)
      .max()
  }

  pub(super) fn matches(&mut self, list: &SelectorList, element: &MemoryElement<'_>) -> bool {
    self.specificity(list, element).is_some()
  }
}

#[cfg(test)]
mod tests {
  use crate::dom::{Dom, MemoryDocument};

  fn ids(doc: &MemoryDocument, selector: &str) -> Vec<String> {
    doc
      .query_selector_all(selector)
      .unwrap()
      .iter()
      .filter_map(|n| doc.attribute(n, "id"))
      .collect()
  }

  fn doc() -> MemoryDocument {
    MemoryDocument::parse_fragment(
      "<ul id='list'>\
         <li id='a' class='gh-x keep'>a</li>\
         <li id='b' class='n'>b</li>\
         <li id='c' class='n keep' data-role='tab'>c</li>\
       </ul>\
       <p id='d'></p><p id='e'>e</p>",
    )
  }

  #[test]
  fn combinators() {
    let doc = doc();
    assert_eq!(ids(&doc, "li + li"), vec!["b", "c"]);
    assert_eq!(ids(&doc, "#a ~ li"), vec!["b", "c"]);
    assert_eq!(ids(&doc, "ul > li.n"), vec!["b", "c"]);
    assert_eq!(ids(&doc, "html li#c"), vec!["c"]);
  }

  #[test]
  fn negation_and_attribute_operators() {
    let doc = doc();
    assert_eq!(ids(&doc, ".n:not(.keep)"), vec!["b"]);
    assert_eq!(ids(&doc, "[class^=gh]"), vec!["a"]);
    assert_eq!(ids(&doc, "[class*=eep]"), vec!["a", "c"]);
    assert_eq!(ids(&doc, "[data-role$=ab]"), vec!["c"]);
    assert_eq!(ids(&doc, "[class~=keep]"), vec!["a", "c"]);
  }

  #[test]
  fn structural_pseudo_classes() {
    let doc = doc();
    assert_eq!(ids(&doc, "li:nth-child(2n+1)"), vec!["a", "c"]);
    assert_eq!(ids(&doc, "li:nth-child(2)"), vec!["b"]);
    assert_eq!(ids(&doc, "li:last-child"), vec!["c"]);
    assert_eq!(ids(&doc, "p:empty"), vec!["d"]);
    assert_eq!(ids(&doc, "p:nth-of-type(2)"), vec!["e"]);
    assert!(ids(&doc, ":root").is_empty());
    assert_eq!(doc.query_selector_all(":root").unwrap().len(), 1);
  }

  #[test]
  fn invalid_selector_is_an_error() {
    assert!(doc().query_selector_all("li[").is_err());
    assert!(doc().query_selector_all("").is_err());
  }
}
