/*!
In-memory document.

An arena of document, element and text nodes with a [`NodeTree`] for shape,
a style cascade (user-agent rules, `<style>` elements, inline `style`),
selector matching through the `selectors` crate and the generic XPath
engine. Built programmatically or parsed from HTML with `scraper`.

Computed styles are resolved for every element at once and cached until the
next mutation.

```
use unveil::dom::{Dom, MemoryDocument};

let doc = MemoryDocument::parse_fragment(r#"<div id="a" style="display:none">Hi</div>"#);
let node = doc.element_by_id("a").unwrap();
assert_eq!(doc.computed_style(&node).unwrap().display, "none");
```
*/

mod parse;
mod select;
mod style;
mod tree;

use std::cell::OnceCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::css::{parse_declarations, parse_selector_list, serialize_declarations, Declaration};
use super::{ComputedStyle, Dom, ScrollOptions, StyleProperty};
use crate::types::{DomError, DomResult, Position};
use select::{Matcher, MemoryElement};
use style::Stylesheet;
use tree::NodeTree;

/// Handle to a node of a [`MemoryDocument`]. Stable for the document's lifetime.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  derive_more::Display,
  derive_more::From,
  derive_more::Into,
)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
struct ElementData {
  tag: String,
  attributes: Vec<(String, String)>,
  rect: Position,
}

#[derive(Debug, Clone)]
enum NodeData {
  Document,
  Element(ElementData),
  Text(String),
}

/// A mutable, self-contained document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
  nodes: Vec<NodeData>,
  tree: NodeTree,
  user_agent_sheet: Stylesheet,
  /// Rebuilt lazily after structural changes.
  author_sheet: OnceCell<Stylesheet>,
  /// Dropped on any mutation.
  styles: OnceCell<HashMap<NodeId, ComputedStyle>>,
  last_scroll: Option<(NodeId, ScrollOptions)>,
}

impl Default for MemoryDocument {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryDocument {
  /// The document node. Parent of the root element.
  pub const DOCUMENT: NodeId = NodeId(0);

  /// An empty document (no root element yet).
  pub fn new() -> Self {
    Self {
      nodes: vec![NodeData::Document],
      tree: NodeTree::new(),
      user_agent_sheet: Stylesheet::parse(style::USER_AGENT_CSS),
      author_sheet: OnceCell::new(),
      styles: OnceCell::new(),
      last_scroll: None,
    }
  }

  fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
    let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
    self.nodes.push(data);
    self.tree.append_child(parent, id);
    self.author_sheet.take();
    self.styles.take();
    id
  }

  /// Append an element as the last child of `parent`.
  pub fn append_element(
    &mut self,
    parent: NodeId,
    tag: &str,
    attributes: &[(&str, &str)],
  ) -> NodeId {
    let attributes = attributes
      .iter()
      .map(|(n, v)| (n.to_ascii_lowercase(), (*v).to_string()))
      .collect();
    self.push_element(parent, tag, attributes)
  }

  fn push_element(&mut self, parent: NodeId, tag: &str, attributes: Vec<(String, String)>) -> NodeId {
    self.push(
      parent,
      NodeData::Element(ElementData {
        tag: tag.to_ascii_lowercase(),
        attributes,
        rect: Position::default(),
      }),
    )
  }

  /// Append a text node as the last child of `parent`.
  pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
    self.push(parent, NodeData::Text(text.to_string()))
  }

  /// Detach a node and its subtree. Handles to removed nodes stay valid but
  /// report `is_connected() == false`.
  pub fn remove(&mut self, node: NodeId) {
    self.tree.remove_subtree(node);
    self.author_sheet.take();
    self.styles.take();
  }

  /// First connected element whose `id` attribute equals `id`.
  pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
    self
      .elements()
      .into_iter()
      .find(|n| self.attribute(n, "id").as_deref() == Some(id))
  }

  /// Set the layout box reported by [`Dom::bounding_rect`].
  pub fn set_bounding_rect(&mut self, node: NodeId, rect: Position) {
    if let Some(NodeData::Element(el)) = self.node_data_mut(node) {
      el.rect = rect;
    }
  }

  /// The most recent scroll request.
  pub const fn last_scroll(&self) -> Option<(NodeId, ScrollOptions)> {
    self.last_scroll
  }

  fn node_data(&self, node: NodeId) -> Option<&NodeData> {
    self.nodes.get(usize::try_from(node.0).ok()?)
  }

  fn node_data_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
    self.nodes.get_mut(usize::try_from(node.0).ok()?)
  }

  fn element(&self, node: NodeId) -> DomResult<&ElementData> {
    match self.node_data(node) {
      Some(NodeData::Element(el)) => Ok(el),
      Some(NodeData::Document | NodeData::Text(_)) => Err(DomError::NotAnElement(node.to_string())),
      None => Err(DomError::UnknownNode(node.to_string())),
    }
  }

  fn element_mut(&mut self, node: NodeId) -> DomResult<&mut ElementData> {
    match self.node_data_mut(node) {
      Some(NodeData::Element(el)) => Ok(el),
      Some(NodeData::Document | NodeData::Text(_)) => Err(DomError::NotAnElement(node.to_string())),
      None => Err(DomError::UnknownNode(node.to_string())),
    }
  }

  fn is_element(&self, node: NodeId) -> bool {
    matches!(self.node_data(node), Some(NodeData::Element(_)))
  }

  fn author_sheet(&self) -> &Stylesheet {
    self.author_sheet.get_or_init(|| {
      let css: String = self
        .elements()
        .into_iter()
        .filter(|n| self.tag_name(n) == "style")
        .map(|n| self.text_content(&n))
        .collect::<Vec<_>>()
        .join("\n");
      Stylesheet::parse(&css)
    })
  }

  fn inline_declarations(&self, node: NodeId) -> Vec<Declaration> {
    self
      .attribute(&node, "style")
      .map(|s| parse_declarations(&s))
      .unwrap_or_default()
  }

  fn styles(&self) -> &HashMap<NodeId, ComputedStyle> {
    self.styles.get_or_init(|| style::compute_all(self))
  }
}

impl Dom for MemoryDocument {
  type Node = NodeId;

  fn elements(&self) -> Vec<NodeId> {
    self
      .tree
      .descendants(Self::DOCUMENT)
      .into_iter()
      .filter(|&n| self.is_element(n))
      .collect()
  }

  fn document_element(&self) -> Option<NodeId> {
    self
      .tree
      .children(Self::DOCUMENT)
      .iter()
      .copied()
      .find(|&n| self.is_element(n))
  }

  fn tag_name(&self, node: &NodeId) -> String {
    self.element(*node).map(|el| el.tag.clone()).unwrap_or_default()
  }

  fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
    self.tree.parent(*node).filter(|&p| self.is_element(p))
  }

  fn children(&self, node: &NodeId) -> Vec<NodeId> {
    self
      .tree
      .children(*node)
      .iter()
      .copied()
      .filter(|&n| self.is_element(n))
      .collect()
  }

  fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
    self
      .element(*node)
      .map(|el| el.attributes.clone())
      .unwrap_or_default()
  }

  fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
    self
      .element(*node)
      .ok()?
      .attributes
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, v)| v.clone())
  }

  fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> DomResult<()> {
    self.styles.take();
    let el = self.element_mut(*node)?;
    let name = name.to_ascii_lowercase();
    match el.attributes.iter_mut().find(|(n, _)| *n == name) {
      Some((_, v)) => *v = value.to_string(),
      None => el.attributes.push((name, value.to_string())),
    }
    Ok(())
  }

  fn remove_attribute(&mut self, node: &NodeId, name: &str) -> DomResult<()> {
    self.styles.take();
    let el = self.element_mut(*node)?;
    el.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    Ok(())
  }

  fn text_content(&self, node: &NodeId) -> String {
    if let Some(NodeData::Text(text)) = self.node_data(*node) {
      return text.clone();
    }
    self
      .tree
      .descendants(*node)
      .into_iter()
      .filter_map(|n| match self.node_data(n) {
        Some(NodeData::Text(text)) => Some(text.as_str()),
        Some(NodeData::Document | NodeData::Element(_)) | None => None,
      })
      .collect()
  }

  fn computed_style(&self, node: &NodeId) -> DomResult<ComputedStyle> {
    self.element(*node)?;
    self
      .styles()
      .get(node)
      .cloned()
      .ok_or_else(|| DomError::StyleUnavailable {
        node: node.to_string(),
        reason: "element is not connected".to_string(),
      })
  }

  fn inline_style(&self, node: &NodeId, property: StyleProperty) -> String {
    self
      .inline_declarations(*node)
      .into_iter()
      .rev()
      .find(|d| d.name == property.css_name())
      .map(|d| d.value)
      .unwrap_or_default()
  }

  fn set_inline_style(
    &mut self,
    node: &NodeId,
    property: StyleProperty,
    value: &str,
  ) -> DomResult<()> {
    self.element(*node)?;
    let name = property.css_name();
    let mut decls = self.inline_declarations(*node);
    let slot = decls.iter().position(|d| d.name == name);
    decls.retain(|d| d.name != name);

    let value = value.trim();
    if !value.is_empty() {
      let decl = Declaration {
        name: name.to_string(),
        value: value.to_string(),
        important: false,
      };
      match slot {
        Some(i) if i <= decls.len() => decls.insert(i, decl),
        Some(_) | None => decls.push(decl),
      }
    }

    if decls.is_empty() && !self.has_attribute(node, "style") {
      return Ok(());
    }
    self.set_attribute(node, "style", &serialize_declarations(&decls))
  }

  fn bounding_rect(&self, node: &NodeId) -> Position {
    self.element(*node).map(|el| el.rect).unwrap_or_default()
  }

  fn scroll_into_view(&mut self, node: &NodeId, options: ScrollOptions) -> DomResult<()> {
    self.element(*node)?;
    if !self.is_connected(node) {
      return Err(DomError::UnknownNode(node.to_string()));
    }
    self.last_scroll = Some((*node, options));
    Ok(())
  }

  fn is_connected(&self, node: &NodeId) -> bool {
    let mut current = *node;
    loop {
      if current == Self::DOCUMENT {
        return true;
      }
      match self.tree.parent(current) {
        Some(parent) => current = parent,
        None => return false,
      }
    }
  }

  fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
    let list = parse_selector_list(selector)?;
    let mut matcher = Matcher::default();
    Ok(
      self
        .elements()
        .into_iter()
        .filter(|&n| MemoryElement::new(self, n).is_some_and(|el| matcher.matches(&list, &el)))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn styled(css: &str, body: &str) -> MemoryDocument {
    MemoryDocument::parse_html(&format!(
      "<html><head><style>{css}</style></head><body>{body}</body></html>"
    ))
  }

  fn computed(doc: &MemoryDocument, id: &str) -> ComputedStyle {
    let node = doc.element_by_id(id).unwrap();
    doc.computed_style(&node).unwrap()
  }

  mod building {
    use super::*;

    #[test]
    fn programmatic_tree() {
      let mut doc = MemoryDocument::new();
      let html = doc.append_element(MemoryDocument::DOCUMENT, "HTML", &[]);
      let body = doc.append_element(html, "body", &[]);
      let div = doc.append_element(body, "div", &[("ID", "x"), ("class", "a b")]);
      doc.append_text(div, "hello");

      assert_eq!(doc.document_element(), Some(html));
      assert_eq!(doc.elements(), vec![html, body, div]);
      assert_eq!(doc.tag_name(&html), "html");
      assert_eq!(doc.attribute(&div, "id").as_deref(), Some("x"));
      assert_eq!(doc.parent_element(&div), Some(body));
      assert_eq!(doc.parent_element(&html), None);
      assert_eq!(doc.text_content(&body), "hello");
    }

    #[test]
    fn removed_nodes_are_disconnected() {
      let mut doc = MemoryDocument::parse_fragment("<div id='a'><span id='b'></span></div>");
      let a = doc.element_by_id("a").unwrap();
      let b = doc.element_by_id("b").unwrap();
      doc.remove(a);
      assert!(!doc.is_connected(&a));
      assert!(!doc.is_connected(&b));
      assert!(doc.element_by_id("b").is_none());
      assert!(doc.computed_style(&b).is_err());
    }

    #[test]
    fn parse_html_builds_head_and_body() {
      let doc = MemoryDocument::parse_html("<p>x</p>");
      let tags: Vec<String> = doc.elements().iter().map(|n| doc.tag_name(n)).collect();
      assert_eq!(tags, vec!["html", "head", "body", "p"]);
    }

    #[test]
    fn parse_fragment_has_lone_root() {
      let doc = MemoryDocument::parse_fragment("<p>x</p><p>y</p>");
      let tags: Vec<String> = doc.elements().iter().map(|n| doc.tag_name(n)).collect();
      assert_eq!(tags, vec!["html", "p", "p"]);
    }
  }

  mod inline_styles {
    use super::*;

    #[test]
    fn set_preserves_position_and_removes_on_empty() {
      let mut doc = MemoryDocument::parse_fragment(
        "<div id='a' style='color: red; display: none; opacity: 0.5'></div>",
      );
      let a = doc.element_by_id("a").unwrap();

      doc.set_inline_style(&a, StyleProperty::Display, "block").unwrap();
      assert_eq!(
        doc.attribute(&a, "style").as_deref(),
        Some("color: red; display: block; opacity: 0.5;")
      );

      doc.set_inline_style(&a, StyleProperty::Opacity, "").unwrap();
      assert_eq!(doc.inline_style(&a, StyleProperty::Opacity), "");
      assert_eq!(doc.inline_style(&a, StyleProperty::Display), "block");
    }

    #[test]
    fn clearing_absent_property_adds_no_attribute() {
      let mut doc = MemoryDocument::parse_fragment("<div id='a'></div>");
      let a = doc.element_by_id("a").unwrap();
      doc.set_inline_style(&a, StyleProperty::Outline, "").unwrap();
      assert!(!doc.has_attribute(&a, "style"));
    }
  }

  mod cascade {
    use super::*;

    #[test]
    fn user_agent_hides_head_and_hidden_attribute() {
      let doc = MemoryDocument::parse_html("<p id='p' hidden>x</p>");
      let head = doc.elements()[1];
      assert_eq!(doc.computed_style(&head).unwrap().display, "none");
      assert_eq!(computed(&doc, "p").display, "none");
    }

    #[test]
    fn inline_beats_author_rules() {
      let doc = styled(".h { display: none }", "<div id='a' class='h' style='display:flex'></div>");
      assert_eq!(computed(&doc, "a").display, "flex");
    }

    #[test]
    fn important_beats_inline() {
      let doc = styled(
        ".h { display: none !important }",
        "<div id='a' class='h' style='display:flex'></div>",
      );
      assert_eq!(computed(&doc, "a").display, "none");
    }

    #[test]
    fn specificity_then_source_order() {
      let doc = styled(
        "#a { opacity: 0 } .x { opacity: 1 } div { visibility: hidden } div { visibility: visible }",
        "<div id='a' class='x'></div>",
      );
      let style = computed(&doc, "a");
      assert_eq!(style.opacity, "0");
      assert_eq!(style.visibility, "visible");
    }

    #[test]
    fn visibility_inherits_display_does_not() {
      let doc = styled(
        "",
        "<div id='outer' style='visibility:hidden; display:none'><span id='inner'></span></div>",
      );
      let inner = computed(&doc, "inner");
      assert_eq!(inner.visibility, "hidden");
      assert_eq!(inner.display, "inline");
      assert_eq!(inner.opacity, "1");
    }

    #[test]
    fn explicit_inherit_keyword() {
      let doc = styled(
        "",
        "<div id='outer' style='opacity:0'><p id='inner' style='opacity: inherit'></p></div>",
      );
      assert!(computed(&doc, "inner").is_transparent());
    }

    #[test]
    fn screen_media_and_full_selector_syntax() {
      let doc = styled(
        "@media screen { .m { display: none } }
         @media print { .p { display: none } }
         .n:not(.keep) { display: none }
         li + li { visibility: hidden }
         [class^=gh] { opacity: 0 }",
        "<div id='m' class='m'></div>
         <div id='p' class='p'></div>
         <div id='n' class='n'></div><div id='k' class='n keep'></div>
         <ul><li id='first'>a</li><li id='second'>b</li></ul>
         <span id='g' class='ghost'></span>",
      );
      assert_eq!(computed(&doc, "m").display, "none");
      assert_eq!(computed(&doc, "p").display, "block");
      assert_eq!(computed(&doc, "n").display, "none");
      assert_eq!(computed(&doc, "k").display, "block");
      assert_eq!(computed(&doc, "first").visibility, "visible");
      assert_eq!(computed(&doc, "second").visibility, "hidden");
      assert!(computed(&doc, "g").is_transparent());
    }

    #[test]
    fn deep_nesting_inherits_without_recursion() {
      let depth = 3000;
      let html = format!(
        "<div style='visibility:hidden'>{}<span id='deep' hidden></span>{}</div>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
      );
      let doc = MemoryDocument::parse_fragment(&html);
      let deep = computed(&doc, "deep");
      assert_eq!(deep.display, "none");
      assert_eq!(deep.visibility, "hidden");
    }

    #[test]
    fn attribute_change_invalidates_styles() {
      let mut doc = styled(".h { display: none }", "<div id='a'></div>");
      let a = doc.element_by_id("a").unwrap();
      assert_eq!(computed(&doc, "a").display, "block");
      doc.set_attribute(&a, "class", "h").unwrap();
      assert_eq!(computed(&doc, "a").display, "none");
      doc.remove_attribute(&a, "class").unwrap();
      assert_eq!(computed(&doc, "a").display, "block");
    }

    #[test]
    fn author_sheet_refreshes_after_structural_change() {
      let mut doc = MemoryDocument::parse_html("<div id='a' class='late'></div>");
      assert_eq!(computed(&doc, "a").display, "block");
      let head = doc.elements()[1];
      let style = doc.append_element(head, "style", &[]);
      doc.append_text(style, ".late { display: none }");
      assert_eq!(computed(&doc, "a").display, "none");
    }
  }

  #[test]
  fn scroll_requests_are_recorded() {
    let mut doc = MemoryDocument::parse_fragment("<div id='a'></div>");
    let a = doc.element_by_id("a").unwrap();
    doc.scroll_into_view(&a, ScrollOptions::smooth_center()).unwrap();
    assert_eq!(doc.last_scroll(), Some((a, ScrollOptions::smooth_center())));
  }
}
