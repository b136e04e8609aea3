/*!
Scanner: walks every element in document order and records the hidden ones.

Classification is first-match-wins in [`HiddenKind`] priority order:
`hidden` attribute, then computed `display: none`, `visibility: hidden`,
and finally an opacity that parses to exactly zero. The scan never mutates the
document; an element that fails classification is logged and skipped.
*/

pub mod identity;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::dom::Dom;
use crate::types::{DomResult, HiddenElementRecord, HiddenKind, UnveilError, UnveilResult};

pub use identity::{generate_unique_selector, get_xpath, relevant_attributes, text_preview};

/// Hidden kind of an element, or `None` when it is visible by all four criteria.
pub fn classify<D: Dom>(dom: &D, node: &D::Node) -> DomResult<Option<HiddenKind>> {
  if dom.has_attribute(node, "hidden") {
    return Ok(Some(HiddenKind::Attribute));
  }
  let style = dom.computed_style(node)?;
  let kind = if style.display == "none" {
    Some(HiddenKind::Display)
  } else if style.visibility == "hidden" {
    Some(HiddenKind::Visibility)
  } else if style.is_transparent() {
    Some(HiddenKind::Opacity)
  } else {
    None
  };
  Ok(kind)
}

/// Live four-condition check, same rules as [`classify`].
pub fn is_hidden<D: Dom>(dom: &D, node: &D::Node) -> DomResult<bool> {
  classify(dom, node).map(|kind| kind.is_some())
}

/// Scan the whole document.
pub fn scan<D: Dom>(dom: &D) -> Vec<HiddenElementRecord> {
  scan_at(dom, unix_millis())
}

/// Scan with an explicit timestamp for record ids.
pub fn scan_at<D: Dom>(dom: &D, timestamp_ms: u128) -> Vec<HiddenElementRecord> {
  let records: Vec<HiddenElementRecord> = dom
    .elements()
    .iter()
    .enumerate()
    .filter_map(|(index, node)| match describe(dom, node, index, timestamp_ms) {
      Ok(record) => record,
      Err(e) => {
        log::warn!("skipping element during scan: {e}");
        None
      }
    })
    .collect();
  log::debug!("scan found {} hidden elements", records.len());
  records
}

/// Build the record for one element if it is hidden.
pub(crate) fn describe<D: Dom>(
  dom: &D,
  node: &D::Node,
  index: usize,
  timestamp_ms: u128,
) -> UnveilResult<Option<HiddenElementRecord>> {
  let kind = classify(dom, node).map_err(|source| UnveilError::ElementScanFailed {
    node: format!("{node:?}"),
    source,
  })?;
  let Some(hidden_kind) = kind else {
    return Ok(None);
  };

  Ok(Some(HiddenElementRecord {
    id: format!("element_{index}_{timestamp_ms}"),
    tag_name: dom.tag_name(node),
    class_name: dom.attribute(node, "class").unwrap_or_default(),
    text_preview: text_preview(dom, node),
    selector: generate_unique_selector(dom, node),
    xpath: get_xpath(dom, node),
    hidden_kind,
    hidden_reason: hidden_kind.reason().to_string(),
    attributes: relevant_attributes(dom, node),
    position: dom.bounding_rect(node),
  }))
}

fn unix_millis() -> u128 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::dom::{ComputedStyle, MemoryDocument, NodeId, ScrollOptions, StyleProperty};
  use crate::types::{DomError, Position};

  #[test]
  fn scenario_display_none_div() {
    let doc = MemoryDocument::parse_fragment(r#"<div id="a" style="display:none">Hi</div>"#);
    let records = scan(&doc);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.selector, "#a");
    assert_eq!(record.hidden_kind, HiddenKind::Display);
    assert_eq!(record.hidden_reason, "display: none");
    assert_eq!(record.text_preview, "Hi");
    assert_eq!(record.tag_name, "div");
    assert_eq!(record.attributes.get("id").map(String::as_str), Some("a"));
  }

  #[test]
  fn visible_elements_are_excluded() {
    let doc = MemoryDocument::parse_fragment(
      "<div style='opacity:0.01'>a</div><p style='visibility:visible'>b</p><span>c</span>",
    );
    assert!(scan(&doc).is_empty());
  }

  #[test]
  fn ids_carry_index_and_timestamp() {
    let doc = MemoryDocument::parse_fragment("<p>x</p><p hidden>y</p>");
    let records = scan_at(&doc, 1234);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "element_2_1234");
  }

  #[test]
  fn position_comes_from_layout() {
    let mut doc = MemoryDocument::parse_fragment("<p hidden>y</p>");
    let p = doc.elements()[1];
    doc.set_bounding_rect(p, Position::new(10.0, 20.0, 30.0, 40.0));
    assert_eq!(scan(&doc)[0].position, Position::new(10.0, 20.0, 30.0, 40.0));
  }

  #[test]
  fn style_sheets_and_inheritance_are_honoured() {
    let doc = MemoryDocument::parse_html(
      "<html><head><style>.gone { display: none } .ghost { opacity: 0 }</style></head>\
       <body><div class='gone'>a</div><i class='ghost'>b</i>\
       <section style='visibility:hidden'><b>c</b></section></body></html>",
    );
    let kinds: Vec<(String, HiddenKind)> = scan(&doc)
      .into_iter()
      .filter(|r| !matches!(r.tag_name.as_str(), "head" | "style"))
      .map(|r| (r.tag_name, r.hidden_kind))
      .collect();
    assert_eq!(
      kinds,
      vec![
        ("div".to_string(), HiddenKind::Display),
        ("i".to_string(), HiddenKind::Opacity),
        ("section".to_string(), HiddenKind::Visibility),
        ("b".to_string(), HiddenKind::Visibility),
      ]
    );
  }

  /// Delegates to a [`MemoryDocument`] but fails style resolution for one node.
  struct FlakyDom {
    inner: MemoryDocument,
    broken: NodeId,
  }

  impl Dom for FlakyDom {
    type Node = NodeId;

    fn elements(&self) -> Vec<NodeId> {
      self.inner.elements()
    }
    fn document_element(&self) -> Option<NodeId> {
      self.inner.document_element()
    }
    fn tag_name(&self, node: &NodeId) -> String {
      self.inner.tag_name(node)
    }
    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
      self.inner.parent_element(node)
    }
    fn children(&self, node: &NodeId) -> Vec<NodeId> {
      self.inner.children(node)
    }
    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
      self.inner.attributes(node)
    }
    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> DomResult<()> {
      self.inner.set_attribute(node, name, value)
    }
    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> DomResult<()> {
      self.inner.remove_attribute(node, name)
    }
    fn text_content(&self, node: &NodeId) -> String {
      self.inner.text_content(node)
    }
    fn computed_style(&self, node: &NodeId) -> DomResult<ComputedStyle> {
      if *node == self.broken {
        return Err(DomError::StyleUnavailable {
          node: node.to_string(),
          reason: "detached frame".into(),
        });
      }
      self.inner.computed_style(node)
    }
    fn inline_style(&self, node: &NodeId, property: StyleProperty) -> String {
      self.inner.inline_style(node, property)
    }
    fn set_inline_style(&mut self, node: &NodeId, property: StyleProperty, value: &str) -> DomResult<()> {
      self.inner.set_inline_style(node, property, value)
    }
    fn bounding_rect(&self, node: &NodeId) -> Position {
      self.inner.bounding_rect(node)
    }
    fn scroll_into_view(&mut self, node: &NodeId, options: ScrollOptions) -> DomResult<()> {
      self.inner.scroll_into_view(node, options)
    }
    fn is_connected(&self, node: &NodeId) -> bool {
      self.inner.is_connected(node)
    }
    fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeId>> {
      self.inner.query_selector_all(selector)
    }
  }

  #[test]
  fn failing_element_is_skipped() {
    let inner = MemoryDocument::parse_fragment(
      "<p id='one' style='display:none'></p><p id='two' style='display:none'></p>\
       <p id='three' style='opacity:0'></p>",
    );
    let broken = inner.element_by_id("two").unwrap();
    let dom = FlakyDom { inner, broken };

    let selectors: Vec<String> = scan(&dom).into_iter().map(|r| r.selector).collect();
    assert_eq!(selectors, vec!["#one", "#three"]);
  }

  #[test]
  fn describe_reports_the_failing_node() {
    let inner = MemoryDocument::parse_fragment("<p id='x'></p>");
    let broken = inner.element_by_id("x").unwrap();
    let dom = FlakyDom { inner, broken };
    let err = describe(&dom, &broken, 0, 0).unwrap_err();
    assert!(matches!(err, UnveilError::ElementScanFailed { .. }));
  }

  proptest! {
    #[test]
    fn classification_follows_priority(
      hidden in any::<bool>(),
      display_none in any::<bool>(),
      visibility_hidden in any::<bool>(),
      transparent in any::<bool>(),
    ) {
      let mut style = String::new();
      if display_none { style.push_str("display: none; "); }
      if visibility_hidden { style.push_str("visibility: hidden; "); }
      if transparent { style.push_str("opacity: 0; "); }
      let attr = if hidden { " hidden" } else { "" };
      let doc = MemoryDocument::parse_fragment(
        &format!(r#"<div id="t" style="{style}"{attr}>x</div>"#),
      );

      let expected = [
        (hidden, HiddenKind::Attribute),
        (display_none, HiddenKind::Display),
        (visibility_hidden, HiddenKind::Visibility),
        (transparent, HiddenKind::Opacity),
      ]
      .into_iter()
      .find_map(|(on, kind)| on.then_some(kind));

      let records: Vec<HiddenElementRecord> =
        scan(&doc).into_iter().filter(|r| r.selector == "#t").collect();
      match expected {
        Some(kind) => {
          prop_assert_eq!(records.len(), 1);
          prop_assert_eq!(records[0].hidden_kind, kind);
        }
        None => prop_assert!(records.is_empty()),
      }
    }
  }
}
