/*!
Serializable identity for live elements.

A DOM node cannot cross the message boundary, so each record carries a short
CSS selector and a positional XPath that are re-resolved on every action.
*/

use std::collections::BTreeMap;

use crate::dom::Dom;

/// Ancestor segments kept by [`get_xpath`].
pub const XPATH_MAX_DEPTH: usize = 10;

/// Previews longer than this are truncated.
pub const PREVIEW_MAX_CHARS: usize = 50;

const PREVIEW_KEEP_CHARS: usize = PREVIEW_MAX_CHARS - 3;

/// Attributes copied verbatim into a record.
const RELEVANT_ATTRIBUTES: &[&str] = &["id", "class", "role", "type", "name"];

/// Attribute prefixes copied into a record.
const RELEVANT_PREFIXES: &[&str] = &["data-", "aria-"];

fn class_name<D: Dom>(dom: &D, node: &D::Node) -> String {
  dom.attribute(node, "class").unwrap_or_default()
}

fn element_id<D: Dom>(dom: &D, node: &D::Node) -> Option<String> {
  dom.attribute(node, "id").filter(|id| !id.is_empty())
}

/// Best-effort CSS locator: `#id`, else `tag.class1.class2` with an
/// `:nth-child(k)` suffix when the parent holds several elements with the same
/// tag and class string. Not guaranteed unique.
pub fn generate_unique_selector<D: Dom>(dom: &D, node: &D::Node) -> String {
  if let Some(id) = element_id(dom, node) {
    return format!("#{id}");
  }

  let tag = dom.tag_name(node);
  let class = class_name(dom, node);
  let mut selector = tag.clone();
  for token in class.split_whitespace().take(2) {
    selector.push('.');
    selector.push_str(token);
  }

  if let Some(parent) = dom.parent_element(node) {
    let twins: Vec<D::Node> = dom
      .children(&parent)
      .into_iter()
      .filter(|c| dom.tag_name(c) == tag && class_name(dom, c) == class)
      .collect();
    if twins.len() > 1 {
      if let Some(index) = twins.iter().position(|c| c == node) {
        selector.push_str(&format!(":nth-child({})", index + 1));
      }
    }
  }

  selector
}

/// Positional XPath. Elements with an id get `//*[@id="…"]`; others get a
/// chain of `tag[index]` segments (index only when the tag repeats among
/// siblings). Chains cut at [`XPATH_MAX_DEPTH`] are descendant-anchored.
pub fn get_xpath<D: Dom>(dom: &D, node: &D::Node) -> String {
  if let Some(id) = element_id(dom, node) {
    return if id.contains('"') {
      format!("//*[@id='{id}']")
    } else {
      format!("//*[@id=\"{id}\"]")
    };
  }

  let mut segments = Vec::new();
  let mut current = Some(node.clone());
  let mut truncated = false;

  while let Some(element) = current {
    if segments.len() == XPATH_MAX_DEPTH {
      truncated = true;
      break;
    }
    let tag = dom.tag_name(&element);
    let parent = dom.parent_element(&element);
    let mut segment = tag.clone();
    if let Some(parent) = &parent {
      let same_tag: Vec<D::Node> = dom
        .children(parent)
        .into_iter()
        .filter(|c| dom.tag_name(c) == tag)
        .collect();
      if same_tag.len() > 1 {
        if let Some(index) = same_tag.iter().position(|c| *c == element) {
          segment.push_str(&format!("[{}]", index + 1));
        }
      }
    }
    segments.push(segment);
    current = parent;
  }

  segments.reverse();
  let anchor = if truncated { "//" } else { "/" };
  format!("{anchor}{}", segments.join("/"))
}

/// Human-readable label: the first non-empty of text content, rendered text,
/// `value`, `placeholder`, `alt`, `title`; trimmed and truncated to
/// [`PREVIEW_MAX_CHARS`]. Falls back to `<tag>`.
pub fn text_preview<D: Dom>(dom: &D, node: &D::Node) -> String {
  let attr = |name: &str| dom.attribute(node, name).filter(|v| !v.is_empty());

  let source = Some(dom.text_content(node))
    .filter(|t| !t.is_empty())
    .or_else(|| dom.rendered_text(node).filter(|t| !t.is_empty()))
    .or_else(|| {
      attr("value").map(|v| {
        let kind = attr("type").unwrap_or_else(|| "input".to_string());
        format!("[{kind}] {v}")
      })
    })
    .or_else(|| attr("placeholder").map(|v| format!("[placeholder] {v}")))
    .or_else(|| attr("alt").map(|v| format!("[alt] {v}")))
    .or_else(|| attr("title").map(|v| format!("[title] {v}")));

  let text = source.as_deref().map(str::trim).unwrap_or_default();
  if text.is_empty() {
    return format!("<{}>", dom.tag_name(node));
  }
  if text.chars().count() > PREVIEW_MAX_CHARS {
    let kept: String = text.chars().take(PREVIEW_KEEP_CHARS).collect();
    return format!("{kept}...");
  }
  text.to_string()
}

/// Allowlisted attributes present on the element.
pub fn relevant_attributes<D: Dom>(dom: &D, node: &D::Node) -> BTreeMap<String, String> {
  dom
    .attributes(node)
    .into_iter()
    .filter(|(name, _)| {
      RELEVANT_ATTRIBUTES.contains(&name.as_str())
        || RELEVANT_PREFIXES.iter().any(|p| name.starts_with(p))
    })
    .collect()
}
