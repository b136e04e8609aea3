/*!
Style cascade for the in-memory document.

Declarations come from three origins: the user-agent sheet, author `<style>`
elements, and the inline `style` attribute. The winning declaration for a
property is the one with the highest `(important, origin, specificity,
source order)` key.

Styles are resolved for the whole document in one top-down pass, so each
element inherits from an already computed parent.
*/

use std::collections::HashMap;

use super::select::{Matcher, MemoryElement};
use super::{MemoryDocument, NodeId};
use crate::dom::css::{parse_stylesheet, StyleRule};
use crate::dom::{ComputedStyle, Dom};

/// Elements the user agent renders with `display: none`.
pub(super) const USER_AGENT_CSS: &str = "
  [hidden], head, script, style, template, title, meta, link, base, noscript,
  datalist, area, param { display: none }
";

/// Elements whose initial display is `block` (everything else is `inline`).
const BLOCK_TAGS: &[&str] = &[
  "html", "body", "div", "p", "section", "article", "aside", "header", "footer", "nav", "main",
  "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "dl", "dt", "dd", "form", "fieldset",
  "figure", "figcaption", "blockquote", "pre", "address", "details", "summary", "hr", "table",
  "dialog",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
  UserAgent,
  Author,
  Inline,
}

/// Parsed rules of one origin, in source order.
#[derive(Debug, Clone, Default)]
pub(super) struct Stylesheet {
  rules: Vec<StyleRule>,
}

impl Stylesheet {
  pub(super) fn parse(css: &str) -> Self {
    Self {
      rules: parse_stylesheet(css),
    }
  }
}

type CascadeKey = (bool, Origin, u32, usize);

/// Winning declared values for the properties classification reads.
#[derive(Debug, Default)]
struct Declared {
  display: Option<(CascadeKey, String)>,
  visibility: Option<(CascadeKey, String)>,
  opacity: Option<(CascadeKey, String)>,
}

impl Declared {
  fn consider(&mut self, property: &str, key: CascadeKey, value: &str) {
    let slot = match property {
      "display" => &mut self.display,
      "visibility" => &mut self.visibility,
      "opacity" => &mut self.opacity,
      _ => return,
    };
    if slot.as_ref().is_none_or(|(k, _)| key >= *k) {
      *slot = Some((key, value.trim().to_ascii_lowercase()));
    }
  }

  fn take(slot: Option<(CascadeKey, String)>) -> Option<String> {
    slot.map(|(_, value)| value)
  }
}

fn cascade(
  doc: &MemoryDocument,
  element: &MemoryElement<'_>,
  node: NodeId,
  matcher: &mut Matcher,
) -> Declared {
  let mut declared = Declared::default();
  let mut order = 0usize;
  for (origin, sheet) in [
    (Origin::UserAgent, &doc.user_agent_sheet),
    (Origin::Author, doc.author_sheet()),
  ] {
    for rule in &sheet.rules {
      let specificity = matcher.specificity(&rule.selectors, element);
      for decl in &rule.declarations {
        order += 1;
        if let Some(specificity) = specificity {
          declared.consider(&decl.name, (decl.important, origin, specificity, order), &decl.value);
        }
      }
    }
  }

  for decl in doc.inline_declarations(node) {
    order += 1;
    declared.consider(&decl.name, (decl.important, Origin::Inline, 0, order), &decl.value);
  }
  declared
}

fn inherit(
  parent: Option<&ComputedStyle>,
  pick: fn(&ComputedStyle) -> &String,
  initial: &str,
) -> String {
  parent.map_or_else(|| initial.to_string(), |p| pick(p).clone())
}

/// Resolve one element against its parent's computed style.
fn resolve(tag: &str, declared: Declared, parent: Option<&ComputedStyle>) -> ComputedStyle {
  let display = match Declared::take(declared.display).as_deref() {
    Some("inherit") => inherit(parent, |p| &p.display, "inline"),
    Some("initial" | "unset") => "inline".to_string(),
    Some(value) => value.to_string(),
    None => default_display(tag).to_string(),
  };
  let visibility = match Declared::take(declared.visibility).as_deref() {
    None | Some("inherit" | "unset") => inherit(parent, |p| &p.visibility, "visible"),
    Some("initial") => "visible".to_string(),
    Some(value) => value.to_string(),
  };
  let opacity = match Declared::take(declared.opacity).as_deref() {
    Some("inherit") => inherit(parent, |p| &p.opacity, "1"),
    None | Some("initial" | "unset") => "1".to_string(),
    Some(value) => value.to_string(),
  };

  ComputedStyle {
    display,
    visibility,
    opacity,
  }
}

/// Computed styles of every connected element.
pub(super) fn compute_all(doc: &MemoryDocument) -> HashMap<NodeId, ComputedStyle> {
  let mut matcher = Matcher::default();
  let mut styles: HashMap<NodeId, ComputedStyle> = HashMap::new();
  // Pre-order: parents are always resolved before their children.
  for node in doc.elements() {
    let Some(element) = MemoryElement::new(doc, node) else {
      continue;
    };
    let declared = cascade(doc, &element, node, &mut matcher);
    let parent = doc.parent_element(&node).and_then(|p| styles.get(&p));
    let style = resolve(&doc.tag_name(&node), declared, parent);
    styles.insert(node, style);
  }
  styles
}

/// Initial `display` for a tag.
fn default_display(tag: &str) -> &'static str {
  if BLOCK_TAGS.contains(&tag) {
    "block"
  } else {
    "inline"
  }
}
