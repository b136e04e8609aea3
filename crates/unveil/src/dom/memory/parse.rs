/*! HTML import via `scraper`. */

use scraper::{ElementRef, Html};

use super::{MemoryDocument, NodeId};

impl MemoryDocument {
  /// Parse a full HTML document. The parser synthesizes `html`, `head` and `body`.
  pub fn parse_html(html: &str) -> Self {
    Self::from_scraper(&Html::parse_document(html))
  }

  /// Parse an HTML fragment. The result has a lone `html` root holding the
  /// fragment's nodes, with no synthesized `head`.
  pub fn parse_fragment(html: &str) -> Self {
    Self::from_scraper(&Html::parse_fragment(html))
  }

  fn from_scraper(html: &Html) -> Self {
    let mut doc = Self::new();
    let mut pending = vec![(Self::DOCUMENT, Pending::Element(html.root_element()))];
    while let Some((parent, item)) = pending.pop() {
      match item {
        Pending::Text(text) => {
          doc.append_text(parent, text);
        }
        Pending::Element(element) => {
          let id = doc.import_element(parent, element);
          // Reversed so siblings pop in document order.
          let children: Vec<_> = element
            .children()
            .filter_map(|child| match ElementRef::wrap(child) {
              Some(element) => Some(Pending::Element(element)),
              None => child.value().as_text().map(|text| Pending::Text(text)),
            })
            .collect();
          pending.extend(children.into_iter().rev().map(|item| (id, item)));
        }
      }
    }
    doc
  }

  fn import_element(&mut self, parent: NodeId, element: ElementRef<'_>) -> NodeId {
    let value = element.value();
    let attributes = value
      .attrs()
      .map(|(n, v)| (n.to_ascii_lowercase(), v.to_string()))
      .collect();
    self.push_element(parent, value.name(), attributes)
  }
}

enum Pending<'a> {
  Element(ElementRef<'a>),
  Text(&'a str),
}
