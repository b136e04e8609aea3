/*!
XPath engine over any [`Dom`].

Handles the location paths produced by the scanner plus the common hand-written
forms: `/` and `//` steps, name tests and `*`, positional predicates `[n]`
and attribute predicates `[@name]` / `[@name="value"]`. Evaluation follows
XPath 1.0: positional predicates count per parent, results come back in
document order.
*/

use std::collections::HashMap;

use super::Dom;
use crate::types::{DomError, DomResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
  Position(usize),
  HasAttr(String),
  AttrEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
  /// True for steps introduced by `//`.
  descendant: bool,
  /// `None` matches any element.
  name: Option<String>,
  predicates: Vec<Predicate>,
}

/// A parsed location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPath {
  steps: Vec<Step>,
}

/// Context node during evaluation: the document itself or an element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Context<N> {
  Document,
  Element(N),
}

impl LocationPath {
  /// Parse an expression. Unsupported syntax is an `InvalidXPath` error.
  pub fn parse(input: &str) -> DomResult<Self> {
    PathParser::new(input).parse()
  }

  /// All selected elements in document order.
  pub fn evaluate<D: Dom>(&self, dom: &D) -> Vec<D::Node> {
    let order: HashMap<D::Node, usize> = dom
      .elements()
      .into_iter()
      .enumerate()
      .map(|(i, n)| (n, i))
      .collect();

    let mut contexts: Vec<Context<D::Node>> = vec![Context::Document];
    for step in &self.steps {
      let parents = if step.descendant {
        expand_descendants(dom, &contexts, &order)
      } else {
        contexts
      };

      let mut selected: Vec<D::Node> = Vec::new();
      for parent in &parents {
        let candidates: Vec<D::Node> = child_elements(dom, parent)
          .into_iter()
          .filter(|child| step.name_matches(dom, child))
          .collect();
        selected.extend(step.apply_predicates(dom, candidates));
      }
      sort_dedup(&mut selected, &order);
      contexts = selected.into_iter().map(Context::Element).collect();
    }

    contexts
      .into_iter()
      .filter_map(|c| match c {
        Context::Element(n) => Some(n),
        Context::Document => None,
      })
      .collect()
  }
}

impl Step {
  fn name_matches<D: Dom>(&self, dom: &D, node: &D::Node) -> bool {
    self
      .name
      .as_ref()
      .is_none_or(|name| dom.tag_name(node).eq_ignore_ascii_case(name))
  }

  fn apply_predicates<D: Dom>(&self, dom: &D, mut nodes: Vec<D::Node>) -> Vec<D::Node> {
    for predicate in &self.predicates {
      nodes = match predicate {
        Predicate::Position(n) => n
          .checked_sub(1)
          .and_then(|i| nodes.get(i).cloned())
          .into_iter()
          .collect(),
        Predicate::HasAttr(name) => nodes
          .into_iter()
          .filter(|node| dom.has_attribute(node, name))
          .collect(),
        Predicate::AttrEquals(name, value) => nodes
          .into_iter()
          .filter(|node| dom.attribute(node, name).as_deref() == Some(value.as_str()))
          .collect(),
      };
    }
    nodes
  }
}

fn child_elements<D: Dom>(dom: &D, context: &Context<D::Node>) -> Vec<D::Node> {
  match context {
    Context::Document => dom.document_element().into_iter().collect(),
    Context::Element(node) => dom.children(node),
  }
}

/// `descendant-or-self` expansion of every context.
fn expand_descendants<D: Dom>(
  dom: &D,
  contexts: &[Context<D::Node>],
  order: &HashMap<D::Node, usize>,
) -> Vec<Context<D::Node>> {
  let mut with_document = false;
  let mut nodes: Vec<D::Node> = Vec::new();
  for context in contexts {
    let mut stack = match context {
      Context::Document => {
        with_document = true;
        dom.document_element().into_iter().collect::<Vec<_>>()
      }
      Context::Element(node) => vec![node.clone()],
    };
    while let Some(node) = stack.pop() {
      stack.extend(dom.children(&node));
      nodes.push(node);
    }
  }
  sort_dedup(&mut nodes, order);
  let mut expanded: Vec<Context<D::Node>> = Vec::with_capacity(nodes.len() + 1);
  if with_document {
    expanded.push(Context::Document);
  }
  expanded.extend(nodes.into_iter().map(Context::Element));
  expanded
}

fn sort_dedup<N: Clone + Eq + std::hash::Hash>(nodes: &mut Vec<N>, order: &HashMap<N, usize>) {
  nodes.sort_by_key(|n| order.get(n).copied().unwrap_or(usize::MAX));
  nodes.dedup();
}

/// Evaluate `xpath` and return the first selected element in document order.
pub fn evaluate_first<D: Dom>(dom: &D, xpath: &str) -> DomResult<Option<D::Node>> {
  let path = LocationPath::parse(xpath)?;
  Ok(path.evaluate(dom).into_iter().next())
}

struct PathParser<'a> {
  input: &'a str,
  chars: Vec<char>,
  pos: usize,
}

impl<'a> PathParser<'a> {
  fn new(input: &'a str) -> Self {
    Self {
      input,
      chars: input.trim().chars().collect(),
      pos: 0,
    }
  }

  fn error(&self, reason: impl Into<String>) -> DomError {
    DomError::InvalidXPath {
      xpath: self.input.to_string(),
      reason: reason.into(),
    }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.pos += 1;
    }
  }

  fn parse(mut self) -> DomResult<LocationPath> {
    if self.chars.is_empty() {
      return Err(self.error("empty expression"));
    }
    let mut steps = Vec::new();
    let mut first = true;
    loop {
      let descendant = match (self.peek(), self.peek_at(1)) {
        (Some('/'), Some('/')) => {
          self.pos += 2;
          true
        }
        (Some('/'), _) => {
          self.pos += 1;
          false
        }
        (None, _) if !first => break,
        // relative path: evaluated from the document
        (Some(_), _) if first => false,
        (Some(c), _) => return Err(self.error(format!("unexpected '{c}'"))),
        (None, _) => return Err(self.error("expected a step")),
      };
      first = false;
      steps.push(self.parse_step(descendant)?);
    }
    Ok(LocationPath { steps })
  }

  fn parse_step(&mut self, descendant: bool) -> DomResult<Step> {
    let name = match self.peek() {
      Some('*') => {
        self.pos += 1;
        None
      }
      Some(c) if is_name_start(c) => Some(self.parse_name()?.to_ascii_lowercase()),
      Some(c) => return Err(self.error(format!("unsupported step starting with '{c}'"))),
      None => return Err(self.error("expected a step")),
    };

    let mut predicates = Vec::new();
    while self.peek() == Some('[') {
      self.pos += 1;
      self.skip_ws();
      predicates.push(self.parse_predicate()?);
      self.skip_ws();
      if self.peek() != Some(']') {
        return Err(self.error("unterminated predicate"));
      }
      self.pos += 1;
    }
    Ok(Step {
      descendant,
      name,
      predicates,
    })
  }

  fn parse_predicate(&mut self) -> DomResult<Predicate> {
    match self.peek() {
      Some('@') => {
        self.pos += 1;
        let name = self.parse_name()?.to_ascii_lowercase();
        self.skip_ws();
        if self.peek() != Some('=') {
          return Ok(Predicate::HasAttr(name));
        }
        self.pos += 1;
        self.skip_ws();
        let value = self.parse_literal()?;
        Ok(Predicate::AttrEquals(name, value))
      }
      Some(c) if c.is_ascii_digit() => {
        let mut digits = String::new();
        while let Some(d) = self.peek().filter(char::is_ascii_digit) {
          digits.push(d);
          self.pos += 1;
        }
        digits
          .parse::<usize>()
          .map(Predicate::Position)
          .map_err(|e| self.error(e.to_string()))
      }
      _ => Err(self.error("unsupported predicate")),
    }
  }

  fn parse_literal(&mut self) -> DomResult<String> {
    let Some(quote @ ('"' | '\'')) = self.peek() else {
      return Err(self.error("expected a string literal"));
    };
    self.pos += 1;
    let mut value = String::new();
    loop {
      match self.peek() {
        Some(c) if c == quote => {
          self.pos += 1;
          return Ok(value);
        }
        Some(c) => {
          value.push(c);
          self.pos += 1;
        }
        None => return Err(self.error("unterminated string literal")),
      }
    }
  }

  fn parse_name(&mut self) -> DomResult<String> {
    let mut name = String::new();
    while let Some(c) = self.peek() {
      if is_name_char(c) {
        name.push(c);
        self.pos += 1;
      } else {
        break;
      }
    }
    if name.is_empty() {
      return Err(self.error("expected a name"));
    }
    Ok(name)
  }
}

fn is_name_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') || !c.is_ascii()
}
