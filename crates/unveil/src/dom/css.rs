/*!
CSS parsing shared by the style cascade, inline styles and selector queries.

Tokenizing is done by `cssparser`; selectors are parsed into `selectors`
lists with `scraper`'s selector implementation so they can be matched
against any element that implements [`selectors::Element`].
*/

use cssparser::{
  parse_important, AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput,
  ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};
use scraper::selector::Simple;
use selectors::parser::{ParseRelative, SelectorParseErrorKind};

use crate::types::{DomError, DomResult};

/// A parsed, comma-separated selector list.
pub(crate) type SelectorList = selectors::SelectorList<Simple>;

/// Parse a selector list the way `querySelectorAll` would.
pub(crate) fn parse_selector_list(selector: &str) -> DomResult<SelectorList> {
  let mut input = ParserInput::new(selector);
  let mut parser = Parser::new(&mut input);
  SelectorList::parse(&scraper::selector::Parser, &mut parser, ParseRelative::No).map_err(|e| {
    DomError::InvalidSelector {
      selector: selector.to_string(),
      reason: format!("{:?}", e.kind),
    }
  })
}

/// One `name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
  pub(crate) name: String,
  pub(crate) value: String,
  pub(crate) important: bool,
}

/// One style rule of a stylesheet.
#[derive(Debug, Clone)]
pub(crate) struct StyleRule {
  pub(crate) selectors: SelectorList,
  pub(crate) declarations: Vec<Declaration>,
}

struct DeclarationListParser;

impl<'i> DeclarationParser<'i> for DeclarationListParser {
  type Declaration = Declaration;
  type Error = ();

  fn parse_value<'t>(
    &mut self,
    name: CowRcStr<'i>,
    input: &mut Parser<'i, 't>,
  ) -> Result<Declaration, ParseError<'i, ()>> {
    let start = input.position();
    let mut end = start;
    let mut important = false;
    loop {
      if input.try_parse(parse_important).is_ok() {
        important = true;
        break;
      }
      if input.next().is_err() {
        break;
      }
      end = input.position();
    }
    input.expect_exhausted()?;

    let value = input.slice(start..end).trim();
    if value.is_empty() {
      return Err(input.new_custom_error(()));
    }
    Ok(Declaration {
      name: name.to_ascii_lowercase(),
      value: value.to_string(),
      important,
    })
  }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
  type Prelude = ();
  type AtRule = Declaration;
  type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
  type Prelude = ();
  type QualifiedRule = Declaration;
  type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationListParser {
  fn parse_declarations(&self) -> bool {
    true
  }

  fn parse_qualified(&self) -> bool {
    false
  }
}

fn declarations_in(input: &mut Parser<'_, '_>) -> Vec<Declaration> {
  let mut parser = DeclarationListParser;
  let body: RuleBodyParser<'_, '_, '_, _, Declaration, ()> = RuleBodyParser::new(input, &mut parser);
  body.filter_map(Result::ok).collect()
}

/// Parse a declaration block (`a: b; c: d !important`). Invalid entries are dropped.
pub(crate) fn parse_declarations(block: &str) -> Vec<Declaration> {
  let mut input = ParserInput::new(block);
  let mut parser = Parser::new(&mut input);
  declarations_in(&mut parser)
}

/// Serialize declarations back into a `style` attribute value.
pub(crate) fn serialize_declarations(decls: &[Declaration]) -> String {
  decls
    .iter()
    .map(|d| {
      if d.important {
        format!("{}: {} !important;", d.name, d.value)
      } else {
        format!("{}: {};", d.name, d.value)
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Whether a media query list applies to a screen.
///
/// Only the media type is evaluated; feature conditions such as
/// `(max-width: 600px)` are assumed to hold.
pub(crate) fn media_applies(prelude: &str) -> bool {
  let prelude = prelude.trim();
  if prelude.is_empty() {
    return true;
  }
  prelude.split(',').any(|query| {
    let query = query.trim().to_ascii_lowercase();
    let mut words = query.split_whitespace().peekable();
    let negated = match words.peek() {
      Some(&"not") => {
        words.next();
        true
      }
      Some(&"only") => {
        words.next();
        false
      }
      Some(_) | None => false,
    };
    let screen = match words.next() {
      Some("screen" | "all") => true,
      Some(word) => word.starts_with('('),
      None => false,
    };
    screen != negated
  })
}

/// Rules of a stylesheet (or of a conditional group body).
struct RuleListParser;

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
  type Prelude = SelectorList;
  type QualifiedRule = Vec<StyleRule>;
  type Error = SelectorParseErrorKind<'i>;

  fn parse_prelude<'t>(
    &mut self,
    input: &mut Parser<'i, 't>,
  ) -> Result<SelectorList, ParseError<'i, Self::Error>> {
    SelectorList::parse(&scraper::selector::Parser, input, ParseRelative::No)
  }

  fn parse_block<'t>(
    &mut self,
    selectors: SelectorList,
    _start: &ParserState,
    input: &mut Parser<'i, 't>,
  ) -> Result<Vec<StyleRule>, ParseError<'i, Self::Error>> {
    Ok(vec![StyleRule {
      selectors,
      declarations: declarations_in(input),
    }])
  }
}

impl<'i> AtRuleParser<'i> for RuleListParser {
  /// Whether the group's rules apply.
  type Prelude = bool;
  type AtRule = Vec<StyleRule>;
  type Error = SelectorParseErrorKind<'i>;

  fn parse_prelude<'t>(
    &mut self,
    name: CowRcStr<'i>,
    input: &mut Parser<'i, 't>,
  ) -> Result<bool, ParseError<'i, Self::Error>> {
    let start = input.position();
    while input.next().is_ok() {}
    let prelude = input.slice_from(start);

    if name.eq_ignore_ascii_case("media") {
      Ok(media_applies(prelude))
    } else if name.eq_ignore_ascii_case("supports") || name.eq_ignore_ascii_case("layer") {
      Ok(true)
    } else {
      Err(input.new_error(cssparser::BasicParseErrorKind::AtRuleInvalid(name)))
    }
  }

  fn rule_without_block(&mut self, _applies: bool, _start: &ParserState) -> Result<Vec<StyleRule>, ()> {
    Ok(Vec::new())
  }

  fn parse_block<'t>(
    &mut self,
    applies: bool,
    _start: &ParserState,
    input: &mut Parser<'i, 't>,
  ) -> Result<Vec<StyleRule>, ParseError<'i, Self::Error>> {
    if !applies {
      while input.next().is_ok() {}
      return Ok(Vec::new());
    }
    Ok(rules_in(input))
  }
}

fn rules_in(input: &mut Parser<'_, '_>) -> Vec<StyleRule> {
  let mut rules = Vec::new();
  for item in StyleSheetParser::new(input, &mut RuleListParser) {
    match item {
      Ok(mut group) => rules.append(&mut group),
      Err((e, source)) => log::debug!("[style] skipping `{}`: {:?}", source.trim(), e.kind),
    }
  }
  rules
}

/// Parse a stylesheet into style rules in source order. Conditional groups
/// that apply are flattened in place; unknown at-rules and rules with invalid
/// selectors are skipped.
pub(crate) fn parse_stylesheet(css: &str) -> Vec<StyleRule> {
  let mut input = ParserInput::new(css);
  let mut parser = Parser::new(&mut input);
  rules_in(&mut parser)
}

/// Leading-number parse: skips leading whitespace and reads the longest
/// numeric prefix, ignoring anything after it (`"0.5px"` → 0.5, `"abc"` → None).
pub(crate) fn parse_float(input: &str) -> Option<f64> {
  let s = input.trim_start();
  let bytes = s.as_bytes();
  let mut end = 0;
  if matches!(bytes.first(), Some(b'+' | b'-')) {
    end += 1;
  }
  let int_start = end;
  while bytes.get(end).is_some_and(u8::is_ascii_digit) {
    end += 1;
  }
  let mut digits = end - int_start;
  if bytes.get(end) == Some(&b'.') {
    let frac_start = end + 1;
    let mut frac_end = frac_start;
    while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
      frac_end += 1;
    }
    if frac_end > frac_start || digits > 0 {
      digits += frac_end - frac_start;
      end = frac_end;
    }
  }
  if digits == 0 {
    let rest = s.get(int_start..).unwrap_or_default();
    if rest.starts_with("Infinity") {
      let negative = bytes.first() == Some(&b'-');
      return Some(if negative { f64::NEG_INFINITY } else { f64::INFINITY });
    }
    return None;
  }
  if matches!(bytes.get(end), Some(b'e' | b'E')) {
    let mut exp_end = end + 1;
    if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
      exp_end += 1;
    }
    let exp_digits_start = exp_end;
    while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
      exp_end += 1;
    }
    if exp_end > exp_digits_start {
      end = exp_end;
    }
  }
  s.get(..end).and_then(|n| n.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  mod declarations {
    use super::*;

    #[test]
    fn parses_pairs_and_lowercases_names() {
      let decls = parse_declarations("Display: none; opacity:0 ;");
      assert_eq!(decls.len(), 2);
      assert_eq!(decls[0].name, "display");
      assert_eq!(decls[0].value, "none");
      assert_eq!(decls[1].name, "opacity");
      assert_eq!(decls[1].value, "0");
    }

    #[test]
    fn detects_important() {
      let decls = parse_declarations("display: none !important");
      assert_eq!(decls.len(), 1);
      assert!(decls[0].important);
      assert_eq!(decls[0].value, "none");
    }

    #[test]
    fn drops_malformed_entries() {
      assert!(parse_declarations("garbage; : x; color:").is_empty());
    }

    #[test]
    fn semicolons_inside_strings_stay_in_the_value() {
      let decls = parse_declarations(r#"content: "a;b"; display: none"#);
      assert_eq!(decls.len(), 2);
      assert_eq!(decls[0].value, r#""a;b""#);
      assert_eq!(decls[1].name, "display");
    }

    #[test]
    fn serialize_keeps_order_and_importance() {
      let decls = parse_declarations("display: block; outline: 1.5px dashed brown !important");
      assert_eq!(
        serialize_declarations(&decls),
        "display: block; outline: 1.5px dashed brown !important;"
      );
    }
  }

  mod stylesheets {
    use super::*;

    #[test]
    fn comments_and_unknown_at_rules_are_skipped() {
      let rules = parse_stylesheet(
        "@import url(x.css);
         /* .a { display: none } */
         .hide { display: none }
         @font-face { font-family: x }
         #b, .c { visibility: hidden; opacity: 0 }",
      );
      assert_eq!(rules.len(), 2);
      assert_eq!(rules[1].declarations.len(), 2);
      assert_eq!(rules[1].selectors.0.len(), 2);
    }

    #[test]
    fn screen_media_blocks_are_flattened_in_order() {
      let rules = parse_stylesheet(
        ".a { opacity: 0 }
         @media screen and (min-width: 10px) { .b { display: none } .c { display: none } }
         @media print { .d { display: none } }
         .e { opacity: 0 }",
      );
      let names: Vec<String> = rules
        .iter()
        .flat_map(|r| r.declarations.iter().map(|d| d.name.clone()))
        .collect();
      assert_eq!(names, vec!["opacity", "display", "display", "opacity"]);
    }

    #[test]
    fn nested_groups_and_supports() {
      let rules = parse_stylesheet(
        "@supports (display: grid) { @media all { .a { display: none } } }",
      );
      assert_eq!(rules.len(), 1);
    }

    #[test]
    fn bad_selector_drops_only_its_rule() {
      let rules = parse_stylesheet(".a:::b { display: none } .c { display: none }");
      assert_eq!(rules.len(), 1);
    }

    #[test]
    fn unterminated_rule_still_parses() {
      assert_eq!(parse_stylesheet(".a { display: none").len(), 1);
    }
  }

  #[test]
  fn media_types() {
    assert!(media_applies(""));
    assert!(media_applies("screen"));
    assert!(media_applies("all"));
    assert!(media_applies("only screen and (max-width: 600px)"));
    assert!(media_applies("(prefers-reduced-motion: reduce)"));
    assert!(media_applies("print, screen"));
    assert!(media_applies("not print"));
    assert!(!media_applies("print"));
    assert!(!media_applies("not screen"));
    assert!(!media_applies("speech"));
  }

  #[test]
  fn selector_lists() {
    assert_eq!(parse_selector_list("li + li, .a:not(.b)").unwrap().0.len(), 2);
    assert!(matches!(
      parse_selector_list("div[").unwrap_err(),
      DomError::InvalidSelector { .. }
    ));
  }

  mod floats {
    use super::*;

    #[test]
    fn leading_number_semantics() {
      assert_eq!(parse_float("0"), Some(0.0));
      assert_eq!(parse_float("  0.0"), Some(0.0));
      assert_eq!(parse_float("0.5px"), Some(0.5));
      assert_eq!(parse_float(".25"), Some(0.25));
      assert_eq!(parse_float("-1e2"), Some(-100.0));
      assert_eq!(parse_float("1e"), Some(1.0));
      assert_eq!(parse_float("1."), Some(1.0));
    }

    #[test]
    fn non_numbers() {
      assert_eq!(parse_float(""), None);
      assert_eq!(parse_float("abc"), None);
      assert_eq!(parse_float("."), None);
      assert_eq!(parse_float("-"), None);
    }

    #[test]
    fn infinity() {
      assert_eq!(parse_float("Infinity"), Some(f64::INFINITY));
      assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
    }
  }
}
