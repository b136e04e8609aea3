/*!
Re-resolve a record against the live document.

The selector is tried first and accepted only when it matches exactly one
element. Otherwise the XPath's first match in document order is used.
*/

use crate::dom::Dom;
use crate::types::{HiddenElementRecord, UnveilError, UnveilResult};

/// Resolve `record` to a live element, if either locator still finds one.
pub fn find_element_by_data<D: Dom>(dom: &D, record: &HiddenElementRecord) -> Option<D::Node> {
  let matches = match dom.query_selector_all(&record.selector) {
    Ok(matches) => matches,
    Err(e) => {
      log::debug!("selector fallback to xpath: {e}");
      Vec::new()
    }
  };
  if let [only] = matches.as_slice() {
    return Some(only.clone());
  }

  if record.xpath.is_empty() {
    return None;
  }
  match dom.evaluate_xpath(&record.xpath) {
    Ok(found) => found,
    Err(e) => {
      log::debug!("xpath lookup failed: {e}");
      None
    }
  }
}

/// Like [`find_element_by_data`], with a typed failure.
pub(crate) fn locate<D: Dom>(dom: &D, record: &HiddenElementRecord) -> UnveilResult<D::Node> {
  find_element_by_data(dom, record).ok_or_else(|| UnveilError::ElementNotFound {
    selector: record.selector.clone(),
    xpath: record.xpath.clone(),
  })
}
