/*!
Message protocol between a control surface and the page agent.

Requests are tagged by `type`. Every request is answered exactly once with a
[`Response`]; locate and mutate failures come back as `success: false`, while
malformed requests and unexpected DOM failures also carry an `error` string.

```
use unveil::protocol::dispatch_json;
use unveil::{MemoryDocument, Page};

let page = Page::new(MemoryDocument::parse_fragment("<p hidden>x</p>"));
let agent = page.inject();
let reply = dispatch_json(&agent, &serde_json::json!({ "type": "FIND_HIDDEN_ELEMENTS" }));
assert_eq!(reply["success"], true);
assert_eq!(reply["elements"][0]["hiddenKind"], "attribute");
```
*/

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use ts_rs::TS;

use crate::core::PageAgent;
use crate::dom::Dom;
use crate::types::{ElementAction, Event, HiddenElementRecord, UnveilError};

/// Request sent to the page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type")]
#[ts(export)]
pub enum Request {
  /// Scan the document.
  #[serde(rename = "FIND_HIDDEN_ELEMENTS")]
  FindHiddenElements,
  /// Apply an action to one snapshot entry.
  #[serde(rename = "ELEMENT_ACTION")]
  ElementAction {
    /// What to do.
    action: ElementAction,
    /// Record from an earlier scan; re-resolved against the live document.
    #[serde(rename = "elementData")]
    element_data: HiddenElementRecord,
  },
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Response {
  /// Whether the request did what it asked.
  pub success: bool,
  /// Scan results, on scans only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[ts(optional)]
  pub elements: Option<Vec<HiddenElementRecord>>,
  /// Why the request failed, when that is more than "not applicable".
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[ts(optional)]
  pub error: Option<String>,
}

impl Response {
  /// Plain `success: true`.
  pub const fn ok() -> Self {
    Self {
      success: true,
      elements: None,
      error: None,
    }
  }

  /// Plain `success: false`.
  pub const fn failed() -> Self {
    Self {
      success: false,
      elements: None,
      error: None,
    }
  }

  /// Failure carrying a message.
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      success: false,
      elements: None,
      error: Some(message.into()),
    }
  }

  /// Successful scan.
  pub const fn scanned(elements: Vec<HiddenElementRecord>) -> Self {
    Self {
      success: true,
      elements: Some(elements),
      error: None,
    }
  }
}

/// Fire-and-forget push to observers (`SCAN_COMPLETE`).
pub type Notification = Event;

/// Handle one request.
pub fn dispatch<D: Dom>(agent: &PageAgent<D>, request: Request) -> Response {
  match request {
    Request::FindHiddenElements => Response::scanned(agent.find_hidden_elements()),

    Request::ElementAction {
      action,
      element_data,
    } => match agent.try_perform(action, &element_data) {
      Ok(()) => Response::ok(),
      Err(e @ (UnveilError::ElementNotFound { .. } | UnveilError::NoCapturedState { .. })) => {
        log::warn!("[protocol] {action} on {}: {e}", element_data.selector);
        Response::failed()
      }
      Err(e) => {
        log::warn!("[protocol] {action} on {} failed: {e}", element_data.selector);
        Response::error(e.to_string())
      }
    },
  }
}

/// Decode a JSON request, dispatch it and encode the answer.
pub fn dispatch_json<D: Dom>(agent: &PageAgent<D>, request: &JsonValue) -> JsonValue {
  let response = match serde_json::from_value::<Request>(request.clone()) {
    Ok(request) => dispatch(agent, request),
    Err(e) => {
      log::warn!("[protocol] Invalid request: {e}");
      Response::error(format!("Invalid request: {e}"))
    }
  };
  serde_json::to_value(&response)
    .unwrap_or_else(|e| json!({ "success": false, "error": format!("Encoding failed: {e}") }))
}
