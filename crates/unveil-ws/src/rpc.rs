/*!
Frame handling: JSON text in, JSON text out.

A frame is a protocol request with an optional `id`; the answer echoes it.
*/

use serde_json::{json, Value as JsonValue};
use unveil::protocol::dispatch_json;
use unveil::{Dom, PageAgent};

/// Dispatch one decoded frame, echoing its `id` on the answer.
pub fn dispatch_frame<D: Dom>(agent: &PageAgent<D>, frame: &JsonValue) -> JsonValue {
  let id = frame.get("id").cloned();
  let mut request = frame.clone();
  if let Some(obj) = request.as_object_mut() {
    obj.remove("id");
  }

  let mut response = dispatch_json(agent, &request);
  if let (Some(id), Some(obj)) = (id, response.as_object_mut()) {
    obj.insert("id".to_string(), id);
  }
  response
}

/// Handle one text frame.
pub fn handle_text<D: Dom>(agent: &PageAgent<D>, text: &str) -> String {
  match serde_json::from_str::<JsonValue>(text) {
    Ok(frame) => dispatch_frame(agent, &frame).to_string(),
    Err(e) => {
      log::warn!("[ws] Invalid JSON frame: {e}");
      json!({ "success": false, "error": format!("Invalid JSON: {e}") }).to_string()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use unveil::{MemoryDocument, Page};

  fn agent() -> PageAgent<MemoryDocument> {
    Page::new(MemoryDocument::parse_fragment(
      r#"<div id="a" style="display:none">Hi</div>"#,
    ))
    .inject()
  }

  #[test]
  fn id_is_echoed() {
    let agent = agent();
    let reply = dispatch_frame(&agent, &json!({ "id": 7, "type": "FIND_HIDDEN_ELEMENTS" }));
    assert_eq!(reply["id"], 7);
    assert_eq!(reply["success"], true);
    assert_eq!(reply["elements"][0]["selector"], "#a");
  }

  #[test]
  fn frames_without_id_get_none() {
    let agent = agent();
    let reply = dispatch_frame(&agent, &json!({ "type": "FIND_HIDDEN_ELEMENTS" }));
    assert!(reply.get("id").is_none());
  }

  #[test]
  fn action_round_trip_as_text() {
    let agent = agent();
    let scan: JsonValue =
      serde_json::from_str(&handle_text(&agent, r#"{"id":"s","type":"FIND_HIDDEN_ELEMENTS"}"#))
        .unwrap();
    let record = scan["elements"][0].clone();

    let show = json!({ "id": "1", "type": "ELEMENT_ACTION", "action": "show", "elementData": record });
    let reply: JsonValue = serde_json::from_str(&handle_text(&agent, &show.to_string())).unwrap();
    assert_eq!(reply, json!({ "id": "1", "success": true }));
  }

  #[test]
  fn garbage_is_answered() {
    let agent = agent();
    let reply: JsonValue = serde_json::from_str(&handle_text(&agent, "{not json")).unwrap();
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid JSON"));
  }
}
