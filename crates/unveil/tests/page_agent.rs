//! End-to-end: control surface <-> channel <-> page agent <-> document.

use std::sync::Arc;
use std::time::Duration;

use unveil::client::{Categories, LocalChannel, MemoryStore, RetryPolicy, ScanClient, Settings};
use unveil::dom::StyleProperty;
use unveil::{
  AgentBuilder, Dom, ElementAction, Event, HiddenKind, ManualClock, MemoryDocument, Page,
};

const PAGE: &str = r#"<!doctype html>
<html>
  <head><style>.faded { opacity: 0 } .tucked { display: none }</style></head>
  <body>
    <div class="x">visible twin</div>
    <div class="x" style="visibility: hidden">hidden twin</div>
    <p hidden>Secret paragraph</p>
    <span class="faded">ghost</span>
    <section class="tucked">tucked away</section>
    <input type="search" placeholder="Find" style="opacity: 0">
  </body>
</html>"#;

struct Setup {
  clock: Arc<ManualClock>,
  page: Arc<Page<MemoryDocument>>,
  channel: LocalChannel<MemoryDocument>,
  client: ScanClient<MemoryStore>,
}

fn setup() -> Setup {
  let clock = Arc::new(ManualClock::new());
  let page = Arc::new(Page::with_builder(
    MemoryDocument::parse_html(PAGE),
    AgentBuilder::default().clock(clock.clone()),
  ));
  let channel = LocalChannel::new(Arc::clone(&page));
  let client =
    ScanClient::new(MemoryStore::new()).with_retry(RetryPolicy::default().interval(Duration::ZERO));
  Setup {
    clock,
    page,
    channel,
    client,
  }
}

fn body_records(setup: &Setup) -> Vec<unveil::HiddenElementRecord> {
  setup
    .client
    .scan(&setup.channel, &setup.channel)
    .unwrap()
    .into_iter()
    .filter(|r| !matches!(r.tag_name.as_str(), "head" | "style"))
    .collect()
}

#[test]
fn first_scan_injects_and_classifies() {
  let setup = setup();
  assert!(!setup.page.is_injected());

  let records = body_records(&setup);
  assert!(setup.page.is_injected());

  let summary: Vec<(&str, HiddenKind)> = records
    .iter()
    .map(|r| (r.selector.as_str(), r.hidden_kind))
    .collect();
  assert_eq!(
    summary,
    vec![
      ("div.x:nth-child(2)", HiddenKind::Visibility),
      ("p", HiddenKind::Attribute),
      ("span.faded", HiddenKind::Opacity),
      ("section.tucked", HiddenKind::Display),
      ("input", HiddenKind::Opacity),
    ]
  );
  assert_eq!(records[1].text_preview, "Secret paragraph");
  assert_eq!(records[4].text_preview, "[placeholder] Find");

  let categories = Categories::from_records(&records);
  assert_eq!(categories.get(HiddenKind::Opacity).len(), 2);
  assert_eq!(categories.get(HiddenKind::Display).len(), 1);
  assert_eq!(setup.client.last_results().map(|r| r.len()), Some(records.len() + 2));
}

#[test]
fn show_hide_round_trip_over_the_channel() {
  let setup = setup();
  let records = body_records(&setup);
  let twin = &records[0];

  assert!(!setup.client.perform(&setup.channel, ElementAction::Hide, twin).unwrap());
  assert!(setup.client.perform(&setup.channel, ElementAction::Show, twin).unwrap());

  let agent = setup.page.agent().unwrap();
  let node = agent.find_element(twin).unwrap();
  assert_eq!(
    agent.with_dom(|d| d.inline_style(&node, StyleProperty::Visibility)),
    "visible"
  );

  assert!(setup.client.perform(&setup.channel, ElementAction::Hide, twin).unwrap());
  assert_eq!(
    agent.with_dom(|d| d.inline_style(&node, StyleProperty::Visibility)),
    "hidden"
  );
  assert!(!agent.has_shadow_state(twin));
}

#[test]
fn scroll_restores_after_delay() {
  let setup = setup();
  let records = body_records(&setup);
  let section = records
    .iter()
    .find(|r| r.selector == "section.tucked")
    .unwrap();

  let id = section.id.clone();
  assert!(setup
    .client
    .perform_by_id(&setup.channel, ElementAction::Scroll, &id)
    .unwrap());

  let agent = setup.page.agent().unwrap();
  let node = agent.find_element(section).unwrap();
  assert_eq!(agent.with_dom(|d| d.computed_style(&node).unwrap().display), "block");

  setup.clock.advance(2000);
  assert_eq!(agent.tick(), 1);
  assert_eq!(agent.with_dom(|d| d.computed_style(&node).unwrap().display), "none");
  assert_eq!(agent.pending_timers(), 0);
}

#[test]
fn stale_record_fails_without_panicking() {
  let setup = setup();
  let records = body_records(&setup);
  let agent = setup.page.agent().unwrap();

  agent.with_dom_mut(|d| {
    let first_twin = d
      .elements()
      .into_iter()
      .find(|n| d.tag_name(n) == "div")
      .unwrap();
    d.remove(first_twin);
  });

  assert!(!setup
    .client
    .perform(&setup.channel, ElementAction::Show, &records[0])
    .unwrap());
}

#[test]
fn scans_are_broadcast_and_settings_shape_results() {
  let setup = setup();
  let agent = setup.page.inject();
  let mut events = agent.subscribe();

  let records = body_records(&setup);
  let Ok(Event::ScanComplete { elements }) = events.try_recv() else {
    panic!("expected a scan notification");
  };
  assert_eq!(elements.len(), records.len() + 2);

  let settings = Settings::initialize(setup.client.store()).unwrap();
  assert!(settings.auto_scan);
  // Layout is not computed for parsed documents, so every box is empty.
  assert!(setup.client.shaped_results().is_empty());
}

#[test]
fn media_blocks_and_selector_combinators_hide_elements() {
  let page = Page::new(MemoryDocument::parse_html(
    "<html><head><style>\
       @media screen { .m { display: none } }\
       @media print { .p { display: none } }\
       .n:not(.keep) { display: none }\
       li + li { visibility: hidden }\
       [class^=gh] { opacity: 0 }\
     </style></head><body>\
       <div class='m'>m</div><div class='p'>p</div>\
       <div class='n'>n</div><div class='n keep'>k</div>\
       <ul><li>one</li><li>two</li></ul>\
       <span class='ghost'>g</span>\
     </body></html>",
  ));
  let records: Vec<(String, HiddenKind)> = page
    .inject()
    .find_hidden_elements()
    .into_iter()
    .filter(|r| !matches!(r.tag_name.as_str(), "head" | "style"))
    .map(|r| (r.text_preview, r.hidden_kind))
    .collect();
  assert_eq!(
    records,
    vec![
      ("m".to_string(), HiddenKind::Display),
      ("n".to_string(), HiddenKind::Display),
      ("two".to_string(), HiddenKind::Visibility),
      ("g".to_string(), HiddenKind::Opacity),
    ]
  );
}

#[test]
fn deeply_nested_element_is_found() {
  let depth = 3000;
  let html = format!(
    "{}<span hidden>deep</span>{}",
    "<div>".repeat(depth),
    "</div>".repeat(depth)
  );
  let page = Page::new(MemoryDocument::parse_fragment(&html));
  let records = page.inject().find_hidden_elements();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].hidden_kind, HiddenKind::Attribute);
  assert_eq!(records[0].text_preview, "deep");
}
