/*!
Control-surface side of the message boundary.

A [`ScanClient`] asks the page for a scan over a [`Channel`], injecting the
agent and polling with a [`RetryPolicy`] when nobody answers, and keeps the
last snapshot in a caller-owned [`Store`]. Result caps, zero-size filtering
and grouping are applied here, never by the page agent.

```
use std::sync::Arc;
use unveil::client::{LocalChannel, MemoryStore, RetryPolicy, ScanClient};
use unveil::{ElementAction, MemoryDocument, Page};

let page = Arc::new(Page::new(MemoryDocument::parse_fragment("<p hidden>x</p>")));
let channel = LocalChannel::new(page);
let client = ScanClient::new(MemoryStore::new())
  .with_retry(RetryPolicy::default().interval(std::time::Duration::ZERO));

let records = client.scan(&channel, &channel).unwrap();
assert_eq!(records.len(), 1);
assert!(client.perform(&channel, ElementAction::Show, &records[0]).unwrap());
```
*/

mod channel;
mod retry;
mod settings;
mod shaping;
mod store;

pub use channel::{Channel, Injector, LocalChannel};
pub use retry::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_INTERVAL};
pub use settings::Settings;
pub use shaping::{
  apply_settings, clear_results, last_results, store_results, Categories, RESULTS_KEY,
};
pub use store::{MemoryStore, Store};

use crate::protocol::{Request, Response};
use crate::types::{ChannelError, ElementAction, HiddenElementRecord, UnveilResult};

/// Drives scans and actions from the caller's side.
#[derive(Debug)]
pub struct ScanClient<S: Store> {
  store: S,
  retry: RetryPolicy,
}

impl<S: Store> ScanClient<S> {
  /// Client persisting into `store`, with the default retry policy.
  pub fn new(store: S) -> Self {
    Self {
      store,
      retry: RetryPolicy::default(),
    }
  }

  /// Polling used after injecting the agent. Default: 10 attempts, 100ms apart.
  #[must_use]
  pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// The backing store.
  pub const fn store(&self) -> &S {
    &self.store
  }

  fn elements_of(response: Response) -> Option<Vec<HiddenElementRecord>> {
    if let Some(error) = &response.error {
      log::debug!("scan answered with error: {error}");
    }
    response
      .success
      .then(|| response.elements.unwrap_or_default())
  }

  /// Request a scan. If the page does not answer successfully, inject the
  /// agent and poll. The snapshot is stored under [`RESULTS_KEY`].
  pub fn scan(
    &self,
    channel: &dyn Channel,
    injector: &dyn Injector,
  ) -> UnveilResult<Vec<HiddenElementRecord>> {
    let first = match channel.send(&Request::FindHiddenElements) {
      Ok(response) => Self::elements_of(response),
      Err(e) => {
        log::debug!("first scan request failed: {e}");
        None
      }
    };

    let elements = match first {
      Some(elements) => elements,
      None => {
        injector.inject()?;
        self
          .retry
          .run(|_| channel.send(&Request::FindHiddenElements).map(Self::elements_of))?
      }
    };

    store_results(&self.store, &elements)?;
    log::debug!("stored {} scan results", elements.len());
    Ok(elements)
  }

  /// Send one action. `Ok(false)` when the page could not apply it.
  pub fn perform(
    &self,
    channel: &dyn Channel,
    action: ElementAction,
    record: &HiddenElementRecord,
  ) -> Result<bool, ChannelError> {
    let response = channel.send(&Request::ElementAction {
      action,
      element_data: record.clone(),
    })?;
    if let Some(error) = response.error {
      log::warn!("{action} failed on page: {error}");
    }
    Ok(response.success)
  }

  /// Act on a stored record by its `id`. `Ok(false)` when no stored record matches.
  pub fn perform_by_id(
    &self,
    channel: &dyn Channel,
    action: ElementAction,
    id: &str,
  ) -> Result<bool, ChannelError> {
    let Some(record) = self
      .last_results()
      .and_then(|records| records.into_iter().find(|r| r.id == id))
    else {
      log::warn!("no stored record with id {id}");
      return Ok(false);
    };
    self.perform(channel, action, &record)
  }

  /// Last stored snapshot.
  pub fn last_results(&self) -> Option<Vec<HiddenElementRecord>> {
    last_results(&self.store)
  }

  /// Forget the stored snapshot.
  pub fn clear_results(&self) -> UnveilResult<()> {
    clear_results(&self.store)
  }

  /// Current settings, defaults filled in.
  pub fn settings(&self) -> Settings {
    Settings::load(&self.store)
  }

  /// Stored snapshot with the current settings applied.
  pub fn shaped_results(&self) -> Vec<HiddenElementRecord> {
    let settings = self.settings();
    apply_settings(self.last_results().unwrap_or_default(), &settings)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use std::time::Duration;

  use super::*;
  use crate::types::HiddenKind;

  /// Answers only after a number of failed sends; counts injections.
  struct SlowPage {
    ready_after: u32,
    sends: Cell<u32>,
    injections: Cell<u32>,
    fail_injection: bool,
  }

  impl SlowPage {
    fn new(ready_after: u32) -> Self {
      Self {
        ready_after,
        sends: Cell::new(0),
        injections: Cell::new(0),
        fail_injection: false,
      }
    }
  }

  impl Channel for SlowPage {
    fn send(&self, request: &Request) -> Result<Response, ChannelError> {
      self.sends.set(self.sends.get() + 1);
      if self.sends.get() <= self.ready_after {
        return Err(ChannelError::NoListener);
      }
      Ok(match request {
        Request::FindHiddenElements => Response::scanned(vec![HiddenElementRecord::from_locator(
          "#a",
          "",
          HiddenKind::Display,
        )]),
        Request::ElementAction { action, .. } => match action {
          ElementAction::Show | ElementAction::Scroll => Response::ok(),
          ElementAction::Hide => Response::error("nothing captured"),
        },
      })
    }
  }

  impl Injector for SlowPage {
    fn inject(&self) -> Result<(), ChannelError> {
      self.injections.set(self.injections.get() + 1);
      if self.fail_injection {
        return Err(ChannelError::InjectionFailed("blocked".into()));
      }
      Ok(())
    }
  }

  fn client() -> ScanClient<MemoryStore> {
    ScanClient::new(MemoryStore::new()).with_retry(RetryPolicy::default().interval(Duration::ZERO))
  }

  #[test]
  fn answered_first_time_skips_injection() {
    let page = SlowPage::new(0);
    let client = client();
    assert_eq!(client.scan(&page, &page).unwrap().len(), 1);
    assert_eq!(page.injections.get(), 0);
    assert_eq!(client.last_results().map(|r| r.len()), Some(1));
  }

  #[test]
  fn injects_then_polls() {
    let page = SlowPage::new(4);
    let client = client();
    assert_eq!(client.scan(&page, &page).unwrap().len(), 1);
    assert_eq!(page.injections.get(), 1);
    assert_eq!(page.sends.get(), 5);
  }

  #[test]
  fn gives_up_after_policy_attempts() {
    let page = SlowPage::new(100);
    let client = client();
    let err = client.scan(&page, &page).unwrap_err();
    assert!(matches!(
      err,
      crate::types::UnveilError::Channel(ChannelError::Exhausted { attempts: 10 })
    ));
    assert_eq!(page.sends.get(), 11);
    assert!(client.last_results().is_none());
  }

  #[test]
  fn injection_failure_is_reported() {
    let mut page = SlowPage::new(100);
    page.fail_injection = true;
    let err = client().scan(&page, &page).unwrap_err();
    assert!(matches!(
      err,
      crate::types::UnveilError::Channel(ChannelError::InjectionFailed(_))
    ));
    assert_eq!(page.sends.get(), 1);
  }

  #[test]
  fn actions_are_single_requests() {
    let page = SlowPage::new(0);
    let client = client();
    let records = client.scan(&page, &page).unwrap();
    let sends = page.sends.get();

    assert_eq!(client.perform(&page, ElementAction::Show, &records[0]), Ok(true));
    assert_eq!(client.perform(&page, ElementAction::Hide, &records[0]), Ok(false));
    assert_eq!(page.sends.get(), sends + 2);

    let id = records[0].id.clone();
    assert_eq!(client.perform_by_id(&page, ElementAction::Scroll, &id), Ok(true));
    assert_eq!(client.perform_by_id(&page, ElementAction::Scroll, "missing"), Ok(false));
  }

  #[test]
  fn shaped_results_follow_stored_settings() {
    let page = SlowPage::new(0);
    let client = client();
    client.scan(&page, &page).unwrap();
    assert!(client.shaped_results().is_empty());

    client.store().set("includeZeroSizeElements", serde_json::json!(true)).unwrap();
    assert_eq!(client.shaped_results().len(), 1);

    client.clear_results().unwrap();
    assert!(client.shaped_results().is_empty());
  }
}
