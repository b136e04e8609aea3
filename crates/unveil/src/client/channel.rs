/*! Transport seam between a control surface and the page. */

use std::sync::Arc;

use crate::core::Page;
use crate::dom::Dom;
use crate::protocol::{dispatch_json, Request, Response};
use crate::types::ChannelError;

/// Request/response transport to a page agent.
pub trait Channel {
  /// Send one request and wait for its single answer.
  fn send(&self, request: &Request) -> Result<Response, ChannelError>;
}

/// Installs the page agent on the other side of a [`Channel`].
pub trait Injector {
  /// Install the agent. Installing twice leaves the first one in place.
  fn inject(&self) -> Result<(), ChannelError>;
}

/// In-process channel to a [`Page`]. Messages are encoded to JSON and back so
/// records cross the boundary as data only.
pub struct LocalChannel<D: Dom> {
  page: Arc<Page<D>>,
}

impl<D: Dom> std::fmt::Debug for LocalChannel<D> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocalChannel")
      .field("page", &self.page)
      .finish()
  }
}

impl<D: Dom> Clone for LocalChannel<D> {
  fn clone(&self) -> Self {
    Self {
      page: Arc::clone(&self.page),
    }
  }
}

impl<D: Dom> LocalChannel<D> {
  /// Channel to `page`. Requests fail with `NoListener` until it is injected.
  pub const fn new(page: Arc<Page<D>>) -> Self {
    Self { page }
  }
}

impl<D: Dom> Channel for LocalChannel<D> {
  fn send(&self, request: &Request) -> Result<Response, ChannelError> {
    let agent = self.page.agent().ok_or(ChannelError::NoListener)?;
    let encoded = serde_json::to_value(request).map_err(|e| ChannelError::Malformed(e.to_string()))?;
    let reply = dispatch_json(&agent, &encoded);
    serde_json::from_value(reply).map_err(|e| ChannelError::Malformed(e.to_string()))
  }
}

impl<D: Dom> Injector for LocalChannel<D> {
  fn inject(&self) -> Result<(), ChannelError> {
    self.page.inject();
    Ok(())
  }
}
