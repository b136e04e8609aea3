/*! Error types for unveil operations. */

/// Errors raised by a [`Dom`](crate::dom::Dom) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
  #[error("Invalid selector '{selector}': {reason}")]
  InvalidSelector { selector: String, reason: String },

  #[error("Invalid XPath '{xpath}': {reason}")]
  InvalidXPath { xpath: String, reason: String },

  #[error("Unknown node: {0}")]
  UnknownNode(String),

  #[error("Node is not an element: {0}")]
  NotAnElement(String),

  #[error("Style unavailable for {node}: {reason}")]
  StyleUnavailable { node: String, reason: String },
}

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Failures on the caller side of the message boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
  #[error("No listener on the page side")]
  NoListener,

  #[error("Malformed message: {0}")]
  Malformed(String),

  #[error("Page did not answer after {attempts} attempts")]
  Exhausted { attempts: u32 },

  #[error("Injection failed: {0}")]
  InjectionFailed(String),
}

/// Errors that can occur during unveil operations.
#[derive(Debug, thiserror::Error)]
pub enum UnveilError {
  /// Neither the selector nor the XPath resolved to a live element.
  #[error("Element not found (selector '{selector}', xpath '{xpath}')")]
  ElementNotFound { selector: String, xpath: String },

  /// `hide` was requested for an element that was never shown.
  #[error("No captured state for element '{selector}'")]
  NoCapturedState { selector: String },

  /// A single element failed during classification. Local to the scan.
  #[error("Scan failed for element {node}: {source}")]
  ElementScanFailed {
    node: String,
    #[source]
    source: DomError,
  },

  #[error("Channel failure: {0}")]
  Channel(#[from] ChannelError),

  #[error("DOM error: {0}")]
  Dom(#[from] DomError),

  #[error("Storage error: {0}")]
  Storage(String),
}

/// Result type for unveil operations.
pub type UnveilResult<T> = Result<T, UnveilError>;
