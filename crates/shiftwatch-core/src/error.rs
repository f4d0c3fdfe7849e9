//! Error types for `shiftwatch-core`.
//!
//! Every collaborator reports failures through this one taxonomy so the poll
//! cycle can decide, per error class, whether to skip, abandon, or carry on.

use thiserror::Error;

/// Boxed source error carried by the collaborator-level variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid shift code: {0:?}")]
  InvalidCode(String),

  /// The seen-set medium (file or remote store) could not be read or
  /// written, or its contents could not be (de)serialised.
  #[error("seen-code store unavailable ({backend}): {source}")]
  StoreUnavailable {
    backend: &'static str,
    #[source]
    source:  BoxError,
  },

  #[error("upstream source unavailable: {0}")]
  UpstreamUnavailable(#[source] BoxError),

  #[error("notification delivery failed: {0}")]
  DeliveryFailure(#[source] BoxError),
}

impl Error {
  pub fn store(backend: &'static str, source: impl Into<BoxError>) -> Self {
    Self::StoreUnavailable {
      backend,
      source: source.into(),
    }
  }

  pub fn upstream(source: impl Into<BoxError>) -> Self {
    Self::UpstreamUnavailable(source.into())
  }

  pub fn delivery(source: impl Into<BoxError>) -> Self {
    Self::DeliveryFailure(source.into())
  }

  pub fn is_store_unavailable(&self) -> bool {
    matches!(self, Self::StoreUnavailable { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
