//! Error type for `shiftwatch-reddit`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned {status}: {body}")]
  Status {
    url:    String,
    status: u16,
    body:   String,
  },

  #[error("JSON parse error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("authentication rejected: {0}")]
  Auth(String),
}

impl From<Error> for shiftwatch_core::Error {
  fn from(err: Error) -> Self { shiftwatch_core::Error::upstream(err) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
