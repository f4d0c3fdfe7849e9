//! Error type for `shiftwatch-discord`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("webhook returned {status}: {body}")]
  Status { status: u16, body: String },
}

impl From<Error> for shiftwatch_core::Error {
  fn from(err: Error) -> Self { shiftwatch_core::Error::delivery(err) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
