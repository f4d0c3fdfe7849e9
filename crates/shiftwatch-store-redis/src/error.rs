//! Error type for `shiftwatch-store-redis`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("redis error: {0}")]
  Redis(#[from] redis::RedisError),

  #[error("redis {op} timed out after {after:?}")]
  Timeout { op: &'static str, after: Duration },
}

impl From<Error> for shiftwatch_core::Error {
  fn from(err: Error) -> Self { shiftwatch_core::Error::store("redis", err) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
