//! Error type for `shiftwatch-store-file`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("seen-set file {} is not a JSON object of codes: {source}", path.display())]
  Decode {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to encode seen-set: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("failed to replace seen-set file: {0}")]
  Persist(#[from] tempfile::PersistError),

  #[error("blocking task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl From<Error> for shiftwatch_core::Error {
  fn from(err: Error) -> Self { shiftwatch_core::Error::store("file", err) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
