//! The [`CodeSource`] trait: where candidate codes come from.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{Code, Result};

/// Optional metadata about the post the codes were found in. Used only for
/// message formatting; never part of the dedup key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMeta {
  /// `None` when the upstream did not report a creation time.
  pub created_at: Option<DateTime<Utc>>,
  pub title:      Option<String>,
}

/// One retrieval's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieval {
  /// Candidate codes in extraction order; may contain duplicates.
  pub codes: Vec<Code>,
  pub post:  Option<PostMeta>,
}

/// An upstream that yields candidate codes.
///
/// Implementations perform their own authentication, fetching and
/// extraction, and report every failure to do so as
/// [`Error::UpstreamUnavailable`](crate::Error::UpstreamUnavailable).
pub trait CodeSource: Send + Sync {
  fn fetch(&self) -> impl Future<Output = Result<Retrieval>> + Send + '_;
}
