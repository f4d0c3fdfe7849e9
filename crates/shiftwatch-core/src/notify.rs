//! Outbound notifications and the [`Notifier`] trait.
//!
//! A batch of new codes is split into [`Notification`]s of at most
//! [`MAX_CODES_PER_MESSAGE`] codes, since downstream channels reject
//! oversized payloads. Each notification is delivered as one unit.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{Code, Result, source::PostMeta};

/// Largest number of codes carried by one outbound message.
pub const MAX_CODES_PER_MESSAGE: usize = 10;

pub const REDEEM_URL: &str = "https://shift.gearboxsoftware.com/rewards";

pub const TITLE: &str = "New Shift Codes";

// ─── Notification ────────────────────────────────────────────────────────────

/// One outbound message: a titled card listing up to ten codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title:       String,
  pub description: String,
  pub codes:       Vec<Code>,
  pub post_title:  Option<String>,
  /// Human-readable age of the source post, e.g. `"12 minutes ago"`.
  pub post_age:    Option<String>,
}

impl Notification {
  /// Split `codes` into notifications of at most [`MAX_CODES_PER_MESSAGE`]
  /// codes each, preserving order. Every chunk carries the same header and
  /// post footer. An empty batch yields no notifications.
  pub fn chunked(
    codes: &[Code],
    post: Option<&PostMeta>,
    now: DateTime<Utc>,
  ) -> Vec<Self> {
    let post_title = post.and_then(|p| p.title.clone()).filter(|t| !t.is_empty());
    let post_age = post
      .and_then(|p| p.created_at)
      .map(|created_at| post_age(created_at, now));

    codes
      .chunks(MAX_CODES_PER_MESSAGE)
      .map(|chunk| Self {
        title:       TITLE.to_owned(),
        description: format!("Here are the latest shift codes, redeem at {REDEEM_URL}"),
        codes:       chunk.to_vec(),
        post_title:  post_title.clone(),
        post_age:    post_age.clone(),
      })
      .collect()
  }

  /// Plain-text rendering, for channels without rich cards and for logs.
  pub fn to_text(&self) -> String {
    let codes = self
      .codes
      .iter()
      .map(Code::as_str)
      .collect::<Vec<_>>()
      .join("\n");
    let mut text = format!("**{}**\n{}\n\n{codes}", self.title, self.description);

    if let Some(title) = &self.post_title {
      text.push_str(&format!("\n\n*Post title: {title}*"));
    }
    if let Some(age) = &self.post_age {
      text.push_str(&format!("\n*Post age: {age}*"));
    }
    text
  }

  /// Footer line combining post title and age, if either is known.
  pub fn footer(&self) -> Option<String> {
    match (&self.post_title, &self.post_age) {
      (Some(title), Some(age)) => Some(format!("{title} · posted {age}")),
      (Some(title), None) => Some(title.clone()),
      (None, Some(age)) => Some(format!("posted {age}")),
      (None, None) => None,
    }
  }
}

/// Whole minutes between `created_at` and `now`, rendered for humans.
/// A timestamp in the future counts as zero minutes.
pub fn post_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let minutes = (now - created_at).num_minutes().max(0);
  format!("{minutes} minutes ago")
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A downstream channel that delivers notifications.
///
/// Implementations report every failure as
/// [`Error::DeliveryFailure`](crate::Error::DeliveryFailure).
pub trait Notifier: Send + Sync {
  fn send<'a>(
    &'a self,
    notification: &'a Notification,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
