//! Wire types for the Reddit listing and comment endpoints.
//!
//! Only the handful of fields shiftwatch reads are modelled; everything else
//! in the payload is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shiftwatch_core::source::PostMeta;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Listing<T> {
  data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
  children: Vec<Thing<T>>,
}

/// A typed Reddit object (`t1` comment, `t3` link, `more` stub, ...).
#[derive(Debug, Deserialize)]
struct Thing<T> {
  kind: String,
  data: T,
}

/// A submission, as returned by `/r/{sub}/new.json`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct Post {
  pub id:          String,
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub selftext:    String,
  #[serde(default)]
  pub created_utc: Option<f64>,
}

impl Post {
  /// The text searched for codes: title, then self-text.
  pub fn body(&self) -> String {
    if self.selftext.is_empty() {
      self.title.clone()
    } else {
      format!("{}\n{}", self.title, self.selftext)
    }
  }

  pub fn meta(&self) -> PostMeta {
    PostMeta {
      created_at: self
        .created_utc
        .filter(|ts| *ts > 0.0)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0)),
      title:      Some(self.title.clone()).filter(|t| !t.is_empty()),
    }
  }
}

#[derive(Debug, Deserialize)]
struct Comment {
  /// Absent on `more` stubs.
  #[serde(default)]
  body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
  #[serde(default)]
  pub access_token: Option<String>,
  #[serde(default)]
  pub expires_in:   Option<u64>,
  #[serde(default)]
  pub error:        Option<serde_json::Value>,
}

/// The newest post of a `new.json` listing, if there is one.
pub(crate) fn parse_newest_post(json: &str) -> Result<Option<Post>> {
  let listing: Listing<Post> = serde_json::from_str(json)?;
  Ok(
    listing
      .data
      .children
      .into_iter()
      .find(|thing| thing.kind == "t3")
      .map(|thing| thing.data),
  )
}

/// Top-level comment bodies from a `comments/{id}.json` response, in order.
///
/// The response is a pair of listings: the post itself, then its comments.
pub(crate) fn parse_top_level_comments(json: &str) -> Result<Vec<String>> {
  let (_post, comments): (serde_json::Value, Listing<Comment>) = serde_json::from_str(json)?;
  Ok(
    comments
      .data
      .children
      .into_iter()
      .filter(|thing| thing.kind == "t1")
      .filter_map(|thing| thing.data.body)
      .collect(),
  )
}

/// The bearer token and its lifetime in seconds.
pub(crate) fn parse_token(json: &str) -> Result<(String, Option<u64>)> {
  let token: TokenResponse = serde_json::from_str(json)?;
  match (token.access_token, token.error) {
    (Some(access_token), None) if !access_token.is_empty() => {
      Ok((access_token, token.expires_in))
    }
    (_, Some(error)) => Err(Error::Auth(error.to_string())),
    _ => Err(Error::Auth("token response carried no access_token".into())),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  const NEW_JSON: &str = r#"{
    "kind": "Listing",
    "data": {
      "after": "t3_1abc",
      "children": [{
        "kind": "t3",
        "data": {
          "id": "1abc",
          "title": "[BL4] Golden Key: ABCDE-FGHIJ-KLMNO-PQRST-UVWXY",
          "selftext": "Expires Sunday.",
          "created_utc": 1700000000.0,
          "ups": 42
        }
      }]
    }
  }"#;

  const COMMENTS_JSON: &str = r#"[
    {"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {"id": "1abc"}}]}},
    {"kind": "Listing", "data": {"children": [
      {"kind": "t1", "data": {"body": "first", "replies": {"kind": "Listing", "data": {"children": []}}}},
      {"kind": "t1", "data": {"body": "code: B2222-B2222-B2222-B2222-B2222"}},
      {"kind": "more", "data": {"count": 3, "children": ["x", "y"]}}
    ]}}
  ]"#;

  #[test]
  fn newest_post_is_decoded() {
    let post = parse_newest_post(NEW_JSON).unwrap().unwrap();
    assert_eq!(post.id, "1abc");
    assert_eq!(
      post.body(),
      "[BL4] Golden Key: ABCDE-FGHIJ-KLMNO-PQRST-UVWXY\nExpires Sunday."
    );

    let meta = post.meta();
    assert_eq!(meta.created_at, Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
    assert_eq!(meta.title.as_deref(), Some("[BL4] Golden Key: ABCDE-FGHIJ-KLMNO-PQRST-UVWXY"));
  }

  #[test]
  fn empty_listing_has_no_post() {
    let json = r#"{"kind": "Listing", "data": {"children": []}}"#;
    assert_eq!(parse_newest_post(json).unwrap(), None);
  }

  #[test]
  fn missing_timestamp_is_unknown() {
    let json = r#"{"data": {"children": [{"kind": "t3", "data": {"id": "z", "title": ""}}]}}"#;
    let meta = parse_newest_post(json).unwrap().unwrap().meta();
    assert_eq!(meta.created_at, None);
    assert_eq!(meta.title, None);
  }

  #[test]
  fn only_top_level_comment_bodies_are_returned() {
    let bodies = parse_top_level_comments(COMMENTS_JSON).unwrap();
    assert_eq!(bodies, vec!["first", "code: B2222-B2222-B2222-B2222-B2222"]);
  }

  #[test]
  fn malformed_listing_is_an_error() {
    assert!(matches!(parse_newest_post("<html>"), Err(Error::Json(_))));
    assert!(parse_top_level_comments("{}").is_err());
  }

  #[test]
  fn token_is_extracted() {
    let (token, expires) =
      parse_token(r#"{"access_token": "abc", "token_type": "bearer", "expires_in": 86400}"#)
        .unwrap();
    assert_eq!(token, "abc");
    assert_eq!(expires, Some(86400));
  }

  #[test]
  fn token_error_is_auth_failure() {
    assert!(matches!(
      parse_token(r#"{"error": "invalid_grant"}"#),
      Err(Error::Auth(_))
    ));
    assert!(matches!(parse_token("{}"), Err(Error::Auth(_))));
  }
}
