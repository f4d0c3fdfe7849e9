//! Code extraction from free-form post and comment text.
//!
//! Extraction never fails: text without a code simply yields nothing.

use std::{collections::HashSet, future::Future, sync::LazyLock};

use regex::Regex;
use tracing::debug;

use crate::code::{CODE_PATTERN, Code};

static CODE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(CODE_PATTERN).expect("code pattern is valid"));

/// Every non-overlapping code in `text`, left to right, duplicates included.
pub fn extract_codes(text: &str) -> Vec<Code> {
  CODE_RE
    .find_iter(text)
    .map(|m| Code::from_match(m.as_str()))
    .collect()
}

/// Extract the codes for one post thread.
///
/// The post body is searched first. Only when it holds no code at all is
/// `load_comments` invoked; its top-level comment bodies are then searched in
/// order and the results concatenated. The loader is never called otherwise.
pub async fn codes_from_thread<F, Fut, E>(
  post_body: &str,
  load_comments: F,
) -> Result<Vec<Code>, E>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<Vec<String>, E>>,
{
  let codes = extract_codes(post_body);
  if !codes.is_empty() {
    return Ok(codes);
  }

  debug!("no codes in post body, consulting top-level comments");
  let comments = load_comments().await?;
  Ok(
    comments
      .iter()
      .flat_map(|body| extract_codes(body))
      .collect(),
  )
}

/// Collapse duplicates across a whole candidate batch, keeping the first
/// occurrence of each code in place.
pub fn dedup_preserving_order(codes: impl IntoIterator<Item = Code>) -> Vec<Code> {
  let mut seen = HashSet::new();
  codes
    .into_iter()
    .filter(|code| seen.insert(code.clone()))
    .collect()
}
