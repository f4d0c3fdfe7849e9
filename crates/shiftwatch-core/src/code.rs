//! [`Code`]: a single SHiFT reward code.
//!
//! A code is five blocks of five ASCII alphanumerics joined by hyphens
//! (`XXXXX-XXXXX-XXXXX-XXXXX-XXXXX`). It is an opaque, case-preserved token:
//! equality is exact string equality.

use std::{borrow::Borrow, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Unanchored pattern for one code; shared with the extractor.
pub const CODE_PATTERN: &str = "[A-Za-z0-9]{5}(?:-[A-Za-z0-9]{5}){4}";

static EXACT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(&format!("^{CODE_PATTERN}$")).expect("code pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
  /// Validate `raw` as exactly one code, with no surrounding text.
  pub fn parse(raw: &str) -> Result<Self> {
    if EXACT_CODE_RE.is_match(raw) {
      Ok(Self(raw.to_owned()))
    } else {
      Err(Error::InvalidCode(raw.to_owned()))
    }
  }

  /// Wrap a string already known to match [`CODE_PATTERN`].
  pub(crate) fn from_match(matched: &str) -> Self { Self(matched.to_owned()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Code {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for Code {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Borrow<str> for Code {
  fn borrow(&self) -> &str { &self.0 }
}

impl FromStr for Code {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for Code {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> {
    if EXACT_CODE_RE.is_match(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidCode(value))
    }
  }
}

impl From<Code> for String {
  fn from(code: Code) -> Self { code.0 }
}
