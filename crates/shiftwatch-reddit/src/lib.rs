//! Reddit code source for shiftwatch.
//!
//! Reads the newest post of a subreddit and extracts SHiFT codes from it,
//! falling back to its top-level comments when the post itself has none.

mod listing;
mod source;

pub mod error;

pub use error::{Error, Result};
pub use source::{DEFAULT_SUBREDDIT, RedditConfig, RedditSource};
