//! File backend for the shiftwatch seen-code ledger.
//!
//! The whole seen-set lives in one JSON object (`{"CODE": true, ...}`).
//! Blocking file I/O runs on tokio's blocking pool so the async runtime is
//! never stalled.

mod ledger;

pub mod error;

pub use error::{Error, Result};
pub use ledger::{DEFAULT_PATH, FileLedger};
