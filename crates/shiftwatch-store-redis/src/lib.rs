//! Redis backend for the shiftwatch seen-code ledger.
//!
//! The seen-set is one Redis set. Each code's membership check and insert are
//! individual commands; the batch as a whole is not atomic.

mod ledger;

pub mod error;

pub use error::{Error, Result};
pub use ledger::{DEFAULT_TIMEOUT, RedisLedger, SET_KEY};
