//! Core types and trait definitions for shiftwatch.
//!
//! This crate is deliberately free of HTTP and storage dependencies. The
//! ledger backends, the Reddit source and the Discord notifier all depend on
//! it; the binary wires them together through the traits defined here.

pub mod code;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod notify;
pub mod source;

pub use code::Code;
pub use error::{BoxError, Error, Result};
