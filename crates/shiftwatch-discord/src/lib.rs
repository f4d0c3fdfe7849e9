//! Discord webhook notifier for shiftwatch.

mod payload;
mod webhook;

pub mod error;

pub use error::{Error, Result};
pub use webhook::DiscordNotifier;
