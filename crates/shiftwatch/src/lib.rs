//! Polling job that forwards newly posted SHiFT codes to a webhook.
//!
//! Configuration, storage selection and the poll cycle live here so they can
//! be exercised without the binary; `main.rs` only wires real collaborators
//! into a [`Watcher`].

pub mod settings;
pub mod storage;
pub mod watcher;

pub use settings::{Cli, ConfigError, Settings, StorageChoice};
pub use storage::Ledger;
pub use watcher::{CycleOutcome, Watcher, shutdown_signal};
