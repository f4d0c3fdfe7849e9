//! The [`SeenLedger`] trait, owner of the seen-set.
//!
//! The trait is implemented by storage backends (`shiftwatch-store-file`,
//! `shiftwatch-store-redis`). The poll cycle depends on this abstraction, not
//! on any concrete backend.

use std::{collections::BTreeSet, future::Future, sync::Mutex};

use crate::{Code, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable record of every code ever judged new.
///
/// A code, once recorded, stays recorded for the lifetime of the store: there
/// is no eviction and no expiry.
pub trait SeenLedger: Send + Sync {
  /// Return the codes in `batch` that were never seen before, in the order of
  /// their first novel occurrence, and record the whole batch as seen.
  ///
  /// A code repeated within `batch` is reported at most once. When this
  /// returns `Ok`, every code in `batch` is durably recorded. On `Err` the
  /// output is unusable and the caller must notify for none of the batch;
  /// backends report every medium failure as
  /// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable).
  fn filter_and_record<'a>(
    &'a self,
    batch: &'a [Code],
  ) -> impl Future<Output = Result<Vec<Code>>> + Send + 'a;
}

/// Apply `batch` to an in-memory seen-set, returning the novel codes.
///
/// Shared by backends that hold the whole set in memory for the duration of a
/// call.
pub fn record_batch(seen: &mut BTreeSet<String>, batch: &[Code]) -> Vec<Code> {
  batch
    .iter()
    .filter(|code| seen.insert(code.as_str().to_owned()))
    .cloned()
    .collect()
}

// ─── In-memory ledger ────────────────────────────────────────────────────────

/// A non-persistent ledger for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryLedger {
  seen: Mutex<BTreeSet<String>>,
}

impl MemoryLedger {
  pub fn new() -> Self { Self::default() }

  /// Start from an already-populated seen-set.
  pub fn with_seen<I, S>(codes: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      seen: Mutex::new(codes.into_iter().map(Into::into).collect()),
    }
  }

  pub fn contains(&self, code: &str) -> bool {
    self.lock().contains(code)
  }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
    // A poisoned set is still a valid set; nothing is left half-inserted.
    self.seen.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl SeenLedger for MemoryLedger {
  async fn filter_and_record(&self, batch: &[Code]) -> Result<Vec<Code>> {
    Ok(record_batch(&mut self.lock(), batch))
  }
}
