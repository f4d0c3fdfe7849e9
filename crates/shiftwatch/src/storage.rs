//! Runtime choice between the file and Redis ledgers.

use shiftwatch_core::{Code, Result, ledger::SeenLedger};
use shiftwatch_store_file::FileLedger;
use shiftwatch_store_redis::RedisLedger;

use crate::settings::StorageChoice;

/// The configured seen-code ledger.
#[derive(Debug, Clone)]
pub enum Ledger {
  File(FileLedger),
  Redis(RedisLedger),
}

impl Ledger {
  /// Build the backend named by `choice`. No I/O happens until the first
  /// [`SeenLedger::filter_and_record`] call.
  pub fn open(choice: &StorageChoice, redis_password: Option<&str>) -> Result<Self> {
    Ok(match choice {
      StorageChoice::File(path) => Self::File(FileLedger::new(path.clone())),
      StorageChoice::Redis(addr) => Self::Redis(RedisLedger::new(addr, redis_password)?),
    })
  }
}

impl SeenLedger for Ledger {
  async fn filter_and_record(&self, batch: &[Code]) -> Result<Vec<Code>> {
    match self {
      Self::File(ledger) => ledger.filter_and_record(batch).await,
      Self::Redis(ledger) => ledger.filter_and_record(batch).await,
    }
  }
}
