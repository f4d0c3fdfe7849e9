//! [`RedisLedger`]: the Redis implementation of [`SeenLedger`].

use std::{collections::HashSet, future::Future, time::Duration};

use redis::{AsyncCommands as _, ConnectionInfo, IntoConnectionInfo as _, aio::MultiplexedConnection};
use shiftwatch_core::{Code, ledger::SeenLedger};
use tracing::debug;

use crate::{Error, Result};

/// Name of the Redis set holding every seen code.
pub const SET_KEY: &str = "shift_codes";

/// Upper bound on any single Redis round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// A seen-code ledger kept in a Redis set.
///
/// Construction performs no I/O; a connection is established per call.
#[derive(Debug, Clone)]
pub struct RedisLedger {
  client:  redis::Client,
  key:     String,
  timeout: Duration,
}

impl RedisLedger {
  /// `addr` is either `host:port` or a full `redis://` / `rediss://` URL.
  /// A non-empty `password` overrides any password in the URL.
  pub fn new(addr: &str, password: Option<&str>) -> Result<Self> {
    let client = redis::Client::open(connection_info(addr, password)?)?;
    Ok(Self {
      client,
      key: SET_KEY.to_owned(),
      timeout: DEFAULT_TIMEOUT,
    })
  }

  /// Use a set other than [`SET_KEY`].
  pub fn with_key(mut self, key: impl Into<String>) -> Self {
    self.key = key.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
  where
    F: Future<Output = redis::RedisResult<T>>,
  {
    match tokio::time::timeout(self.timeout, fut).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(Error::Timeout {
        op,
        after: self.timeout,
      }),
    }
  }

  async fn connection(&self) -> Result<MultiplexedConnection> {
    self
      .bounded("connect", self.client.get_multiplexed_async_connection())
      .await
  }

  /// Check-then-add each distinct code of `batch` against the set, in input
  /// order. Codes already in the set, or repeated within the batch, are not
  /// returned.
  async fn record<C: SetCommands>(&self, conn: &mut C, batch: &[Code]) -> Result<Vec<Code>> {
    let mut recorded: HashSet<&str> = HashSet::new();
    let mut new = Vec::new();

    for code in batch {
      if !recorded.insert(code.as_str()) {
        continue;
      }

      let exists = self
        .bounded("SISMEMBER", conn.is_member(&self.key, code.as_str()))
        .await?;
      if exists {
        continue;
      }

      self
        .bounded("SADD", conn.add_member(&self.key, code.as_str()))
        .await?;
      new.push(code.clone());
    }

    debug!(key = %self.key, batch = batch.len(), new = new.len(), "seen-set updated");
    Ok(new)
  }
}

// ─── Set commands ────────────────────────────────────────────────────────────

/// The two set commands the ledger issues.
pub(crate) trait SetCommands: Send {
  fn is_member<'a>(
    &'a mut self,
    key: &'a str,
    member: &'a str,
  ) -> impl Future<Output = redis::RedisResult<bool>> + Send + 'a;

  fn add_member<'a>(
    &'a mut self,
    key: &'a str,
    member: &'a str,
  ) -> impl Future<Output = redis::RedisResult<()>> + Send + 'a;
}

impl SetCommands for MultiplexedConnection {
  async fn is_member(&mut self, key: &str, member: &str) -> redis::RedisResult<bool> {
    self.sismember(key, member).await
  }

  async fn add_member(&mut self, key: &str, member: &str) -> redis::RedisResult<()> {
    let _: i64 = self.sadd(key, member).await?;
    Ok(())
  }
}

/// Build connection details from a bare address or URL plus an optional
/// password.
fn connection_info(addr: &str, password: Option<&str>) -> Result<ConnectionInfo> {
  let url = if addr.contains("://") {
    addr.to_owned()
  } else {
    format!("redis://{addr}")
  };

  let mut info = url.as_str().into_connection_info()?;
  if let Some(password) = password.filter(|p| !p.is_empty()) {
    info.redis.password = Some(password.to_owned());
  }
  Ok(info)
}

// ─── SeenLedger impl ─────────────────────────────────────────────────────────

impl SeenLedger for RedisLedger {
  async fn filter_and_record(&self, batch: &[Code]) -> shiftwatch_core::Result<Vec<Code>> {
    let mut conn = self.connection().await?;
    Ok(self.record(&mut conn, batch).await?)
  }
}
