//! The poll cycle: fetch → extract → dedup → record → notify.
//!
//! A cycle runs to completion before the next one starts. Failures are
//! contained per cycle; retrying means waiting for the next scheduled cycle.

use std::{future::Future, time::Duration};

use chrono::Utc;
use shiftwatch_core::{
  Code,
  extract::dedup_preserving_order,
  ledger::SeenLedger,
  notify::{Notification, Notifier},
  source::CodeSource,
};
use tracing::{debug, error, info, warn};

/// What one cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
  /// The source could not be read; nothing was recorded or sent.
  UpstreamFailed,
  /// The ledger could not be read or written; nothing was sent.
  StoreFailed,
  NoNewCodes,
  /// New codes were recorded and delivery attempted. Failed chunks are not
  /// retried: their codes stay recorded as seen.
  Notified { new: Vec<Code>, failed_chunks: usize },
}

impl CycleOutcome {
  /// Whether the process should exit non-zero if this was its last cycle.
  pub fn is_fatal(&self) -> bool { matches!(self, Self::StoreFailed) }
}

// ─── Watcher ──────────────────────────────────────────────────────────────────

pub struct Watcher<S, L, N> {
  source:    S,
  ledger:    L,
  notifiers: Vec<N>,
}

impl<S, L, N> Watcher<S, L, N>
where
  S: CodeSource,
  L: SeenLedger,
  N: Notifier,
{
  pub fn new(source: S, ledger: L, notifiers: Vec<N>) -> Self {
    Self {
      source,
      ledger,
      notifiers,
    }
  }

  pub fn ledger(&self) -> &L { &self.ledger }

  /// Run one cycle.
  pub async fn run_cycle(&self) -> CycleOutcome {
    info!("checking for new shift codes");

    let retrieval = match self.source.fetch().await {
      Ok(retrieval) => retrieval,
      Err(err) => {
        error!(error = %err, "failed to get codes from source");
        return CycleOutcome::UpstreamFailed;
      }
    };

    let batch = dedup_preserving_order(retrieval.codes);
    let new = match self.ledger.filter_and_record(&batch).await {
      Ok(new) => new,
      Err(err) => {
        error!(error = %err, candidates = batch.len(), "failed to filter codes");
        return CycleOutcome::StoreFailed;
      }
    };

    if new.is_empty() {
      info!(candidates = batch.len(), "no new shift codes found in the latest post");
      return CycleOutcome::NoNewCodes;
    }

    let listed = new.iter().map(Code::as_str).collect::<Vec<_>>().join(", ");
    info!(codes = %listed, "sending new shift codes");

    if self.notifiers.is_empty() {
      warn!("no notifier configured; new codes were recorded but not delivered");
    }

    let notifications = Notification::chunked(&new, retrieval.post.as_ref(), Utc::now());
    let mut failed_chunks = 0;
    for notifier in &self.notifiers {
      for (index, notification) in notifications.iter().enumerate() {
        debug!(chunk = index + 1, message = %notification.to_text(), "sending notification");
        if let Err(err) = notifier.send(notification).await {
          failed_chunks += 1;
          error!(
            error = %err,
            chunk = index + 1,
            chunks = notifications.len(),
            "failed to send notification"
          );
        }
      }
    }

    CycleOutcome::Notified { new, failed_chunks }
  }

  /// Run cycles until told to stop.
  ///
  /// A zero `interval` runs exactly one cycle. Otherwise the watcher sleeps
  /// `interval` between cycles and stops once `shutdown` resolves; the
  /// shutdown signal is only acted on between cycles. Returns the outcome of
  /// the last cycle run.
  pub async fn run(&self, interval: Duration, shutdown: impl Future<Output = ()>) -> CycleOutcome {
    tokio::pin!(shutdown);

    loop {
      let outcome = self.run_cycle().await;
      if interval.is_zero() {
        return outcome;
      }

      info!(minutes = interval.as_secs() / 60, "waiting for next interval");
      tokio::select! {
        () = tokio::time::sleep(interval) => {}
        () = &mut shutdown => {
          info!("shutdown requested, stopping");
          return outcome;
        }
      }
    }
  }
}

// ─── Shutdown ─────────────────────────────────────────────────────────────────

/// Listen for an interrupt (and, on unix, `SIGTERM`) from this point on.
///
/// The handler is installed before this returns, so a signal that arrives
/// while a cycle is running is held until [`Watcher::run`] next checks for it
/// instead of killing the process. Must be called inside a Tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
  use tokio::signal::unix::{SignalKind, signal};

  let mut interrupt = signal(SignalKind::interrupt())?;
  let mut terminate = signal(SignalKind::terminate())?;
  Ok(async move {
    tokio::select! {
      _ = interrupt.recv() => {}
      _ = terminate.recv() => {}
    }
  })
}

/// Listen for Ctrl-C from this point on. Must be called inside a Tokio
/// runtime.
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
  let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
  Ok(async move {
    ctrl_c.recv().await;
  })
}

#[cfg(test)]
mod tests {
  use std::{
    collections::VecDeque,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::{Duration as ChronoDuration, Utc};
  use shiftwatch_core::{
    Error, Result,
    ledger::MemoryLedger,
    source::{PostMeta, Retrieval},
  };

  use super::*;

  // ── Fakes ───────────────────────────────────────────────────────────────

  /// Serves queued results in order, then empty retrievals.
  #[derive(Default)]
  struct FakeSource {
    queue: Mutex<VecDeque<Result<Retrieval>>>,
    calls: AtomicUsize,
  }

  impl FakeSource {
    fn serving(results: impl IntoIterator<Item = Result<Retrieval>>) -> Self {
      Self {
        queue: Mutex::new(results.into_iter().collect()),
        calls: AtomicUsize::new(0),
      }
    }
  }

  impl CodeSource for FakeSource {
    async fn fetch(&self) -> Result<Retrieval> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Ok(Retrieval::default()))
    }
  }

  struct BrokenLedger;

  impl SeenLedger for BrokenLedger {
    async fn filter_and_record(&self, _batch: &[Code]) -> Result<Vec<Code>> {
      Err(Error::store("test", "disk on fire"))
    }
  }

  /// Records every notification; fails the 1-based chunk numbers in `fail`.
  #[derive(Default)]
  struct RecordingNotifier {
    sent:     Mutex<Vec<Notification>>,
    attempts: AtomicUsize,
    fail:     Vec<usize>,
  }

  impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
      let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
      if self.fail.contains(&attempt) {
        return Err(Error::delivery("webhook returned 500"));
      }
      self.sent.lock().unwrap().push(notification.clone());
      Ok(())
    }
  }

  fn code(i: usize) -> Code { Code::parse(&format!("{i:05}-SHIFT-SHIFT-SHIFT-SHIFT")).unwrap() }

  fn retrieval(codes: Vec<Code>) -> Result<Retrieval> {
    Ok(Retrieval {
      codes,
      post: Some(PostMeta {
        created_at: Some(Utc::now() - ChronoDuration::minutes(5)),
        title:      Some("Golden keys".into()),
      }),
    })
  }

  // ── run_cycle ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn new_codes_are_deduplicated_recorded_and_sent() {
    let source = FakeSource::serving([retrieval(vec![code(2), code(1), code(2)])]);
    let watcher = Watcher::new(source, MemoryLedger::new(), vec![RecordingNotifier::default()]);

    let outcome = watcher.run_cycle().await;
    assert_eq!(
      outcome,
      CycleOutcome::Notified {
        new:           vec![code(2), code(1)],
        failed_chunks: 0,
      }
    );

    let sent = watcher.notifiers[0].sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].codes, vec![code(2), code(1)]);
    assert_eq!(sent[0].post_title.as_deref(), Some("Golden keys"));
    assert!(watcher.ledger().contains(code(1).as_str()));
  }

  #[tokio::test]
  async fn seen_codes_are_not_sent_again() {
    let source = FakeSource::serving([retrieval(vec![code(1)]), retrieval(vec![code(1)])]);
    let watcher = Watcher::new(source, MemoryLedger::new(), vec![RecordingNotifier::default()]);

    watcher.run_cycle().await;
    assert_eq!(watcher.run_cycle().await, CycleOutcome::NoNewCodes);
    assert_eq!(watcher.notifiers[0].sent.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn large_batches_are_chunked_by_ten() {
    let codes: Vec<_> = (0..25).map(code).collect();
    let source = FakeSource::serving([retrieval(codes.clone())]);
    let watcher = Watcher::new(source, MemoryLedger::new(), vec![RecordingNotifier::default()]);

    watcher.run_cycle().await;

    let sent = watcher.notifiers[0].sent.lock().unwrap();
    let sizes: Vec<_> = sent.iter().map(|n| n.codes.len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    let flattened: Vec<_> = sent.iter().flat_map(|n| n.codes.clone()).collect();
    assert_eq!(flattened, codes);
  }

  #[tokio::test]
  async fn upstream_failure_skips_the_cycle() {
    let source = FakeSource::serving([Err(Error::upstream("reddit returned 503"))]);
    let watcher = Watcher::new(source, MemoryLedger::new(), vec![RecordingNotifier::default()]);

    let outcome = watcher.run_cycle().await;
    assert_eq!(outcome, CycleOutcome::UpstreamFailed);
    assert!(!outcome.is_fatal());
    assert!(watcher.ledger().is_empty());
    assert_eq!(watcher.notifiers[0].attempts.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn store_failure_abandons_the_batch() {
    let source = FakeSource::serving([retrieval(vec![code(1), code(2)])]);
    let watcher = Watcher::new(source, BrokenLedger, vec![RecordingNotifier::default()]);

    let outcome = watcher.run_cycle().await;
    assert_eq!(outcome, CycleOutcome::StoreFailed);
    assert!(outcome.is_fatal());
    assert_eq!(watcher.notifiers[0].attempts.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn failed_chunk_does_not_stop_later_chunks() {
    let codes: Vec<_> = (0..30).map(code).collect();
    let source = FakeSource::serving([retrieval(codes.clone()), retrieval(codes)]);
    let notifier = RecordingNotifier {
      fail: vec![2],
      ..RecordingNotifier::default()
    };
    let watcher = Watcher::new(source, MemoryLedger::new(), vec![notifier]);

    let outcome = watcher.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Notified { failed_chunks: 1, .. }));
    assert_eq!(watcher.notifiers[0].attempts.load(Ordering::SeqCst), 3);
    assert_eq!(watcher.notifiers[0].sent.lock().unwrap().len(), 2);

    // Codes from the failed chunk stay recorded and are never re-sent.
    assert_eq!(watcher.run_cycle().await, CycleOutcome::NoNewCodes);
  }

  #[tokio::test]
  async fn codes_are_recorded_without_notifiers() {
    let source = FakeSource::serving([retrieval(vec![code(7)])]);
    let watcher: Watcher<_, _, RecordingNotifier> =
      Watcher::new(source, MemoryLedger::new(), Vec::new());

    let outcome = watcher.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Notified { failed_chunks: 0, .. }));
    assert!(watcher.ledger().contains(code(7).as_str()));
  }

  #[tokio::test]
  async fn empty_retrieval_is_no_new_codes() {
    let watcher = Watcher::new(
      FakeSource::default(),
      MemoryLedger::new(),
      vec![RecordingNotifier::default()],
    );
    assert_eq!(watcher.run_cycle().await, CycleOutcome::NoNewCodes);
  }

  // ── run ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn zero_interval_runs_once() {
    let watcher = Watcher::new(
      FakeSource::serving([retrieval(vec![code(1)])]),
      BrokenLedger,
      vec![RecordingNotifier::default()],
    );

    let outcome = watcher
      .run(Duration::ZERO, std::future::pending::<()>())
      .await;
    assert_eq!(outcome, CycleOutcome::StoreFailed);
    assert_eq!(watcher.source.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn shutdown_stops_between_cycles() {
    let watcher = Watcher::new(
      FakeSource::serving([retrieval(vec![code(1)])]),
      MemoryLedger::new(),
      vec![RecordingNotifier::default()],
    );

    let outcome = watcher
      .run(Duration::from_secs(3600), std::future::ready(()))
      .await;
    assert!(matches!(outcome, CycleOutcome::Notified { .. }));
    assert_eq!(watcher.source.calls.load(Ordering::SeqCst), 1);
  }

  /// Sends this process `SIGINT` while fetching, then serves one code.
  #[cfg(unix)]
  struct InterruptingSource;

  #[cfg(unix)]
  impl CodeSource for InterruptingSource {
    async fn fetch(&self) -> Result<Retrieval> {
      let status = std::process::Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()
        .unwrap();
      assert!(status.success());
      retrieval(vec![code(3)])
    }
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn interrupt_during_first_cycle_stops_after_it() {
    let watcher = Watcher::new(
      InterruptingSource,
      MemoryLedger::new(),
      vec![RecordingNotifier::default()],
    );
    let shutdown = shutdown_signal().unwrap();

    let outcome = tokio::time::timeout(
      Duration::from_secs(10),
      watcher.run(Duration::from_secs(3600), shutdown),
    )
    .await
    .expect("run did not stop after the interrupt");

    assert!(matches!(outcome, CycleOutcome::Notified { failed_chunks: 0, .. }));
    assert_eq!(watcher.notifiers[0].sent.lock().unwrap().len(), 1);
    assert!(watcher.ledger().contains(code(3).as_str()));
  }
}
