//! shiftwatch binary.
//!
//! Reads settings from flags, environment variables and an optional
//! `shiftwatch.toml`, then polls Reddit for SHiFT codes and forwards new ones
//! to a Discord webhook.
//!
//! ```text
//! shiftwatch --filename codes.json --interval-minutes 15 \
//!   --discord-webhook-url https://discord.com/api/webhooks/...
//! ```

use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, error::ErrorKind};
use shiftwatch::{Cli, ConfigError, Ledger, Settings, Watcher, shutdown_signal};
use shiftwatch_discord::DiscordNotifier;
use shiftwatch_reddit::RedditSource;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let settings = match Settings::resolve(Cli::parse()) {
    Ok(settings) => settings,
    Err(err @ ConfigError::ConflictingStorage) => {
      Cli::command().error(ErrorKind::ArgumentConflict, err).exit()
    }
    Err(err) => return Err(err).context("failed to load configuration"),
  };

  // Installed before the first cycle so an interrupt mid-cycle is deferred.
  let shutdown = shutdown_signal().context("failed to install signal handlers")?;

  let ledger = Ledger::open(&settings.storage, settings.redis_password.as_deref())
    .with_context(|| format!("failed to open seen-code store ({})", settings.storage))?;

  if let Ledger::File(file) = &ledger {
    match file.load().await {
      Ok(seen) => tracing::info!(
        path = %file.path().display(),
        seen = seen.len(),
        "loaded seen-code file"
      ),
      Err(err) => tracing::warn!(error = %err, "seen-code file is unreadable"),
    }
  }

  let source = RedditSource::new(settings.reddit.clone()).context("failed to build reddit client")?;

  let notifiers: Vec<DiscordNotifier> = settings
    .discord_webhook_url
    .as_deref()
    .map(DiscordNotifier::new)
    .transpose()
    .context("failed to build discord client")?
    .into_iter()
    .collect();

  tracing::info!(
    storage = %settings.storage,
    subreddit = %settings.reddit.subreddit,
    interval_minutes = settings.interval.as_secs() / 60,
    notifiers = notifiers.len(),
    "starting shiftwatch"
  );

  let watcher = Watcher::new(source, ledger, notifiers);
  let outcome = watcher.run(settings.interval, shutdown).await;
  Ok(if outcome.is_fatal() {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}
