//! Command-line, environment and config-file settings.
//!
//! Precedence, highest first: command-line flag, environment variable,
//! config file, built-in default.

use std::{
  fmt,
  path::{Path, PathBuf},
  time::Duration,
};

use clap::Parser;
use serde::Deserialize;
use shiftwatch_reddit::{DEFAULT_SUBREDDIT, RedditConfig};
use shiftwatch_store_file::DEFAULT_PATH;
use thiserror::Error;
use tracing::warn;

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "shiftwatch.toml";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(
  name = "shiftwatch",
  version,
  about = "Watch a subreddit for new SHiFT codes and post them to a Discord webhook"
)]
pub struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, env = "SHIFTWATCH_CONFIG", value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Address of the Redis server (e.g. localhost:6379).
  #[arg(long, env = "REDIS_ADDR")]
  pub redis_addr: Option<String>,

  /// Redis password.
  #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
  pub redis_password: Option<String>,

  /// Path to the file that stores seen codes.
  #[arg(long, env = "FILENAME", value_name = "FILE")]
  pub filename: Option<PathBuf>,

  /// Discord webhook URL for notifications.
  #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
  pub discord_webhook_url: Option<String>,

  /// Minutes between checks; 0 runs once and exits.
  #[arg(long, env = "INTERVAL_MINUTES")]
  pub interval_minutes: Option<u64>,

  /// Subreddit to watch.
  #[arg(long, env = "SUBREDDIT")]
  pub subreddit: Option<String>,

  /// Reddit OAuth client ID; anonymous access is used when absent.
  #[arg(long, env = "REDDIT_CLIENT_ID")]
  pub reddit_client_id: Option<String>,

  /// Reddit OAuth client secret.
  #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
  pub reddit_client_secret: Option<String>,

  /// User agent sent to Reddit.
  #[arg(long, env = "REDDIT_USER_AGENT")]
  pub reddit_user_agent: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file. Keys mirror the long flags.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
struct FileSettings {
  redis_addr:           Option<String>,
  redis_password:       Option<String>,
  filename:             Option<PathBuf>,
  discord_webhook_url:  Option<String>,
  interval_minutes:     Option<u64>,
  subreddit:            Option<String>,
  reddit_client_id:     Option<String>,
  reddit_client_secret: Option<String>,
  reddit_user_agent:    Option<String>,
}

fn load_file(path: &Path, required: bool) -> Result<FileSettings, ConfigError> {
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(path.to_path_buf()).required(required))
    .build()?;
  Ok(settings.try_deserialize()?)
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("either REDIS_ADDR or FILENAME may be set, but not both")]
  ConflictingStorage,

  #[error("invalid config file: {0}")]
  File(#[from] ::config::ConfigError),
}

// ─── Storage selection ────────────────────────────────────────────────────────

/// Where the seen-set lives. The two backends are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChoice {
  File(PathBuf),
  Redis(String),
}

impl StorageChoice {
  /// Pick the backend from the (already merged) settings. With neither set,
  /// fall back to [`DEFAULT_PATH`]; with both set, refuse.
  pub fn resolve(
    filename: Option<PathBuf>,
    redis_addr: Option<String>,
  ) -> Result<Self, ConfigError> {
    let filename = filename.filter(|p| !p.as_os_str().is_empty());
    let redis_addr = redis_addr.filter(|a| !a.is_empty());

    match (filename, redis_addr) {
      (Some(_), Some(_)) => Err(ConfigError::ConflictingStorage),
      (Some(path), None) => Ok(Self::File(path)),
      (None, Some(addr)) => Ok(Self::Redis(addr)),
      (None, None) => {
        warn!(path = DEFAULT_PATH, "no storage method specified, defaulting to file");
        Ok(Self::File(PathBuf::from(DEFAULT_PATH)))
      }
    }
  }
}

impl fmt::Display for StorageChoice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File(path) => write!(f, "file {}", path.display()),
      Self::Redis(addr) => write!(f, "redis {addr}"),
    }
  }
}

// ─── Resolved settings ────────────────────────────────────────────────────────

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
  pub storage:             StorageChoice,
  pub redis_password:      Option<String>,
  pub discord_webhook_url: Option<String>,
  /// Zero means run a single cycle.
  pub interval:            Duration,
  pub reddit:              RedditConfig,
}

impl Settings {
  /// Merge `cli` over the config file it names (or [`DEFAULT_CONFIG_FILE`]
  /// when present).
  pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
    let file = match &cli.config {
      Some(path) => load_file(path, true)?,
      None => load_file(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    Self::merge(cli, file)
  }

  fn merge(cli: Cli, file: FileSettings) -> Result<Self, ConfigError> {
    fn pick<T>(flag: Option<T>, file: Option<T>) -> Option<T> { flag.or(file) }
    fn pick_str(flag: Option<String>, file: Option<String>) -> Option<String> {
      flag.filter(|s| !s.is_empty()).or(file).filter(|s| !s.is_empty())
    }
    fn pick_path(flag: Option<PathBuf>, file: Option<PathBuf>) -> Option<PathBuf> {
      flag.filter(|p| !p.as_os_str().is_empty()).or(file)
    }

    let storage = StorageChoice::resolve(
      pick_path(cli.filename, file.filename),
      pick_str(cli.redis_addr, file.redis_addr),
    )?;

    let reddit = RedditConfig {
      subreddit:     pick_str(cli.subreddit, file.subreddit)
        .unwrap_or_else(|| DEFAULT_SUBREDDIT.to_owned()),
      client_id:     pick_str(cli.reddit_client_id, file.reddit_client_id).unwrap_or_default(),
      client_secret: pick_str(cli.reddit_client_secret, file.reddit_client_secret)
        .unwrap_or_default(),
      user_agent:    pick_str(cli.reddit_user_agent, file.reddit_user_agent).unwrap_or_default(),
    };

    let minutes = pick(cli.interval_minutes, file.interval_minutes).unwrap_or(0);

    Ok(Self {
      storage,
      redis_password: pick_str(cli.redis_password, file.redis_password),
      discord_webhook_url: pick_str(cli.discord_webhook_url, file.discord_webhook_url),
      interval: Duration::from_secs(minutes * 60),
      reddit,
    })
  }
}
