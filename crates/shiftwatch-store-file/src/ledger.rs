//! [`FileLedger`]: the file-backed implementation of [`SeenLedger`].

use std::{
  collections::{BTreeMap, BTreeSet},
  fs,
  io::{self, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use shiftwatch_core::{
  Code,
  ledger::{SeenLedger, record_batch},
};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{Error, Result};

/// Seen-set file used when no storage is configured.
pub const DEFAULT_PATH: &str = "codes.json";

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// A seen-code ledger stored as a single JSON document.
///
/// Every call is a whole-file read-modify-write; the new contents replace the
/// old file by atomic rename, so a failed call leaves the previous file
/// untouched. There is no cross-process locking: only one process may use a
/// given path at a time.
///
/// Cloning is cheap; the path is reference-counted.
#[derive(Debug, Clone)]
pub struct FileLedger {
  path: Arc<PathBuf>,
}

impl FileLedger {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: Arc::new(path.into()),
    }
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Read the current seen-set without modifying it.
  pub async fn load(&self) -> Result<BTreeSet<String>> {
    let path = Arc::clone(&self.path);
    tokio::task::spawn_blocking(move || read_seen(&path)).await?
  }

  async fn apply(&self, batch: Vec<Code>) -> Result<Vec<Code>> {
    let path = Arc::clone(&self.path);
    tokio::task::spawn_blocking(move || -> Result<Vec<Code>> {
      let mut seen = read_seen(&path)?;
      let new = record_batch(&mut seen, &batch);
      write_seen(&path, &seen)?;
      debug!(
        path = %path.display(),
        batch = batch.len(),
        new = new.len(),
        total = seen.len(),
        "seen-set updated"
      );
      Ok(new)
    })
    .await?
  }
}

// ─── SeenLedger impl ─────────────────────────────────────────────────────────

impl SeenLedger for FileLedger {
  async fn filter_and_record(&self, batch: &[Code]) -> shiftwatch_core::Result<Vec<Code>> {
    Ok(self.apply(batch.to_vec()).await?)
  }
}

// ─── File format ─────────────────────────────────────────────────────────────

/// Decode the seen-set at `path`. A missing or blank file is an empty set;
/// anything else must be a JSON object mapping codes to booleans. Entries set
/// to `false` count as unseen.
fn read_seen(path: &Path) -> Result<BTreeSet<String>> {
  let raw = match std::fs::read(path) {
    Ok(raw) => raw,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
    Err(source) => {
      return Err(Error::Io {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  if raw.iter().all(u8::is_ascii_whitespace) {
    return Ok(BTreeSet::new());
  }

  let entries: BTreeMap<String, bool> =
    serde_json::from_slice(&raw).map_err(|source| Error::Decode {
      path: path.to_path_buf(),
      source,
    })?;

  Ok(
    entries
      .into_iter()
      .filter_map(|(code, seen)| seen.then_some(code))
      .collect(),
  )
}

/// Write `seen` to a temporary file beside `path`, flush it to disk, then
/// rename it over `path` and flush the directory entry. An existing file's
/// permissions carry over to its replacement. The temporary file is removed on
/// every early exit.
fn write_seen(path: &Path, seen: &BTreeSet<String>) -> Result<()> {
  let entries: BTreeMap<&str, bool> = seen.iter().map(|code| (code.as_str(), true)).collect();
  let encoded = serde_json::to_vec(&entries).map_err(Error::Encode)?;

  let io_err = |source| Error::Io {
    path: path.to_path_buf(),
    source,
  };

  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
  tmp.write_all(&encoded).map_err(io_err)?;
  tmp.as_file().sync_all().map_err(io_err)?;

  match fs::metadata(path) {
    Ok(meta) => tmp.as_file().set_permissions(meta.permissions()).map_err(io_err)?,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
    Err(err) => return Err(io_err(err)),
  }

  tmp.persist(path)?;
  sync_dir(dir).map_err(io_err)?;
  Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> { fs::File::open(dir)?.sync_all() }

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> { Ok(()) }
