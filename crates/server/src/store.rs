//! Persisted watchlist: one JSON file holding the ordered list of monitored
//! wallets. Every operation re-reads the whole file and mutations rewrite it
//! whole, serialized behind a single in-process mutex so concurrent
//! read-modify-write windows cannot interleave and lose updates.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use common::types::{ApiError, WatchlistEntry};
use tracing::{info, warn};

pub struct WatchlistStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Current entries in stored (insertion) order. A missing file is an
    /// empty watchlist; a malformed file degrades to empty with a warning
    /// rather than failing requests.
    pub fn list(&self) -> Vec<WatchlistEntry> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    /// Add a wallet, or update its name when the address is already present.
    /// Idempotent on address: there is never more than one entry per address.
    /// A `None` name leaves an existing entry's name untouched.
    pub fn add(&self, address: &str, name: Option<&str>) -> Result<Vec<WatchlistEntry>, ApiError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        match entries.iter_mut().find(|e| e.address == address) {
            Some(existing) => {
                if let Some(name) = name {
                    existing.name = name.to_string();
                }
            }
            None => entries.push(WatchlistEntry {
                address: address.to_string(),
                name: name.unwrap_or_default().to_string(),
            }),
        }
        self.persist(&entries)?;
        Ok(entries)
    }

    /// Rename an existing wallet. Unknown addresses are an error, unlike
    /// `add`.
    pub fn rename(&self, address: &str, name: &str) -> Result<Vec<WatchlistEntry>, ApiError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        let Some(existing) = entries.iter_mut().find(|e| e.address == address) else {
            return Err(ApiError::NotFound(address.to_string()));
        };
        existing.name = name.to_string();
        self.persist(&entries)?;
        Ok(entries)
    }

    /// Remove a wallet. Removing an unknown address is a no-op.
    pub fn remove(&self, address: &str) -> Result<Vec<WatchlistEntry>, ApiError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        entries.retain(|e| e.address != address);
        self.persist(&entries)?;
        Ok(entries)
    }

    /// Read and, when needed, migrate the persisted file. The legacy format
    /// is a flat array of bare address strings; it is rewritten once to the
    /// structured form, detected by the type of the first element so a
    /// second pass is a no-op.
    fn load(&self) -> Vec<WatchlistEntry> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = self.persist(&[]) {
                    warn!(path = %self.path.display(), error = %e, "failed to create watchlist file");
                }
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read watchlist file");
                return Vec::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed watchlist file, treating as empty");
                return Vec::new();
            }
        };

        if let Some(items) = value.as_array() {
            if items.first().is_some_and(serde_json::Value::is_string) {
                let migrated: Vec<WatchlistEntry> = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|addr| WatchlistEntry {
                        address: addr.to_string(),
                        name: String::new(),
                    })
                    .collect();
                info!(
                    path = %self.path.display(),
                    count = migrated.len(),
                    "migrated legacy watchlist format"
                );
                if let Err(e) = self.persist(&migrated) {
                    warn!(error = %e, "failed to persist migrated watchlist");
                }
                return migrated;
            }
        }

        match serde_json::from_value(value) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed watchlist entries, treating as empty");
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[WatchlistEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if parent != Path::new("") {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(entries).context("failed to encode watchlist")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
