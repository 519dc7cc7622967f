//! JSON snapshot of the whole store (document-store stand-in for the CLI).
//!
//! A process that changes the store holds a [`StoreLock`] from load to
//! commit. Each commit also bumps the file's `revision`; a commit whose
//! loaded revision no longer matches the file is refused, so a writer that
//! skipped the lock cannot erase another process's movements.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fs4::fs_std::FileExt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_inventory::{Employee, Item, Movement, Truck};

use crate::catalog::{CatalogError, InMemoryCatalog};
use crate::ledger::{InMemoryLedger, LedgerError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("snapshot changed on disk since it was loaded (loaded revision {loaded}, found {found})")]
    Conflict { loaded: u64, found: u64 },
}

/// Serialized form: one collection per record type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Number of commits written to the file.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub trucks: Vec<Truck>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub movements: Vec<Movement>,
}

/// Live in-memory adapters built from a snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    pub ledger: Arc<InMemoryLedger>,
    pub catalog: Arc<InMemoryCatalog>,
    revision: AtomicU64,
}

/// Exclusive advisory lock on a snapshot file, released on drop.
///
/// Lives in a `<file>.lock` sidecar because commits replace the snapshot
/// file itself by rename.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    _file: File,
}

impl StoreLock {
    /// Block until no other process holds the store.
    pub fn acquire(snapshot_path: &Path) -> Result<Self, SnapshotError> {
        let path = snapshot_path.with_extension("json.lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        FileExt::lock_exclusive(&file)?;
        tracing::debug!(path = %path.display(), "store lock acquired");
        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreSnapshot {
    /// Read a snapshot file; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "snapshot not found; starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically: temp file next to the target, then rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn into_store(self) -> SnapshotStore {
        SnapshotStore {
            revision: AtomicU64::new(self.revision),
            ledger: Arc::new(InMemoryLedger::from_movements(self.movements)),
            catalog: Arc::new(InMemoryCatalog::from_records(
                self.items,
                self.trucks,
                self.employees,
            )),
        }
    }
}

impl SnapshotStore {
    /// Revision the store was loaded at, or last committed.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn export(&self) -> Result<StoreSnapshot, SnapshotError> {
        Ok(StoreSnapshot {
            revision: self.revision(),
            items: self.catalog.export_items()?,
            trucks: self.catalog.export_trucks()?,
            employees: self.catalog.export_employees()?,
            movements: self.ledger.export()?,
        })
    }

    /// Write the store to `path` as the next revision.
    ///
    /// Fails with [`SnapshotError::Conflict`] and writes nothing when the
    /// file was committed by someone else after this store was loaded.
    pub fn commit(&self, path: &Path) -> Result<u64, SnapshotError> {
        let loaded = self.revision();
        let found = StoreSnapshot::load(path)?.revision;
        if found != loaded {
            tracing::warn!(path = %path.display(), loaded, found, "snapshot commit refused");
            return Err(SnapshotError::Conflict { loaded, found });
        }

        let mut snapshot = self.export()?;
        snapshot.revision = loaded + 1;
        snapshot.save(path)?;
        self.revision.store(snapshot.revision, Ordering::SeqCst);
        tracing::debug!(path = %path.display(), revision = snapshot.revision, "snapshot committed");
        Ok(snapshot.revision)
    }
}
