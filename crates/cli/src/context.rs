//! Services wired over one snapshot file, plus the acting session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;

use stockroom_auth::{Actor, Role, Session};
use stockroom_core::UserId;
use stockroom_infra::{
    CatalogService, InMemoryCatalog, InMemoryLedger, MovementRecorder, RecorderConfig, SnapshotStore,
    StockReport, StoreLock, StoreSnapshot,
};

pub struct Context {
    path: PathBuf,
    store: SnapshotStore,
    pub session: Session,
    pub recorder: MovementRecorder<Arc<InMemoryLedger>, Arc<InMemoryCatalog>>,
    pub report: StockReport<Arc<InMemoryLedger>, Arc<InMemoryCatalog>>,
    pub catalog: CatalogService<Arc<InMemoryCatalog>>,
    json: bool,
    _lock: StoreLock,
}

impl Context {
    /// Load the store, holding its lock until the context is dropped.
    pub fn open(path: &Path, user: Option<UserId>, role: &str, json: bool) -> anyhow::Result<Self> {
        let lock = StoreLock::acquire(path)
            .with_context(|| format!("failed to lock store {}", path.display()))?;
        let store = StoreSnapshot::load(path)
            .with_context(|| format!("failed to load store {}", path.display()))?
            .into_store();
        let config = RecorderConfig::from_env();

        let session = match user {
            Some(user_id) => Session::signed_in(Actor::new(user_id, vec![Role::new(role.to_string())])),
            None => Session::anonymous(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            recorder: MovementRecorder::with_config(
                Arc::clone(&store.ledger),
                Arc::clone(&store.catalog),
                config,
            ),
            report: StockReport::new(Arc::clone(&store.ledger), Arc::clone(&store.catalog)),
            catalog: CatalogService::new(Arc::clone(&store.catalog), &config),
            store,
            session,
            json,
            _lock: lock,
        })
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.session.actor()
    }

    /// Commit the store back to its file as the next revision.
    pub fn save(&self) -> anyhow::Result<()> {
        let revision = self
            .store
            .commit(&self.path)
            .with_context(|| format!("failed to save store {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), revision, "store saved");
        Ok(())
    }

    /// Print `value` as JSON with `--json`, otherwise with `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }
}
