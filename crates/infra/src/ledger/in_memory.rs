use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::{ExpectedVersion, ItemId, MovementId};
use stockroom_inventory::{Movement, NewMovement};

use super::r#trait::{LedgerError, LedgerSnapshot, MovementFilter, MovementLedger};

#[derive(Debug, Default)]
struct LedgerState {
    /// Insertion order == commit order.
    movements: Vec<Movement>,
    versions: HashMap<ItemId, u64>,
}

impl LedgerState {
    fn version(&self, item_id: ItemId) -> u64 {
        self.versions.get(&item_id).copied().unwrap_or(0)
    }

    fn bump(&mut self, item_id: ItemId) {
        *self.versions.entry(item_id).or_insert(0) += 1;
    }
}

/// In-memory append-only ledger.
///
/// Intended for tests/dev and the CLI's snapshot files. Not optimized for
/// performance. Locks are only held inside synchronous sections, never across
/// an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from previously stored records (e.g. a snapshot file).
    ///
    /// Each record counts as one write to its item's version.
    pub fn from_movements(movements: impl IntoIterator<Item = Movement>) -> Self {
        let mut state = LedgerState::default();
        for m in movements {
            state.bump(m.item_id);
            state.movements.push(m);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Every stored record, active or not, in commit order.
    pub fn export(&self) -> Result<Vec<Movement>, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.movements.clone())
    }
}

#[async_trait]
impl MovementLedger for InMemoryLedger {
    async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;

        let movements = state
            .movements
            .iter()
            .filter(|m| m.item_id == item_id && m.is_active)
            .cloned()
            .collect();

        Ok(LedgerSnapshot {
            item_id,
            version: state.version(item_id),
            movements,
        })
    }

    async fn append_movement(
        &self,
        movement: NewMovement,
        expected: ExpectedVersion,
    ) -> Result<Movement, LedgerError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;

        let item_id = movement.item_id;
        let current = state.version(item_id);
        if !expected.matches(current) {
            return Err(LedgerError::Concurrency(format!(
                "item {item_id}: expected {expected:?}, found {current}"
            )));
        }

        let stored = movement.into_movement(MovementId::new(), Utc::now());
        state.movements.push(stored.clone());
        state.bump(item_id);

        Ok(stored)
    }

    async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;

        let movement = state
            .movements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(LedgerError::NotFound(id))?;

        if !movement.is_active {
            return Ok(movement.clone());
        }
        movement.is_active = false;
        let deactivated = movement.clone();
        state.bump(deactivated.item_id);

        Ok(deactivated)
    }

    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.movements.iter().find(|m| m.id == id).cloned())
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError> {
        let state = self
            .state
            .read()
            .map_err(|_| LedgerError::Unavailable("lock poisoned".to_string()))?;

        // Newest first; commit order breaks timestamp ties.
        let mut out: Vec<Movement> = state
            .movements
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(out)
    }
}
