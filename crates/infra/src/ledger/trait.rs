use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::{ExpectedVersion, ItemId, MovementId};
use stockroom_inventory::{Movement, NewMovement, compute_item_stock};

/// Ledger operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, insufficient stock).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("movement not found: {0}")]
    NotFound(MovementId),

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("ledger storage unavailable: {0}")]
    Unavailable(String),
}

/// Everything the core needs to decide about one item: its active movements
/// and the ledger version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub item_id: ItemId,
    /// Number of ledger writes (appends and deactivations) that touched the item.
    pub version: u64,
    pub movements: Vec<Movement>,
}

impl LedgerSnapshot {
    /// Authoritative stock at `version`.
    pub fn current_stock(&self) -> i64 {
        compute_item_stock(self.item_id, &self.movements)
    }
}

/// Equality filters for history queries. Results are newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementFilter {
    pub item_id: Option<ItemId>,
    pub active_only: bool,
}

impl Default for MovementFilter {
    fn default() -> Self {
        Self::active()
    }
}

impl MovementFilter {
    /// Every active movement, all items.
    pub fn active() -> Self {
        Self {
            item_id: None,
            active_only: true,
        }
    }

    /// Active history of one item.
    pub fn for_item(item_id: ItemId) -> Self {
        Self {
            item_id: Some(item_id),
            active_only: true,
        }
    }

    /// Include soft-deleted records (audit view).
    pub fn including_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        (!self.active_only || movement.is_active)
            && self.item_id.is_none_or(|id| id == movement.item_id)
    }
}

/// Append-only movement ledger (the storage collaborator of the recorder).
///
/// ## Append Semantics
///
/// `append_movement()`:
/// - assigns the movement id and timestamp
/// - checks `expected` against the item's current ledger version
/// - persists atomically (no partial write) and bumps the item version
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - return complete per-item snapshots (no pagination gaps)
/// - reject conditional appends whose expectation no longer holds
/// - never edit or hard-delete a movement; deactivation is the only update
#[async_trait]
pub trait MovementLedger: Send + Sync {
    /// All active movements of one item plus the version they were read at.
    async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError>;

    /// All active movements of one item, in no particular order.
    async fn list_active_movements(&self, item_id: ItemId) -> Result<Vec<Movement>, LedgerError> {
        Ok(self.load_item(item_id).await?.movements)
    }

    /// Append a validated movement, conditionally on the item's version.
    async fn append_movement(
        &self,
        movement: NewMovement,
        expected: ExpectedVersion,
    ) -> Result<Movement, LedgerError>;

    /// Soft-delete a movement. Already inactive records are returned unchanged.
    async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError>;

    /// Look up one movement, active or not.
    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError>;

    /// History query, newest first.
    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError>;
}

#[async_trait]
impl<L> MovementLedger for Arc<L>
where
    L: MovementLedger + ?Sized,
{
    async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError> {
        (**self).load_item(item_id).await
    }

    async fn append_movement(
        &self,
        movement: NewMovement,
        expected: ExpectedVersion,
    ) -> Result<Movement, LedgerError> {
        (**self).append_movement(movement, expected).await
    }

    async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError> {
        (**self).deactivate_movement(id).await
    }

    async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError> {
        (**self).get_movement(id).await
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError> {
        (**self).list_movements(filter).await
    }
}
