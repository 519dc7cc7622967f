//! Stock aggregation and restock policy.
//!
//! Everything here is a pure function over movement records: no IO, no hidden
//! state, safe to call concurrently. Stock is a plain sum, so the order in
//! which movements are folded never matters.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ItemId};

use crate::movement::{Movement, MovementKind};

/// Stock level at or below which an item always needs restocking,
/// whatever its configured threshold.
pub const CRITICAL_FLOOR: i64 = 1;

/// Stock level at or below which an item is always worth attention.
pub const ATTENTION_FLOOR: i64 = 2;

/// Fold movements into current stock: active entries add, active exits
/// subtract. Inactive records and unrecognized kinds contribute nothing.
pub fn compute_stock<'a, I>(movements: I) -> i64
where
    I: IntoIterator<Item = &'a Movement>,
{
    movements.into_iter().fold(0, |stock, movement| {
        if movement.is_active && movement.kind == MovementKind::Unrecognized {
            tracing::warn!(
                movement_id = %movement.id,
                item_id = %movement.item_id,
                "skipping movement with unrecognized kind during stock aggregation"
            );
        }
        stock + movement.signed_quantity()
    })
}

/// Like [`compute_stock`], ignoring records that belong to other items.
pub fn compute_item_stock<'a, I>(item_id: ItemId, movements: I) -> i64
where
    I: IntoIterator<Item = &'a Movement>,
{
    compute_stock(movements.into_iter().filter(|m| m.item_id == item_id))
}

/// Whether an item should be restocked.
///
/// True at or below the critical floor (so items configured with
/// `min_stock = 0` still alert) or at or below the configured threshold.
pub fn needs_restock(current_stock: i64, min_stock: i64) -> bool {
    current_stock <= CRITICAL_FLOOR || current_stock <= min_stock
}

/// Three-tier presentation status of a stock level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Low,
    Attention,
    Normal,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Low => "LOW",
            StockStatus::Attention => "ATTENTION",
            StockStatus::Normal => "NORMAL",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a stock level.
///
/// - `Low`: [`needs_restock`] holds.
/// - `Attention`: not low, and stock is within 1.5x the threshold or at most 2.
/// - `Normal`: otherwise.
pub fn classify_status(current_stock: i64, min_stock: i64) -> StockStatus {
    if needs_restock(current_stock, min_stock) {
        return StockStatus::Low;
    }
    // current <= min * 1.5, exactly, without floats or overflow.
    let within_margin = 2 * i128::from(current_stock) <= 3 * i128::from(min_stock);
    if within_margin || current_stock <= ATTENTION_FLOOR {
        StockStatus::Attention
    } else {
        StockStatus::Normal
    }
}

/// Require `available >= requested` before committing an exit.
pub fn ensure_available(available: i64, requested: i64) -> DomainResult<()> {
    if available < requested {
        return Err(DomainError::InsufficientStock {
            available,
            requested,
        });
    }
    Ok(())
}

/// Derived stock view of one item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub current: i64,
    pub min_stock: i64,
    pub needs_restock: bool,
    pub status: StockStatus,
}

impl StockLevel {
    pub fn new(current: i64, min_stock: i64) -> Self {
        Self {
            current,
            min_stock,
            needs_restock: needs_restock(current, min_stock),
            status: classify_status(current, min_stock),
        }
    }

    pub fn from_movements<'a, I>(item_id: ItemId, min_stock: i64, movements: I) -> Self
    where
        I: IntoIterator<Item = &'a Movement>,
    {
        Self::new(compute_item_stock(item_id, movements), min_stock)
    }
}
