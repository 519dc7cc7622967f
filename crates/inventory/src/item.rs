use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId, UserId};

use crate::non_blank;
use crate::photo::normalize_photo_ref;
use crate::stock::StockLevel;

/// Catalog record of a stocked item.
///
/// `current_stock` is a read cache written after each committed movement. The
/// ledger is authoritative; never use the cached value to validate an exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    /// Restock threshold; absent in stored data means 0.
    #[serde(default)]
    pub min_stock: u32,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_stock_update: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl Item {
    pub fn min_stock(&self) -> i64 {
        i64::from(self.min_stock)
    }

    /// Stock view for a given (ledger-derived) stock number.
    pub fn stock_level(&self, current: i64) -> StockLevel {
        StockLevel::new(current, self.min_stock())
    }

    /// Overwrite the cached stock.
    pub fn cache_stock(&mut self, current: i64, at: DateTime<Utc>) {
        self.current_stock = current;
        self.last_stock_update = Some(at);
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Item registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub min_stock: Option<i64>,
}

impl NewItem {
    pub fn validate(
        self,
        created_by: UserId,
        created_at: DateTime<Utc>,
        max_photo_bytes: usize,
    ) -> DomainResult<Item> {
        let name = non_blank(Some(self.name))
            .ok_or_else(|| DomainError::validation("name", "name cannot be empty"))?;
        let min_stock = restock_threshold(self.min_stock.unwrap_or(0))?;

        Ok(Item {
            id: ItemId::new(),
            name,
            description: non_blank(self.description).unwrap_or_default(),
            photo_ref: normalize_photo_ref(self.photo_ref, max_photo_bytes)?,
            min_stock,
            current_stock: 0,
            last_stock_update: None,
            is_active: true,
            created_at,
            created_by,
        })
    }
}

fn restock_threshold(min_stock: i64) -> DomainResult<u32> {
    if min_stock < 0 {
        return Err(DomainError::validation("min_stock", "cannot be negative"));
    }
    u32::try_from(min_stock)
        .map_err(|_| DomainError::validation("min_stock", format!("{min_stock} is too large")))
}

/// Metadata edit of an existing item. `None` leaves a field as it is; a
/// blank description or photo clears it.
///
/// Stock is never edited here: the cache belongs to the recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
    #[serde(default)]
    pub min_stock: Option<i64>,
}

/// Validated [`ItemUpdate`], ready to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    name: Option<String>,
    description: Option<String>,
    photo_ref: Option<Option<String>>,
    min_stock: Option<u32>,
}

impl ItemUpdate {
    /// Same rules as registration, for the fields present.
    pub fn validate(self, max_photo_bytes: usize) -> DomainResult<ItemPatch> {
        let name = match self.name {
            Some(name) => Some(
                non_blank(Some(name))
                    .ok_or_else(|| DomainError::validation("name", "name cannot be empty"))?,
            ),
            None => None,
        };
        let photo_ref = match self.photo_ref {
            Some(photo) => Some(normalize_photo_ref(Some(photo), max_photo_bytes)?),
            None => None,
        };

        Ok(ItemPatch {
            name,
            description: self.description.map(|d| d.trim().to_string()),
            photo_ref,
            min_stock: self.min_stock.map(restock_threshold).transpose()?,
        })
    }
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn min_stock(&self) -> Option<u32> {
        self.min_stock
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(photo_ref) = &self.photo_ref {
            item.photo_ref = photo_ref.clone();
        }
        if let Some(min_stock) = self.min_stock {
            item.min_stock = min_stock;
        }
    }
}
