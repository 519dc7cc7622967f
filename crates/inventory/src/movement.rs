use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId, MovementId, TruckId, UserId, ValueObject};

use crate::non_blank;
use crate::photo::normalize_photo_ref;

/// Direction of a stock movement.
///
/// Stored records written by older clients may carry a kind this build does
/// not know; those deserialize into `Unrecognized` and are skipped by the
/// aggregator instead of failing the whole ledger read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,
    Exit,
    #[serde(other)]
    Unrecognized,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
            MovementKind::Unrecognized => "unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MovementKind::Unrecognized)
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for untrusted input: unknown kinds are a validation error.
impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entry" => Ok(MovementKind::Entry),
            "exit" => Ok(MovementKind::Exit),
            other => Err(DomainError::validation(
                "kind",
                format!("unknown movement kind '{other}' (expected 'entry' or 'exit')"),
            )),
        }
    }
}

/// Positive number of units moved by one movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(units: i64) -> DomainResult<Self> {
        if units <= 0 {
            return Err(DomainError::validation("quantity", "must be greater than zero"));
        }
        u32::try_from(units)
            .map(Self)
            .map_err(|_| DomainError::validation("quantity", format!("{units} exceeds {}", u32::MAX)))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl ValueObject for Quantity {}

impl TryFrom<u32> for Quantity {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// A ledger record (immutable once written, soft-deactivatable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub item_name: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_id: Option<TruckId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truck_plate: Option<String>,
    pub responsible: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: UserId,
}

impl Movement {
    /// Signed contribution of this record to its item's stock.
    ///
    /// Inactive records and unrecognized kinds contribute nothing.
    pub fn signed_quantity(&self) -> i64 {
        if !self.is_active {
            return 0;
        }
        match self.kind {
            MovementKind::Entry => self.quantity.as_i64(),
            MovementKind::Exit => -self.quantity.as_i64(),
            MovementKind::Unrecognized => 0,
        }
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Transport reference required on exits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckRef {
    pub truck_id: TruckId,
    pub plate: Option<String>,
}

/// A validated movement, ready to be appended to the ledger.
///
/// The ledger assigns the id and timestamp on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub item_id: ItemId,
    pub item_name: String,
    pub kind: MovementKind,
    pub quantity: Quantity,
    pub truck: Option<TruckRef>,
    pub responsible: String,
    pub notes: Option<String>,
    pub photo_ref: Option<String>,
    pub created_by: UserId,
}

impl NewMovement {
    /// Materialise the stored record (active) with ledger-assigned identity.
    pub fn into_movement(self, id: MovementId, occurred_at: DateTime<Utc>) -> Movement {
        let (truck_id, truck_plate) = match self.truck {
            Some(t) => (Some(t.truck_id), t.plate),
            None => (None, None),
        };
        Movement {
            id,
            item_id: self.item_id,
            item_name: self.item_name,
            kind: self.kind,
            quantity: self.quantity,
            truck_id,
            truck_plate,
            responsible: self.responsible,
            notes: self.notes,
            photo_ref: self.photo_ref,
            occurred_at,
            is_active: true,
            created_by: self.created_by,
        }
    }
}

/// Untrusted movement request as collected by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    #[serde(rename = "type")]
    pub kind: MovementKind,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub item_name: String,
    pub quantity: i64,
    #[serde(default)]
    pub truck_id: Option<TruckId>,
    #[serde(default)]
    pub truck_plate: Option<String>,
    #[serde(default)]
    pub responsible: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl MovementRequest {
    /// Structural validation, fail-fast, in field order.
    ///
    /// Stock sufficiency and item existence need the ledger/catalog and are
    /// checked by the recorder afterwards.
    pub fn validate(self, created_by: UserId, max_photo_bytes: usize) -> DomainResult<NewMovement> {
        if !self.kind.is_recognized() {
            return Err(DomainError::validation("kind", "expected 'entry' or 'exit'"));
        }
        let item_id = self
            .item_id
            .ok_or_else(|| DomainError::validation("item_id", "item is required"))?;
        let item_name = non_blank(Some(self.item_name))
            .ok_or_else(|| DomainError::validation("item_name", "item name is required"))?;
        let quantity = Quantity::new(self.quantity)?;
        let responsible = non_blank(Some(self.responsible))
            .ok_or_else(|| DomainError::validation("responsible", "responsible is required"))?;

        let truck = match self.kind {
            MovementKind::Exit => {
                let truck_id = self
                    .truck_id
                    .ok_or_else(|| DomainError::validation("truck_id", "a truck is required for exits"))?;
                Some(TruckRef {
                    truck_id,
                    plate: non_blank(self.truck_plate),
                })
            }
            _ => None,
        };

        Ok(NewMovement {
            item_id,
            item_name,
            kind: self.kind,
            quantity,
            truck,
            responsible,
            notes: non_blank(self.notes),
            photo_ref: normalize_photo_ref(self.photo_ref, max_photo_bytes)?,
            created_by,
        })
    }
}
