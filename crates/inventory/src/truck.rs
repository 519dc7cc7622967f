use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, TruckId, UserId};

use crate::non_blank;
use crate::photo::normalize_photo_ref;

/// Shortest plate accepted at registration.
pub const MIN_PLATE_LEN: usize = 6;

/// A truck that exits are loaded onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: TruckId,
    /// Upper-cased license plate.
    pub plate: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default)]
    pub capacity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
}

impl Entity for Truck {
    type Id = TruckId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Truck registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTruck {
    pub plate: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl NewTruck {
    pub fn validate(
        self,
        created_by: UserId,
        created_at: DateTime<Utc>,
        max_photo_bytes: usize,
    ) -> DomainResult<Truck> {
        let plate = self.plate.trim().to_uppercase();
        if plate.chars().count() < MIN_PLATE_LEN {
            return Err(DomainError::validation(
                "plate",
                format!("plate is required and must have at least {MIN_PLATE_LEN} characters"),
            ));
        }

        Ok(Truck {
            id: TruckId::new(),
            plate,
            model: non_blank(self.model).unwrap_or_default(),
            brand: non_blank(self.brand).unwrap_or_default(),
            year: self.year,
            capacity: non_blank(self.capacity).unwrap_or_default(),
            photo_ref: normalize_photo_ref(self.photo_ref, max_photo_bytes)?,
            is_active: true,
            created_at,
            created_by,
        })
    }
}
