use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_core::{EmployeeId, ItemId, TruckId};
use stockroom_inventory::{Employee, EmployeePatch, Item, ItemPatch, Truck};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("catalog storage unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Item records, including the derived stock cache.
///
/// `update_cached_stock` is the only write the movement recorder performs
/// here; it is a plain overwrite with the ledger-derived value.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn create_item(&self, item: Item) -> Result<Item, CatalogError>;

    /// Any item, active or not.
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CatalogError>;

    async fn list_active_items(&self) -> Result<Vec<Item>, CatalogError>;

    /// Apply a metadata edit; the stock cache is left alone.
    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CatalogError>;

    async fn update_cached_stock(
        &self,
        id: ItemId,
        current_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<Item, CatalogError>;

    async fn deactivate_item(&self, id: ItemId) -> Result<Item, CatalogError>;
}

#[async_trait]
pub trait TruckRegistry: Send + Sync {
    async fn create_truck(&self, truck: Truck) -> Result<Truck, CatalogError>;
    async fn get_truck(&self, id: TruckId) -> Result<Option<Truck>, CatalogError>;
    async fn list_active_trucks(&self) -> Result<Vec<Truck>, CatalogError>;
    async fn deactivate_truck(&self, id: TruckId) -> Result<Truck, CatalogError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn create_employee(&self, employee: Employee) -> Result<Employee, CatalogError>;
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, CatalogError>;
    async fn list_active_employees(&self) -> Result<Vec<Employee>, CatalogError>;
    async fn update_employee(&self, id: EmployeeId, patch: EmployeePatch) -> Result<Employee, CatalogError>;
    async fn deactivate_employee(&self, id: EmployeeId) -> Result<Employee, CatalogError>;
}

#[async_trait]
impl<C> ItemCatalog for Arc<C>
where
    C: ItemCatalog + ?Sized,
{
    async fn create_item(&self, item: Item) -> Result<Item, CatalogError> {
        (**self).create_item(item).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        (**self).get_item(id).await
    }

    async fn list_active_items(&self) -> Result<Vec<Item>, CatalogError> {
        (**self).list_active_items().await
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CatalogError> {
        (**self).update_item(id, patch).await
    }

    async fn update_cached_stock(
        &self,
        id: ItemId,
        current_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<Item, CatalogError> {
        (**self).update_cached_stock(id, current_stock, at).await
    }

    async fn deactivate_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        (**self).deactivate_item(id).await
    }
}

#[async_trait]
impl<C> TruckRegistry for Arc<C>
where
    C: TruckRegistry + ?Sized,
{
    async fn create_truck(&self, truck: Truck) -> Result<Truck, CatalogError> {
        (**self).create_truck(truck).await
    }

    async fn get_truck(&self, id: TruckId) -> Result<Option<Truck>, CatalogError> {
        (**self).get_truck(id).await
    }

    async fn list_active_trucks(&self) -> Result<Vec<Truck>, CatalogError> {
        (**self).list_active_trucks().await
    }

    async fn deactivate_truck(&self, id: TruckId) -> Result<Truck, CatalogError> {
        (**self).deactivate_truck(id).await
    }
}

#[async_trait]
impl<C> EmployeeDirectory for Arc<C>
where
    C: EmployeeDirectory + ?Sized,
{
    async fn create_employee(&self, employee: Employee) -> Result<Employee, CatalogError> {
        (**self).create_employee(employee).await
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, CatalogError> {
        (**self).get_employee(id).await
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>, CatalogError> {
        (**self).list_active_employees().await
    }

    async fn update_employee(&self, id: EmployeeId, patch: EmployeePatch) -> Result<Employee, CatalogError> {
        (**self).update_employee(id, patch).await
    }

    async fn deactivate_employee(&self, id: EmployeeId) -> Result<Employee, CatalogError> {
        (**self).deactivate_employee(id).await
    }
}
