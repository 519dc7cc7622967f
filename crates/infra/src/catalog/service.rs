use chrono::Utc;
use tracing::{info, instrument};

use stockroom_auth::{Actor, Permission, require};
use stockroom_core::{EmployeeId, ItemId, TruckId};
use stockroom_inventory::{
    Employee, EmployeeUpdate, Item, ItemUpdate, NewEmployee, NewItem, NewTruck, Truck,
};

use super::r#trait::{EmployeeDirectory, ItemCatalog, TruckRegistry};
use crate::config::RecorderConfig;
use crate::error::ServiceError;

/// Registration, edits and soft-deactivation of catalog records.
///
/// Writes need `catalog.manage`; listings need `stock.read`.
#[derive(Debug)]
pub struct CatalogService<C> {
    catalog: C,
    max_photo_bytes: usize,
}

impl<C> CatalogService<C>
where
    C: ItemCatalog + TruckRegistry + EmployeeDirectory,
{
    pub fn new(catalog: C, config: &RecorderConfig) -> Self {
        Self {
            catalog,
            max_photo_bytes: config.max_photo_bytes,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    #[instrument(skip(self, actor, new), err)]
    pub async fn register_item(&self, actor: Option<&Actor>, new: NewItem) -> Result<Item, ServiceError> {
        let actor = require(actor, &Permission::CATALOG_MANAGE)?;
        let item = new.validate(actor.user_id, Utc::now(), self.max_photo_bytes)?;
        let item = self.catalog.create_item(item).await?;
        info!(item_id = %item.id, name = %item.name, min_stock = item.min_stock, "item registered");
        Ok(item)
    }

    #[instrument(skip(self, actor, new), err)]
    pub async fn register_truck(&self, actor: Option<&Actor>, new: NewTruck) -> Result<Truck, ServiceError> {
        let actor = require(actor, &Permission::CATALOG_MANAGE)?;
        let truck = new.validate(actor.user_id, Utc::now(), self.max_photo_bytes)?;
        let truck = self.catalog.create_truck(truck).await?;
        info!(truck_id = %truck.id, plate = %truck.plate, "truck registered");
        Ok(truck)
    }

    #[instrument(skip(self, actor, new), err)]
    pub async fn register_employee(
        &self,
        actor: Option<&Actor>,
        new: NewEmployee,
    ) -> Result<Employee, ServiceError> {
        let actor = require(actor, &Permission::CATALOG_MANAGE)?;
        let employee = new.validate(actor.user_id, Utc::now())?;
        let employee = self.catalog.create_employee(employee).await?;
        info!(employee_id = %employee.id, "employee registered");
        Ok(employee)
    }

    /// Edit item metadata. A new `min_stock` takes effect on the next report.
    #[instrument(skip(self, actor, update), err)]
    pub async fn update_item(
        &self,
        actor: Option<&Actor>,
        id: ItemId,
        update: ItemUpdate,
    ) -> Result<Item, ServiceError> {
        require(actor, &Permission::CATALOG_MANAGE)?;
        let patch = update.validate(self.max_photo_bytes)?;
        let item = self.catalog.update_item(id, patch).await?;
        info!(item_id = %id, min_stock = item.min_stock, "item updated");
        Ok(item)
    }

    #[instrument(skip(self, actor, update), err)]
    pub async fn update_employee(
        &self,
        actor: Option<&Actor>,
        id: EmployeeId,
        update: EmployeeUpdate,
    ) -> Result<Employee, ServiceError> {
        require(actor, &Permission::CATALOG_MANAGE)?;
        let patch = update.validate()?;
        let employee = self.catalog.update_employee(id, patch).await?;
        info!(employee_id = %id, "employee updated");
        Ok(employee)
    }

    /// Hide an item from listings. Its ledger history is untouched.
    pub async fn deactivate_item(&self, actor: Option<&Actor>, id: ItemId) -> Result<Item, ServiceError> {
        require(actor, &Permission::CATALOG_MANAGE)?;
        let item = self.catalog.deactivate_item(id).await?;
        info!(item_id = %id, "item deactivated");
        Ok(item)
    }

    pub async fn deactivate_truck(&self, actor: Option<&Actor>, id: TruckId) -> Result<Truck, ServiceError> {
        require(actor, &Permission::CATALOG_MANAGE)?;
        let truck = self.catalog.deactivate_truck(id).await?;
        info!(truck_id = %id, "truck deactivated");
        Ok(truck)
    }

    pub async fn deactivate_employee(
        &self,
        actor: Option<&Actor>,
        id: EmployeeId,
    ) -> Result<Employee, ServiceError> {
        require(actor, &Permission::CATALOG_MANAGE)?;
        let employee = self.catalog.deactivate_employee(id).await?;
        info!(employee_id = %id, "employee deactivated");
        Ok(employee)
    }

    pub async fn active_trucks(&self, actor: Option<&Actor>) -> Result<Vec<Truck>, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        Ok(self.catalog.list_active_trucks().await?)
    }

    pub async fn active_employees(&self, actor: Option<&Actor>) -> Result<Vec<Employee>, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        Ok(self.catalog.list_active_employees().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stockroom_core::UserId;
    use stockroom_inventory::{MovementKind, MovementRequest, StockStatus};

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::ledger::InMemoryLedger;
    use crate::recorder::MovementRecorder;
    use crate::stock_report::{ItemStock, StockReport};

    fn service() -> CatalogService<InMemoryCatalog> {
        CatalogService::new(InMemoryCatalog::new(), &RecorderConfig::default())
    }

    #[tokio::test]
    async fn admin_registers_and_deactivates_items() {
        let service = service();
        let admin = Actor::admin(UserId::new());

        let item = service
            .register_item(
                Some(&admin),
                NewItem {
                    name: " Gloves ".to_string(),
                    min_stock: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(item.name, "Gloves");
        assert_eq!(item.created_by, admin.user_id);

        service.deactivate_item(Some(&admin), item.id).await.unwrap();
        assert!(service.catalog().list_active_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn operators_cannot_manage_the_catalog() {
        let service = service();
        let operator = Actor::operator(UserId::new());
        let err = service
            .register_truck(
                Some(&operator),
                NewTruck {
                    plate: "XYZ9876".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(p) if p == "catalog.manage"));

        // Listing is a read.
        assert!(service.active_trucks(Some(&operator)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_plates_and_blank_names_are_rejected() {
        let service = service();
        let admin = Actor::admin(UserId::new());

        let err = service
            .register_truck(
                Some(&admin),
                NewTruck {
                    plate: " ab12 ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("plate"));

        let err = service
            .register_employee(Some(&admin), NewEmployee::default())
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[tokio::test]
    async fn raising_the_threshold_changes_reported_status() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let service = CatalogService::new(Arc::clone(&catalog), &RecorderConfig::default());
        let recorder = MovementRecorder::new(Arc::clone(&ledger), Arc::clone(&catalog));
        let report = StockReport::new(ledger, Arc::clone(&catalog));
        let admin = Actor::admin(UserId::new());

        let item = service
            .register_item(
                Some(&admin),
                NewItem {
                    name: "Gloves".to_string(),
                    min_stock: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        recorder
            .record_movement(
                Some(&admin),
                MovementRequest {
                    kind: MovementKind::Entry,
                    item_id: Some(item.id),
                    item_name: item.name.clone(),
                    quantity: 12,
                    truck_id: None,
                    truck_plate: None,
                    responsible: "Ana".to_string(),
                    notes: None,
                    photo_ref: None,
                },
            )
            .await
            .unwrap();
        let status = |r: &ItemStock| r.level.status;
        assert_eq!(status(&report.item_stock(Some(&admin), item.id).await.unwrap()), StockStatus::Normal);

        let edited = service
            .update_item(
                Some(&admin),
                item.id,
                ItemUpdate {
                    min_stock: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.min_stock, 10);
        assert_eq!(edited.current_stock, 12);
        assert_eq!(
            status(&report.item_stock(Some(&admin), item.id).await.unwrap()),
            StockStatus::Attention
        );

        service
            .update_item(
                Some(&admin),
                item.id,
                ItemUpdate {
                    min_stock: Some(12),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            report.low_stock_items(Some(&admin)).await.unwrap()[0].item.id,
            item.id
        );
    }

    #[tokio::test]
    async fn edits_need_catalog_manage_and_valid_fields() {
        let service = service();
        let admin = Actor::admin(UserId::new());
        let employee = service
            .register_employee(
                Some(&admin),
                NewEmployee {
                    name: "Rita".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = service
            .update_employee(
                Some(&Actor::operator(UserId::new())),
                employee.id,
                EmployeeUpdate {
                    position: Some("Lead".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(p) if p == "catalog.manage"));

        let err = service
            .update_item(
                Some(&admin),
                ItemId::new(),
                ItemUpdate {
                    min_stock: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("min_stock"));

        let updated = service
            .update_employee(
                Some(&admin),
                employee.id,
                EmployeeUpdate {
                    position: Some("Lead".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.position, "Lead");
        assert_eq!(updated.name, "Rita");
    }

    #[tokio::test]
    async fn deactivating_unknown_employee_is_not_found() {
        let service = service();
        let admin = Actor::admin(UserId::new());
        assert!(matches!(
            service.deactivate_employee(Some(&admin), EmployeeId::new()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
