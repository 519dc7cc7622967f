use std::fmt::Display;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{EmployeeId, Entity, ItemId, TruckId};
use stockroom_inventory::{Employee, EmployeePatch, Item, ItemPatch, Truck};

use super::r#trait::{CatalogError, EmployeeDirectory, ItemCatalog, TruckRegistry};

/// One collection of records, kept in registration order.
#[derive(Debug)]
struct Records<T> {
    kind: &'static str,
    rows: RwLock<Vec<T>>,
}

impl<T> Records<T>
where
    T: Entity + Clone,
    T::Id: Display,
{
    fn new(kind: &'static str, rows: Vec<T>) -> Self {
        Self {
            kind,
            rows: RwLock::new(rows),
        }
    }

    fn poisoned(&self) -> CatalogError {
        CatalogError::Unavailable(format!("{} lock poisoned", self.kind))
    }

    /// Insert, or replace the record with the same id.
    fn upsert(&self, record: T) -> Result<T, CatalogError> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        match rows.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => rows.push(record.clone()),
        }
        Ok(record)
    }

    fn get(&self, id: &T::Id) -> Result<Option<T>, CatalogError> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.iter().find(|r| r.id() == id).cloned())
    }

    fn list_active(&self) -> Result<Vec<T>, CatalogError> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.iter().filter(|r| r.is_active()).cloned().collect())
    }

    fn update(&self, id: &T::Id, apply: impl FnOnce(&mut T)) -> Result<T, CatalogError> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| CatalogError::not_found(self.kind, id))?;
        apply(row);
        Ok(row.clone())
    }

    fn all(&self) -> Result<Vec<T>, CatalogError> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.clone())
    }
}

/// In-memory catalog for tests/dev and the CLI's snapshot files.
///
/// Implements all three catalog seams over one set of collections.
#[derive(Debug)]
pub struct InMemoryCatalog {
    items: Records<Item>,
    trucks: Records<Truck>,
    employees: Records<Employee>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::from_records(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn from_records(items: Vec<Item>, trucks: Vec<Truck>, employees: Vec<Employee>) -> Self {
        Self {
            items: Records::new("item", items),
            trucks: Records::new("truck", trucks),
            employees: Records::new("employee", employees),
        }
    }

    /// Every stored item, active or not.
    pub fn export_items(&self) -> Result<Vec<Item>, CatalogError> {
        self.items.all()
    }

    pub fn export_trucks(&self) -> Result<Vec<Truck>, CatalogError> {
        self.trucks.all()
    }

    pub fn export_employees(&self) -> Result<Vec<Employee>, CatalogError> {
        self.employees.all()
    }
}

#[async_trait]
impl ItemCatalog for InMemoryCatalog {
    async fn create_item(&self, item: Item) -> Result<Item, CatalogError> {
        self.items.upsert(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        self.items.get(&id)
    }

    async fn list_active_items(&self) -> Result<Vec<Item>, CatalogError> {
        self.items.list_active()
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CatalogError> {
        self.items.update(&id, |item| patch.apply(item))
    }

    async fn update_cached_stock(
        &self,
        id: ItemId,
        current_stock: i64,
        at: DateTime<Utc>,
    ) -> Result<Item, CatalogError> {
        self.items.update(&id, |item| item.cache_stock(current_stock, at))
    }

    async fn deactivate_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.items.update(&id, |item| item.is_active = false)
    }
}

#[async_trait]
impl TruckRegistry for InMemoryCatalog {
    async fn create_truck(&self, truck: Truck) -> Result<Truck, CatalogError> {
        self.trucks.upsert(truck)
    }

    async fn get_truck(&self, id: TruckId) -> Result<Option<Truck>, CatalogError> {
        self.trucks.get(&id)
    }

    async fn list_active_trucks(&self) -> Result<Vec<Truck>, CatalogError> {
        self.trucks.list_active()
    }

    async fn deactivate_truck(&self, id: TruckId) -> Result<Truck, CatalogError> {
        self.trucks.update(&id, |truck| truck.is_active = false)
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryCatalog {
    async fn create_employee(&self, employee: Employee) -> Result<Employee, CatalogError> {
        self.employees.upsert(employee)
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, CatalogError> {
        self.employees.get(&id)
    }

    async fn list_active_employees(&self) -> Result<Vec<Employee>, CatalogError> {
        self.employees.list_active()
    }

    async fn update_employee(&self, id: EmployeeId, patch: EmployeePatch) -> Result<Employee, CatalogError> {
        self.employees.update(&id, |employee| patch.apply(employee))
    }

    async fn deactivate_employee(&self, id: EmployeeId) -> Result<Employee, CatalogError> {
        self.employees.update(&id, |employee| employee.is_active = false)
    }
}
