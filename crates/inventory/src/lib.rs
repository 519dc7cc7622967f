//! Inventory domain module: movement ledger records, stock aggregation and
//! catalog records.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod employee;
pub mod item;
pub mod movement;
pub mod photo;
pub mod stock;
pub mod truck;

pub use employee::{Employee, EmployeePatch, EmployeeUpdate, NewEmployee};
pub use item::{Item, ItemPatch, ItemUpdate, NewItem};
pub use movement::{Movement, MovementKind, MovementRequest, NewMovement, Quantity, TruckRef};
pub use photo::DEFAULT_MAX_PHOTO_BYTES;
pub use stock::{
    StockLevel, StockStatus, classify_status, compute_item_stock, compute_stock, ensure_available,
    needs_restock,
};
pub use truck::{NewTruck, Truck};

/// Trim free text; blank or absent becomes `None`.
pub(crate) fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
