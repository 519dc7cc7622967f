//! Catalog records (items, trucks, employees) and their storage seams.

pub mod in_memory;
pub mod service;
pub mod r#trait;

pub use in_memory::InMemoryCatalog;
pub use service::CatalogService;
pub use r#trait::{CatalogError, EmployeeDirectory, ItemCatalog, TruckRegistry};
