//! Infrastructure layer: storage seams and adapters, plus the services that
//! orchestrate them (movement recording, catalog management, stock reports).

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod recorder;
pub mod snapshot;
pub mod stock_report;

pub use catalog::{CatalogError, CatalogService, EmployeeDirectory, InMemoryCatalog, ItemCatalog, TruckRegistry};
pub use config::RecorderConfig;
pub use error::ServiceError;
pub use ledger::{InMemoryLedger, LedgerError, LedgerSnapshot, MovementFilter, MovementLedger};
#[cfg(feature = "postgres")]
pub use ledger::PostgresLedger;
pub use recorder::{CacheRefresh, MovementRecorder, RecordedMovement};
pub use snapshot::{SnapshotError, SnapshotStore, StoreLock, StoreSnapshot};
pub use stock_report::{ItemStock, StockReport, StockSummary};
