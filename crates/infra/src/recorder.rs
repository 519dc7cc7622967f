//! Movement recording pipeline.
//!
//! ```text
//! MovementRequest
//!   ↓
//! 1. Authorize actor (movements.record)
//!   ↓
//! 2. Structural validation (fail fast, field by field)
//!   ↓
//! 3. Item must exist and be active
//!   ↓
//! 4. Exit: load ledger snapshot → compute stock → check availability
//!   ↓
//! 5. Conditional append (exit: expected = snapshot version)
//!      └─ version moved → back to 4, bounded by `max_conflict_retries`
//!   ↓
//! 6. Recompute item stock from the ledger → write catalog cache (best effort)
//! ```
//!
//! Failure before step 5 leaves no side effects. Failure in step 6 only
//! leaves the cache stale and is reported as `CacheRefresh::Stale`.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use stockroom_auth::{Actor, Permission, require};
use stockroom_core::{ExpectedVersion, ItemId, MovementId};
use stockroom_inventory::{Item, Movement, MovementKind, MovementRequest, NewMovement, ensure_available};

use crate::catalog::ItemCatalog;
use crate::config::RecorderConfig;
use crate::error::ServiceError;
use crate::ledger::{LedgerError, MovementLedger};

/// Outcome of the post-commit cache write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CacheRefresh {
    Refreshed { current_stock: i64 },
    Stale { reason: String },
}

impl CacheRefresh {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// A committed ledger write plus the state of the item's stock cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedMovement {
    pub movement: Movement,
    pub cache: CacheRefresh,
}

/// Validates and commits movements against a ledger, keeping the catalog's
/// stock cache in step.
#[derive(Debug)]
pub struct MovementRecorder<L, C> {
    ledger: L,
    catalog: C,
    config: RecorderConfig,
}

impl<L, C> MovementRecorder<L, C>
where
    L: MovementLedger,
    C: ItemCatalog,
{
    pub fn new(ledger: L, catalog: C) -> Self {
        Self::with_config(ledger, catalog, RecorderConfig::default())
    }

    pub fn with_config(ledger: L, catalog: C, config: RecorderConfig) -> Self {
        Self {
            ledger,
            catalog,
            config,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Validate and commit one movement.
    #[instrument(
        skip(self, actor, request),
        fields(kind = %request.kind, item_id = ?request.item_id, quantity = request.quantity),
        err
    )]
    pub async fn record_movement(
        &self,
        actor: Option<&Actor>,
        request: MovementRequest,
    ) -> Result<RecordedMovement, ServiceError> {
        let actor = require(actor, &Permission::MOVEMENTS_RECORD)?;
        let movement = request.validate(actor.user_id, self.config.max_photo_bytes)?;
        self.require_active_item(movement.item_id).await?;

        let movement = self.commit(movement).await?;
        info!(
            movement_id = %movement.id,
            item_id = %movement.item_id,
            kind = %movement.kind,
            quantity = movement.quantity.get(),
            created_by = %movement.created_by,
            "movement recorded"
        );

        let cache = self.refresh_cache(movement.item_id).await;
        Ok(RecordedMovement { movement, cache })
    }

    /// Soft-delete a movement (privileged). Already inactive records succeed
    /// unchanged.
    #[instrument(skip(self, actor), fields(movement_id = %id), err)]
    pub async fn deactivate_movement(
        &self,
        actor: Option<&Actor>,
        id: MovementId,
    ) -> Result<RecordedMovement, ServiceError> {
        let actor = require(actor, &Permission::MOVEMENTS_DEACTIVATE)?;
        let movement = self.ledger.deactivate_movement(id).await?;
        info!(
            movement_id = %movement.id,
            item_id = %movement.item_id,
            by = %actor.user_id,
            "movement deactivated"
        );

        let cache = self.refresh_cache(movement.item_id).await;
        Ok(RecordedMovement { movement, cache })
    }

    /// Full recompute of an item's stock from the ledger, written to the
    /// catalog cache. Returns the recomputed value.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn refresh_item_stock(&self, item_id: ItemId) -> Result<i64, ServiceError> {
        let snapshot = self.ledger.load_item(item_id).await?;
        let current_stock = snapshot.current_stock();
        self.catalog
            .update_cached_stock(item_id, current_stock, Utc::now())
            .await?;
        debug!(current_stock, version = snapshot.version, "stock cache refreshed");
        Ok(current_stock)
    }

    async fn require_active_item(&self, item_id: ItemId) -> Result<Item, ServiceError> {
        match self.catalog.get_item(item_id).await? {
            Some(item) if item.is_active => Ok(item),
            Some(_) => Err(ServiceError::Validation {
                field: "item_id",
                message: format!("item {item_id} is inactive"),
            }),
            None => Err(ServiceError::Validation {
                field: "item_id",
                message: format!("item {item_id} does not exist"),
            }),
        }
    }

    async fn commit(&self, movement: NewMovement) -> Result<Movement, ServiceError> {
        // Entries cannot break the non-negative invariant.
        if movement.kind != MovementKind::Exit {
            return Ok(self
                .ledger
                .append_movement(movement, ExpectedVersion::Any)
                .await?);
        }

        let requested = movement.quantity.as_i64();
        let mut retries = 0;
        loop {
            let snapshot = self.ledger.load_item(movement.item_id).await?;
            let available = snapshot.current_stock();
            ensure_available(available, requested)?;
            debug!(available, requested, version = snapshot.version, "exit fits current stock");

            match self
                .ledger
                .append_movement(movement.clone(), ExpectedVersion::Exact(snapshot.version))
                .await
            {
                Ok(stored) => return Ok(stored),
                Err(LedgerError::Concurrency(msg)) if retries < self.config.max_conflict_retries => {
                    retries += 1;
                    debug!(retries, reason = %msg, "ledger moved since snapshot; re-validating exit");
                }
                Err(LedgerError::Concurrency(msg)) => {
                    return Err(ServiceError::Conflict(format!(
                        "gave up after {retries} retries: {msg}"
                    )));
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Best-effort cache write after a commit. Concurrent commits may finish
    /// their refreshes out of order; the last write wins and may be older
    /// than the ledger, which `StockReport` flags as a stale cache.
    async fn refresh_cache(&self, item_id: ItemId) -> CacheRefresh {
        match self.refresh_item_stock(item_id).await {
            Ok(current_stock) => CacheRefresh::Refreshed { current_stock },
            Err(err) => {
                warn!(%item_id, error = %err, "stock cache refresh failed; cache left stale");
                CacheRefresh::Stale {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::DateTime;

    use stockroom_core::{TruckId, UserId};
    use stockroom_inventory::{DEFAULT_MAX_PHOTO_BYTES, ItemPatch, NewItem, Quantity};

    use super::*;
    use crate::catalog::{CatalogError, InMemoryCatalog};
    use crate::ledger::{InMemoryLedger, LedgerSnapshot, MovementFilter};

    type Recorder = MovementRecorder<Arc<InMemoryLedger>, Arc<InMemoryCatalog>>;

    fn operator() -> Actor {
        Actor::operator(UserId::new())
    }

    async fn seed_item(catalog: &InMemoryCatalog, min_stock: i64) -> Item {
        let item = NewItem {
            name: "Cement bag".to_string(),
            min_stock: Some(min_stock),
            ..Default::default()
        }
        .validate(UserId::new(), Utc::now(), DEFAULT_MAX_PHOTO_BYTES)
        .unwrap();
        catalog.create_item(item).await.unwrap()
    }

    fn entry(item_id: ItemId, quantity: i64) -> MovementRequest {
        MovementRequest {
            kind: MovementKind::Entry,
            item_id: Some(item_id),
            item_name: "Cement bag".to_string(),
            quantity,
            truck_id: None,
            truck_plate: None,
            responsible: "Ana".to_string(),
            notes: None,
            photo_ref: None,
        }
    }

    fn exit(item_id: ItemId, quantity: i64) -> MovementRequest {
        MovementRequest {
            kind: MovementKind::Exit,
            truck_id: Some(TruckId::new()),
            truck_plate: Some("ABC1234".to_string()),
            ..entry(item_id, quantity)
        }
    }

    async fn setup(initial: &[MovementRequest]) -> (Recorder, Item) {
        let ledger = Arc::new(InMemoryLedger::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let item = seed_item(&catalog, 0).await;
        let recorder = MovementRecorder::new(ledger, catalog);
        let actor = operator();
        for request in initial {
            let mut request = request.clone();
            request.item_id = Some(item.id);
            recorder.record_movement(Some(&actor), request).await.unwrap();
        }
        (recorder, item)
    }

    async fn ledger_len(recorder: &Recorder) -> usize {
        recorder
            .ledger()
            .list_movements(MovementFilter::active().including_inactive())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn exit_beyond_stock_is_rejected_without_append() {
        let (recorder, item) = setup(&[entry(ItemId::new(), 10)]).await;

        let err = recorder
            .record_movement(Some(&operator()), exit(item.id, 15))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                available: 10,
                requested: 15,
                shortfall: 5
            }
        ));
        assert_eq!(ledger_len(&recorder).await, 1);
    }

    #[tokio::test]
    async fn exit_may_empty_the_item() {
        let (recorder, item) = setup(&[entry(ItemId::new(), 10), exit(ItemId::new(), 3)]).await;

        let recorded = recorder
            .record_movement(Some(&operator()), exit(item.id, 7))
            .await
            .unwrap();

        assert_eq!(recorded.cache, CacheRefresh::Refreshed { current_stock: 0 });
        assert_eq!(recorder.ledger().load_item(item.id).await.unwrap().current_stock(), 0);
        let cached = recorder.catalog().get_item(item.id).await.unwrap().unwrap();
        assert_eq!(cached.current_stock, 0);
        assert!(cached.last_stock_update.is_some());
    }

    #[tokio::test]
    async fn deactivating_an_exit_restores_stock() {
        let (recorder, item) = setup(&[entry(ItemId::new(), 10)]).await;
        let recorded = recorder
            .record_movement(Some(&operator()), exit(item.id, 4))
            .await
            .unwrap();
        assert_eq!(recorded.cache, CacheRefresh::Refreshed { current_stock: 6 });

        let admin = Actor::admin(UserId::new());
        let undone = recorder
            .deactivate_movement(Some(&admin), recorded.movement.id)
            .await
            .unwrap();

        assert!(!undone.movement.is_active);
        assert_eq!(undone.cache, CacheRefresh::Refreshed { current_stock: 10 });

        // Second deactivation is a no-op success.
        let again = recorder
            .deactivate_movement(Some(&admin), recorded.movement.id)
            .await
            .unwrap();
        assert_eq!(again.cache, CacheRefresh::Refreshed { current_stock: 10 });
    }

    #[tokio::test]
    async fn operators_cannot_deactivate() {
        let (recorder, item) = setup(&[entry(ItemId::new(), 10)]).await;
        let movement = recorder
            .ledger()
            .list_active_movements(item.id)
            .await
            .unwrap()
            .remove(0);

        let err = recorder
            .deactivate_movement(Some(&operator()), movement.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(p) if p == "movements.deactivate"));
    }

    #[tokio::test]
    async fn exit_without_truck_fails_validation_before_any_write() {
        let (recorder, item) = setup(&[entry(ItemId::new(), 10)]).await;
        let mut request = exit(item.id, 1);
        request.truck_id = None;

        let err = recorder
            .record_movement(Some(&operator()), request)
            .await
            .unwrap_err();

        assert_eq!(err.field(), Some("truck_id"));
        assert_eq!(ledger_len(&recorder).await, 1);
    }

    #[tokio::test]
    async fn missing_actor_is_not_authenticated() {
        let (recorder, item) = setup(&[]).await;
        let err = recorder.record_movement(None, entry(item.id, 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthenticated));
        assert_eq!(ledger_len(&recorder).await, 0);
    }

    #[tokio::test]
    async fn actor_without_record_permission_is_unauthorized() {
        let (recorder, item) = setup(&[]).await;
        let guest = Actor::new(UserId::new(), vec![]);
        let err = recorder
            .record_movement(Some(&guest), entry(item.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_or_inactive_items_are_rejected() {
        let (recorder, item) = setup(&[]).await;

        let err = recorder
            .record_movement(Some(&operator()), entry(ItemId::new(), 1))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("item_id"));

        recorder.catalog().deactivate_item(item.id).await.unwrap();
        let err = recorder
            .record_movement(Some(&operator()), entry(item.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("item_id"));
        assert_eq!(ledger_len(&recorder).await, 0);
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let (recorder, item) = setup(&[]).await;
        for quantity in [0, -3] {
            let err = recorder
                .record_movement(Some(&operator()), entry(item.id, quantity))
                .await
                .unwrap_err();
            assert_eq!(err.field(), Some("quantity"));
        }
    }

    #[tokio::test]
    async fn oversized_photo_is_rejected() {
        let ledger = Arc::new(InMemoryLedger::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let item = seed_item(&catalog, 0).await;
        let config = RecorderConfig {
            max_photo_bytes: 8,
            ..RecorderConfig::default()
        };
        let recorder = MovementRecorder::with_config(ledger, catalog, config);

        let mut request = entry(item.id, 1);
        request.photo_ref = Some("data:image/jpeg;base64,AAAA".to_string());
        let err = recorder
            .record_movement(Some(&operator()), request)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("photo_ref"));
    }

    /// Catalog whose cache writes always fail.
    struct ReadOnlyCatalog(InMemoryCatalog);

    #[async_trait]
    impl ItemCatalog for ReadOnlyCatalog {
        async fn create_item(&self, item: Item) -> Result<Item, CatalogError> {
            self.0.create_item(item).await
        }

        async fn get_item(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
            self.0.get_item(id).await
        }

        async fn list_active_items(&self) -> Result<Vec<Item>, CatalogError> {
            self.0.list_active_items().await
        }

        async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, CatalogError> {
            self.0.update_item(id, patch).await
        }

        async fn update_cached_stock(
            &self,
            _id: ItemId,
            _current_stock: i64,
            _at: DateTime<Utc>,
        ) -> Result<Item, CatalogError> {
            Err(CatalogError::Unavailable("read-only replica".to_string()))
        }

        async fn deactivate_item(&self, id: ItemId) -> Result<Item, CatalogError> {
            self.0.deactivate_item(id).await
        }
    }

    #[tokio::test]
    async fn cache_failure_after_commit_is_reported_stale() {
        let inner = InMemoryCatalog::new();
        let item = seed_item(&inner, 0).await;
        let recorder = MovementRecorder::new(InMemoryLedger::new(), ReadOnlyCatalog(inner));

        let recorded = recorder
            .record_movement(Some(&operator()), entry(item.id, 5))
            .await
            .unwrap();

        assert!(recorded.cache.is_stale());
        assert!(recorded.movement.is_active);
        assert_eq!(recorder.ledger().load_item(item.id).await.unwrap().current_stock(), 5);
        assert!(matches!(
            recorder.refresh_item_stock(item.id).await,
            Err(ServiceError::Catalog(CatalogError::Unavailable(_)))
        ));
    }

    /// Ledger whose storage is down: appends always fail, and loads fail
    /// when `loads_fail` is set.
    struct FailingLedger {
        inner: InMemoryLedger,
        loads_fail: bool,
        appends: AtomicU32,
    }

    impl FailingLedger {
        fn new(loads_fail: bool) -> Self {
            Self {
                inner: InMemoryLedger::new(),
                loads_fail,
                appends: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MovementLedger for FailingLedger {
        async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError> {
            if self.loads_fail {
                return Err(LedgerError::Unavailable("connection refused".to_string()));
            }
            self.inner.load_item(item_id).await
        }

        async fn append_movement(
            &self,
            _movement: NewMovement,
            _expected: ExpectedVersion,
        ) -> Result<Movement, LedgerError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::Unavailable("connection refused".to_string()))
        }

        async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError> {
            self.inner.deactivate_movement(id).await
        }

        async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError> {
            self.inner.get_movement(id).await
        }

        async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError> {
            self.inner.list_movements(filter).await
        }
    }

    #[tokio::test]
    async fn storage_failure_on_append_is_not_retried() {
        let catalog = InMemoryCatalog::new();
        let item = seed_item(&catalog, 0).await;
        let recorder = MovementRecorder::new(FailingLedger::new(false), catalog);

        let err = recorder
            .record_movement(Some(&operator()), entry(item.id, 5))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Ledger(LedgerError::Unavailable(_))));
        assert_eq!(recorder.ledger().appends.load(Ordering::SeqCst), 1);

        // Exits retry only on version conflicts.
        recorder
            .ledger()
            .inner
            .append_movement(
                NewMovement {
                    item_id: item.id,
                    item_name: item.name.clone(),
                    kind: MovementKind::Entry,
                    quantity: Quantity::try_from(10u32).unwrap(),
                    truck: None,
                    responsible: "Ana".to_string(),
                    notes: None,
                    photo_ref: None,
                    created_by: UserId::new(),
                },
                ExpectedVersion::Any,
            )
            .await
            .unwrap();
        let err = recorder
            .record_movement(Some(&operator()), exit(item.id, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Ledger(LedgerError::Unavailable(_))));
        assert_eq!(recorder.ledger().appends.load(Ordering::SeqCst), 2);

        let cached = recorder.catalog().get_item(item.id).await.unwrap().unwrap();
        assert_eq!(cached.current_stock, 0);
        assert_eq!(cached.last_stock_update, None);
    }

    #[tokio::test]
    async fn storage_failure_while_checking_an_exit_writes_nothing() {
        let catalog = InMemoryCatalog::new();
        let item = seed_item(&catalog, 0).await;
        let recorder = MovementRecorder::new(FailingLedger::new(true), catalog);

        let err = recorder
            .record_movement(Some(&operator()), exit(item.id, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Ledger(LedgerError::Unavailable(_))));
        assert_eq!(recorder.ledger().appends.load(Ordering::SeqCst), 0);
        let cached = recorder.catalog().get_item(item.id).await.unwrap().unwrap();
        assert_eq!(cached.last_stock_update, None);
    }

    /// Ledger that lets a competing writer slip in between snapshot and
    /// append, a fixed number of times.
    struct RacingLedger {
        inner: InMemoryLedger,
        races_left: AtomicU32,
        competitor: NewMovement,
    }

    #[async_trait]
    impl MovementLedger for RacingLedger {
        async fn load_item(&self, item_id: ItemId) -> Result<LedgerSnapshot, LedgerError> {
            let snapshot = self.inner.load_item(item_id).await?;
            let race = self
                .races_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if race {
                self.inner
                    .append_movement(self.competitor.clone(), ExpectedVersion::Any)
                    .await?;
            }
            Ok(snapshot)
        }

        async fn append_movement(
            &self,
            movement: NewMovement,
            expected: ExpectedVersion,
        ) -> Result<Movement, LedgerError> {
            self.inner.append_movement(movement, expected).await
        }

        async fn deactivate_movement(&self, id: MovementId) -> Result<Movement, LedgerError> {
            self.inner.deactivate_movement(id).await
        }

        async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>, LedgerError> {
            self.inner.get_movement(id).await
        }

        async fn list_movements(&self, filter: MovementFilter) -> Result<Vec<Movement>, LedgerError> {
            self.inner.list_movements(filter).await
        }
    }

    async fn racing_recorder(
        stock: u32,
        competitor_kind: MovementKind,
        competitor_qty: u32,
        races: u32,
        config: RecorderConfig,
    ) -> (MovementRecorder<RacingLedger, InMemoryCatalog>, Item) {
        let catalog = InMemoryCatalog::new();
        let item = seed_item(&catalog, 0).await;
        let seed = |kind: MovementKind, qty: u32| NewMovement {
            item_id: item.id,
            item_name: item.name.clone(),
            kind,
            quantity: Quantity::try_from(qty).unwrap(),
            truck: None,
            responsible: "Competitor".to_string(),
            notes: None,
            photo_ref: None,
            created_by: UserId::new(),
        };

        let inner = InMemoryLedger::new();
        inner
            .append_movement(seed(MovementKind::Entry, stock), ExpectedVersion::Any)
            .await
            .unwrap();
        let ledger = RacingLedger {
            inner,
            races_left: AtomicU32::new(0),
            competitor: seed(competitor_kind, competitor_qty),
        };
        ledger.races_left.store(races, Ordering::SeqCst);
        (MovementRecorder::with_config(ledger, catalog, config), item)
    }

    #[tokio::test]
    async fn lost_race_is_revalidated_against_fresh_stock() {
        // Snapshot says 10; a competing exit of 8 commits first.
        let (recorder, item) =
            racing_recorder(10, MovementKind::Exit, 8, 1, RecorderConfig::default()).await;

        let err = recorder
            .record_movement(Some(&operator()), exit(item.id, 5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            }
        ));
        assert_eq!(recorder.ledger().load_item(item.id).await.unwrap().current_stock(), 2);
    }

    #[tokio::test]
    async fn lost_race_still_commits_when_stock_suffices() {
        let (recorder, item) =
            racing_recorder(10, MovementKind::Exit, 2, 1, RecorderConfig::default()).await;

        let recorded = recorder
            .record_movement(Some(&operator()), exit(item.id, 5))
            .await
            .unwrap();

        assert_eq!(recorded.cache, CacheRefresh::Refreshed { current_stock: 3 });
    }

    #[tokio::test]
    async fn exhausted_retries_fail_with_conflict() {
        let config = RecorderConfig {
            max_conflict_retries: 2,
            ..RecorderConfig::default()
        };
        let (recorder, item) = racing_recorder(10, MovementKind::Entry, 1, u32::MAX, config).await;

        let err = recorder
            .record_movement(Some(&operator()), exit(item.id, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        // Only the seed and the competitor's entries; our exit never landed.
        let history = recorder
            .ledger()
            .list_movements(MovementFilter::for_item(item.id))
            .await
            .unwrap();
        assert!(history.iter().all(|m| m.kind == MovementKind::Entry));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_exits_never_drive_stock_negative() {
        let ledger = Arc::new(InMemoryLedger::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let item = seed_item(&catalog, 0).await;
        let config = RecorderConfig {
            max_conflict_retries: 16,
            ..RecorderConfig::default()
        };
        let recorder = Arc::new(MovementRecorder::with_config(ledger, catalog, config));
        let actor = operator();
        recorder
            .record_movement(Some(&actor), entry(item.id, 10))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                let actor = actor.clone();
                tokio::spawn(async move { recorder.record_movement(Some(&actor), exit(item.id, 3)).await })
            })
            .collect();

        let mut committed = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => committed += 1,
                Err(ServiceError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(committed, 3);
        assert_eq!(recorder.ledger().load_item(item.id).await.unwrap().current_stock(), 1);
        assert_eq!(recorder.refresh_item_stock(item.id).await.unwrap(), 1);
    }
}
