//! Ledger-derived stock views.
//!
//! Every figure here is recomputed from the ledger. The catalog's cached
//! `current_stock` is only compared against it to flag stale caches.

use serde::Serialize;
use tracing::{debug, instrument};

use stockroom_auth::{Actor, Permission, require};
use stockroom_core::{ItemId, MovementId};
use stockroom_inventory::{Item, Movement, StockLevel, StockStatus};

use crate::catalog::ItemCatalog;
use crate::error::ServiceError;
use crate::ledger::{MovementFilter, MovementLedger};

/// One item with its ledger-derived stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStock {
    pub item: Item,
    pub level: StockLevel,
    /// The catalog cache disagrees with the ledger.
    pub cache_is_stale: bool,
}

impl ItemStock {
    fn new(item: Item, movements: &[Movement]) -> Self {
        let level = StockLevel::from_movements(item.id, item.min_stock(), movements);
        let cache_is_stale = item.current_stock != level.current;
        Self {
            item,
            level,
            cache_is_stale,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_items: usize,
    pub low: usize,
    pub attention: usize,
    pub normal: usize,
    pub stale_caches: usize,
}

impl StockSummary {
    fn tally<'a>(stocks: impl IntoIterator<Item = &'a ItemStock>) -> Self {
        stocks.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total_items += 1;
            match s.level.status {
                StockStatus::Low => acc.low += 1,
                StockStatus::Attention => acc.attention += 1,
                StockStatus::Normal => acc.normal += 1,
            }
            if s.cache_is_stale {
                acc.stale_caches += 1;
            }
            acc
        })
    }
}

/// Read side over the same ledger and catalog the recorder writes to.
#[derive(Debug)]
pub struct StockReport<L, C> {
    ledger: L,
    catalog: C,
}

impl<L, C> StockReport<L, C>
where
    L: MovementLedger,
    C: ItemCatalog,
{
    pub fn new(ledger: L, catalog: C) -> Self {
        Self { ledger, catalog }
    }

    /// Stock of one item (active or not).
    #[instrument(skip(self, actor), fields(item_id = %item_id), err)]
    pub async fn item_stock(
        &self,
        actor: Option<&Actor>,
        item_id: ItemId,
    ) -> Result<ItemStock, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        let item = self
            .catalog
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {item_id}")))?;
        self.with_stock(item).await
    }

    /// Every active item with its stock, by name.
    #[instrument(skip(self, actor), err)]
    pub async fn items_with_stock(&self, actor: Option<&Actor>) -> Result<Vec<ItemStock>, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        let mut items = self.catalog.list_active_items().await?;
        items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.with_stock(item).await?);
        }
        debug!(items = out.len(), "stock report built");
        Ok(out)
    }

    /// Active items that need restocking, lowest stock first.
    pub async fn low_stock_items(&self, actor: Option<&Actor>) -> Result<Vec<ItemStock>, ServiceError> {
        let mut low: Vec<_> = self
            .items_with_stock(actor)
            .await?
            .into_iter()
            .filter(|s| s.level.needs_restock)
            .collect();
        low.sort_by_key(|s| s.level.current);
        Ok(low)
    }

    pub async fn summary(&self, actor: Option<&Actor>) -> Result<StockSummary, ServiceError> {
        Ok(StockSummary::tally(&self.items_with_stock(actor).await?))
    }

    /// Movement history, newest first.
    pub async fn movements(
        &self,
        actor: Option<&Actor>,
        filter: MovementFilter,
    ) -> Result<Vec<Movement>, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        Ok(self.ledger.list_movements(filter).await?)
    }

    /// One movement by id, including deactivated ones.
    pub async fn movement(&self, actor: Option<&Actor>, id: MovementId) -> Result<Movement, ServiceError> {
        require(actor, &Permission::STOCK_READ)?;
        self.ledger
            .get_movement(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("movement {id}")))
    }

    async fn with_stock(&self, item: Item) -> Result<ItemStock, ServiceError> {
        let snapshot = self.ledger.load_item(item.id).await?;
        Ok(ItemStock::new(item, &snapshot.movements))
    }
}
