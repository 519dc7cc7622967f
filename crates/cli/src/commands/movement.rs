//! Ledger writes.

use anyhow::Context as _;

use stockroom_auth::{Permission, require};
use stockroom_core::{ItemId, MovementId};
use stockroom_infra::{ItemCatalog, RecordedMovement, ServiceError, TruckRegistry};
use stockroom_inventory::MovementRequest;

use crate::RecordArgs;
use crate::commands::stock::movement_line;
use crate::context::Context;

pub async fn record(ctx: &Context, args: RecordArgs) -> anyhow::Result<()> {
    // Authenticate before touching the catalog.
    require(ctx.actor(), &Permission::MOVEMENTS_RECORD).map_err(ServiceError::from)?;

    let catalog = ctx.catalog.catalog();
    let item = catalog
        .get_item(args.item)
        .await?
        .with_context(|| format!("item {} not found", args.item))?;
    let truck_plate = match args.truck {
        Some(id) => catalog.get_truck(id).await?.map(|t| t.plate),
        None => None,
    };

    let request = MovementRequest {
        kind: args.kind,
        item_id: Some(item.id),
        item_name: item.name,
        quantity: args.quantity,
        truck_id: args.truck,
        truck_plate,
        responsible: args.responsible,
        notes: args.notes,
        photo_ref: args.photo_ref,
    };

    let recorded = ctx.recorder.record_movement(ctx.actor(), request).await?;
    ctx.save()?;
    ctx.emit(&recorded, recorded_text)
}

pub async fn deactivate(ctx: &Context, id: MovementId) -> anyhow::Result<()> {
    let recorded = ctx.recorder.deactivate_movement(ctx.actor(), id).await?;
    ctx.save()?;
    ctx.emit(&recorded, recorded_text)
}

pub async fn refresh(ctx: &Context, item: ItemId) -> anyhow::Result<()> {
    let current = ctx.recorder.refresh_item_stock(item).await?;
    ctx.save()?;
    ctx.emit(&current, |c| format!("item {item}: stock {c}"))
}

fn recorded_text(r: &RecordedMovement) -> String {
    let cache = match &r.cache {
        stockroom_infra::CacheRefresh::Refreshed { current_stock } => format!("stock now {current_stock}"),
        stockroom_infra::CacheRefresh::Stale { reason } => format!("stock cache stale: {reason}"),
    };
    format!("{}\n{cache}", movement_line(&r.movement))
}
