//! Read-only stock views.

use stockroom_core::{ItemId, MovementId};
use stockroom_infra::{ItemStock, MovementFilter};
use stockroom_inventory::Movement;

use crate::context::Context;

pub async fn show(ctx: &Context, item: Option<ItemId>) -> anyhow::Result<()> {
    let stocks = match item {
        Some(id) => vec![ctx.report.item_stock(ctx.actor(), id).await?],
        None => ctx.report.items_with_stock(ctx.actor()).await?,
    };
    ctx.emit(&stocks, |s| stock_table(s))
}

pub async fn low_stock(ctx: &Context) -> anyhow::Result<()> {
    let stocks = ctx.report.low_stock_items(ctx.actor()).await?;
    ctx.emit(&stocks, |s| {
        if s.is_empty() {
            "no items need restocking".to_string()
        } else {
            stock_table(s)
        }
    })
}

pub async fn summary(ctx: &Context) -> anyhow::Result<()> {
    let summary = ctx.report.summary(ctx.actor()).await?;
    ctx.emit(&summary, |s| {
        format!(
            "items: {}\nlow: {}\nattention: {}\nnormal: {}\nstale caches: {}",
            s.total_items, s.low, s.attention, s.normal, s.stale_caches
        )
    })
}

pub async fn history(ctx: &Context, item: Option<ItemId>, all: bool) -> anyhow::Result<()> {
    let mut filter = MovementFilter {
        item_id: item,
        ..MovementFilter::active()
    };
    if all {
        filter = filter.including_inactive();
    }
    let movements = ctx.report.movements(ctx.actor(), filter).await?;
    ctx.emit(&movements, |ms| {
        ms.iter().map(movement_line).collect::<Vec<_>>().join("\n")
    })
}

pub async fn show_movement(ctx: &Context, id: MovementId) -> anyhow::Result<()> {
    let movement = ctx.report.movement(ctx.actor(), id).await?;
    ctx.emit(&movement, movement_line)
}

fn stock_table(stocks: &[ItemStock]) -> String {
    let mut out = format!("{:<36}  {:<24} {:>8} {:>8}  {}", "ID", "NAME", "STOCK", "MIN", "STATUS");
    for s in stocks {
        out.push_str(&format!(
            "\n{:<36}  {:<24} {:>8} {:>8}  {}{}",
            s.item.id,
            s.item.name,
            s.level.current,
            s.level.min_stock,
            s.level.status,
            if s.cache_is_stale { " (cache stale)" } else { "" }
        ));
    }
    out
}

pub(crate) fn movement_line(m: &Movement) -> String {
    let truck = m
        .truck_plate
        .as_deref()
        .map(|p| format!(" truck {p}"))
        .unwrap_or_default();
    format!(
        "{} {} {:<5} {:>6} {}{} by {}{}",
        m.occurred_at.format("%Y-%m-%d %H:%M"),
        m.id,
        m.kind,
        m.quantity.get(),
        m.item_name,
        truck,
        m.responsible,
        if m.is_active { "" } else { " [inactive]" }
    )
}
