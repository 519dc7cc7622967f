//! Catalog registration, edits and listings.

use stockroom_inventory::{EmployeeUpdate, ItemUpdate, NewEmployee, NewItem, NewTruck};

use crate::context::Context;
use crate::{EditTarget, RegisterTarget, RetireTarget};

pub async fn register(ctx: &Context, target: RegisterTarget) -> anyhow::Result<()> {
    match target {
        RegisterTarget::Item {
            name,
            description,
            min_stock,
            photo_ref,
        } => {
            let item = ctx
                .catalog
                .register_item(
                    ctx.actor(),
                    NewItem {
                        name,
                        description,
                        photo_ref,
                        min_stock,
                    },
                )
                .await?;
            ctx.save()?;
            ctx.emit(&item, |i| format!("item {} registered: {}", i.id, i.name))
        }
        RegisterTarget::Truck {
            plate,
            model,
            brand,
            year,
            capacity,
        } => {
            let truck = ctx
                .catalog
                .register_truck(
                    ctx.actor(),
                    NewTruck {
                        plate,
                        model,
                        brand,
                        year,
                        capacity,
                        photo_ref: None,
                    },
                )
                .await?;
            ctx.save()?;
            ctx.emit(&truck, |t| format!("truck {} registered: {}", t.id, t.plate))
        }
        RegisterTarget::Employee {
            name,
            email,
            department,
            position,
        } => {
            let employee = ctx
                .catalog
                .register_employee(
                    ctx.actor(),
                    NewEmployee {
                        name,
                        email,
                        department,
                        position,
                    },
                )
                .await?;
            ctx.save()?;
            ctx.emit(&employee, |e| format!("employee {} registered: {}", e.id, e.name))
        }
    }
}

pub async fn edit(ctx: &Context, target: EditTarget) -> anyhow::Result<()> {
    match target {
        EditTarget::Item {
            id,
            name,
            description,
            min_stock,
            photo_ref,
        } => {
            let update = ItemUpdate {
                name,
                description,
                photo_ref,
                min_stock,
            };
            anyhow::ensure!(update != ItemUpdate::default(), "nothing to change for item {id}");
            let item = ctx.catalog.update_item(ctx.actor(), id, update).await?;
            ctx.save()?;
            ctx.emit(&item, |i| format!("item {} updated: {} (min stock {})", i.id, i.name, i.min_stock))
        }
        EditTarget::Employee {
            id,
            name,
            email,
            department,
            position,
        } => {
            let update = EmployeeUpdate {
                name,
                email,
                department,
                position,
            };
            anyhow::ensure!(update != EmployeeUpdate::default(), "nothing to change for employee {id}");
            let employee = ctx.catalog.update_employee(ctx.actor(), id, update).await?;
            ctx.save()?;
            ctx.emit(&employee, |e| format!("employee {} updated: {}", e.id, e.name))
        }
    }
}

pub async fn retire(ctx: &Context, target: RetireTarget) -> anyhow::Result<()> {
    let message = match target {
        RetireTarget::Item { id } => {
            let item = ctx.catalog.deactivate_item(ctx.actor(), id).await?;
            format!("item {} deactivated", item.id)
        }
        RetireTarget::Truck { id } => {
            let truck = ctx.catalog.deactivate_truck(ctx.actor(), id).await?;
            format!("truck {} deactivated", truck.plate)
        }
        RetireTarget::Employee { id } => {
            let employee = ctx.catalog.deactivate_employee(ctx.actor(), id).await?;
            format!("employee {} deactivated", employee.name)
        }
    };
    ctx.save()?;
    ctx.emit(&message, |m| m.clone())
}

pub async fn trucks(ctx: &Context) -> anyhow::Result<()> {
    let trucks = ctx.catalog.active_trucks(ctx.actor()).await?;
    ctx.emit(&trucks, |ts| {
        ts.iter()
            .map(|t| format!("{}  {:<10} {} {}", t.id, t.plate, t.brand, t.model))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn employees(ctx: &Context) -> anyhow::Result<()> {
    let employees = ctx.catalog.active_employees(ctx.actor()).await?;
    ctx.emit(&employees, |es| {
        es.iter()
            .map(|e| format!("{}  {} ({} / {})", e.id, e.name, e.department, e.position))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
