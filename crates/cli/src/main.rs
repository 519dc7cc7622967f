//! Stockroom CLI - record stock movements and read stock reports against a
//! JSON snapshot store.
//!
//! # Usage
//!
//! ```bash
//! # Register an item (admin)
//! stockroom --user <UUID> --role admin register item -n "Cement bag" --min-stock 10
//!
//! # Record an entry / an exit
//! stockroom --user <UUID> record entry -i <ITEM> -q 20 -r "Ana"
//! stockroom --user <UUID> record exit -i <ITEM> -q 5 -r "Ana" -t <TRUCK>
//!
//! # Raise an item's restock threshold (admin)
//! stockroom --user <UUID> --role admin edit item <ITEM> --min-stock 25
//!
//! # Reports
//! stockroom --user <UUID> stock
//! stockroom --user <UUID> low-stock --json
//! ```
//!
//! # Environment Variables
//!
//! - `STOCKROOM_STORE` - snapshot file (default `stockroom.json`)
//! - `STOCKROOM_USER` / `STOCKROOM_ROLE` - acting account
//! - `STOCKROOM_MAX_CONFLICT_RETRIES`, `STOCKROOM_MAX_PHOTO_BYTES` - recorder limits
//! - `RUST_LOG` - log filter (default `info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use stockroom_core::{EmployeeId, ItemId, MovementId, TruckId, UserId};
use stockroom_inventory::MovementKind;
use stockroom_observability::{LogConfig, LogFormat};

mod commands;
mod context;

use context::Context;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stock ledger tools")]
struct Cli {
    /// Snapshot file holding items, trucks, employees and movements
    #[arg(long, env = "STOCKROOM_STORE", default_value = "stockroom.json", global = true)]
    store: PathBuf,

    /// Acting user id; omit to act signed out
    #[arg(long, env = "STOCKROOM_USER", global = true)]
    user: Option<UserId>,

    /// Acting role (`admin`, `operator`)
    #[arg(long, env = "STOCKROOM_ROLE", default_value = "operator", global = true)]
    role: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log format (`json`, `pretty`)
    #[arg(long, default_value = "json", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stock of every active item, or of one item
    Stock {
        #[arg(short, long)]
        item: Option<ItemId>,
    },
    /// Items at or below their restock threshold
    LowStock,
    /// Item counts per stock status
    Summary,
    /// Record a stock movement
    Record(RecordArgs),
    /// Soft-delete a movement (admin)
    Deactivate { movement: MovementId },
    /// Movement history, newest first
    History {
        #[arg(short, long)]
        item: Option<ItemId>,

        /// Include deactivated movements
        #[arg(long)]
        all: bool,
    },
    /// Show one movement
    Show { movement: MovementId },
    /// Recompute an item's cached stock from the ledger
    Refresh { item: ItemId },
    /// Register catalog records (admin)
    Register {
        #[command(subcommand)]
        record: RegisterTarget,
    },
    /// Edit catalog records (admin)
    Edit {
        #[command(subcommand)]
        record: EditTarget,
    },
    /// Deactivate catalog records (admin)
    Retire {
        #[command(subcommand)]
        record: RetireTarget,
    },
    /// Active trucks
    Trucks,
    /// Active employees
    Employees,
}

#[derive(Args)]
struct RecordArgs {
    /// `entry` or `exit`
    kind: MovementKind,

    #[arg(short, long)]
    item: ItemId,

    #[arg(short, long)]
    quantity: i64,

    /// Person responsible for the movement
    #[arg(short, long)]
    responsible: String,

    /// Truck carrying an exit
    #[arg(short, long)]
    truck: Option<TruckId>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    photo_ref: Option<String>,
}

#[derive(Subcommand)]
enum RegisterTarget {
    Item {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        min_stock: Option<i64>,

        #[arg(long)]
        photo_ref: Option<String>,
    },
    Truck {
        #[arg(short, long)]
        plate: String,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        year: Option<u16>,

        #[arg(long)]
        capacity: Option<String>,
    },
    Employee {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        position: Option<String>,
    },
}

#[derive(Subcommand)]
enum EditTarget {
    Item {
        id: ItemId,

        #[arg(short, long)]
        name: Option<String>,

        /// Empty string clears it
        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        min_stock: Option<i64>,

        /// Empty string clears it
        #[arg(long)]
        photo_ref: Option<String>,
    },
    Employee {
        id: EmployeeId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        position: Option<String>,
    },
}

#[derive(Subcommand)]
enum RetireTarget {
    Item { id: ItemId },
    Truck { id: TruckId },
    Employee { id: EmployeeId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    stockroom_observability::tracing::init(LogConfig {
        format: cli.log_format,
        ..LogConfig::default()
    });

    if let Err(e) = run(cli).await {
        tracing::error!("command failed: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::open(&cli.store, cli.user, &cli.role, cli.json)?;

    match cli.command {
        Commands::Stock { item } => commands::stock::show(&ctx, item).await?,
        Commands::LowStock => commands::stock::low_stock(&ctx).await?,
        Commands::Summary => commands::stock::summary(&ctx).await?,
        Commands::History { item, all } => commands::stock::history(&ctx, item, all).await?,
        Commands::Show { movement } => commands::stock::show_movement(&ctx, movement).await?,
        Commands::Record(args) => commands::movement::record(&ctx, args).await?,
        Commands::Deactivate { movement } => commands::movement::deactivate(&ctx, movement).await?,
        Commands::Refresh { item } => commands::movement::refresh(&ctx, item).await?,
        Commands::Register { record } => commands::catalog::register(&ctx, record).await?,
        Commands::Edit { record } => commands::catalog::edit(&ctx, record).await?,
        Commands::Retire { record } => commands::catalog::retire(&ctx, record).await?,
        Commands::Trucks => commands::catalog::trucks(&ctx).await?,
        Commands::Employees => commands::catalog::employees(&ctx).await?,
    }
    Ok(())
}
