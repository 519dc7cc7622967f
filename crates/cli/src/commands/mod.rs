//! Command handlers. Each one maps to a subcommand in `main.rs`.

pub mod catalog;
pub mod movement;
pub mod stock;
