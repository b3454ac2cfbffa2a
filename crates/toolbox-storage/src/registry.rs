//! The application's tables.
//!
//! These definitions are the source of truth for the on-disk layout; every
//! `connect()` reconciles the database against them.

use crate::schema::{ColumnDef, TableDef};

/// Default expression for creation/update timestamps.
pub const LOCAL_NOW: &str = "datetime('now', 'localtime')";

/// Capability usage log, feeds the "recently used" list.
pub const RECENTLY: &str = "recently";
/// Starred capabilities.
pub const STAR: &str = "star";
/// Keyboard shortcuts bound to capabilities.
pub const SHORTCUT: &str = "shortcut";
/// User options; `capabilityID = 0` holds general settings.
pub const OPTIONS: &str = "options";

fn id_column() -> ColumnDef {
    ColumnDef::integer("id")
        .primary_key()
        .auto_increment()
        .not_null()
}

fn timestamp_column(name: &str) -> ColumnDef {
    ColumnDef::text(name).default_expr(LOCAL_NOW)
}

/// `recently(id, capabilityID, createTime)`.
#[must_use]
pub fn recently() -> TableDef {
    TableDef::new(
        RECENTLY,
        vec![
            id_column(),
            ColumnDef::integer("capabilityID").not_null(),
            timestamp_column("createTime"),
        ],
    )
}

/// `star(id, capabilityID, createTime)`.
#[must_use]
pub fn star() -> TableDef {
    TableDef::new(
        STAR,
        vec![
            id_column(),
            ColumnDef::integer("capabilityID").not_null(),
            timestamp_column("createTime"),
        ],
    )
}

/// `shortcut(id, capabilityID UNIQUE, key UNIQUE, createTime)`.
#[must_use]
pub fn shortcut() -> TableDef {
    TableDef::new(
        SHORTCUT,
        vec![
            id_column(),
            ColumnDef::integer("capabilityID").not_null().unique(),
            ColumnDef::text("key").not_null().unique(),
            timestamp_column("createTime"),
        ],
    )
}

/// `options(id, capabilityID, key UNIQUE, val, remake, lastTime)`.
#[must_use]
pub fn options() -> TableDef {
    TableDef::new(
        OPTIONS,
        vec![
            id_column(),
            ColumnDef::integer("capabilityID").not_null(),
            ColumnDef::text("key").not_null().unique(),
            ColumnDef::text("val").not_null(),
            ColumnDef::text("remake"),
            timestamp_column("lastTime"),
        ],
    )
}

/// All application tables, in reconciliation order.
#[must_use]
pub fn app_tables() -> Vec<TableDef> {
    vec![recently(), star(), shortcut(), options()]
}
