//! Embedded SQLite storage for the toolbox desktop app.
//!
//! `toolbox-storage` keeps a single local database file in line with the
//! table definitions compiled into the application, then exposes a small
//! CRUD surface over it:
//! - Tables are described in code ([`schema`], [`registry`]); the database
//!   is corrected to match them on every [`Storage::connect`].
//! - Missing tables are created, missing columns added, and tables whose
//!   columns drifted (changed type, removed column) rebuilt, keeping the data
//!   of the columns both shapes share.
//! - Statements are built from table/column names plus WHERE fragments with
//!   portable `?` placeholders ([`statement`]).
//!
//! # Architecture
//!
//! - **Schema** - [`TableDef`], [`ColumnDef`] and the four application tables
//! - **DDL** - `CREATE TABLE`, `ADD COLUMN` and rebuild statements
//! - **Reconcile** - decides and applies create / add / rebuild / nothing
//! - **Statement** - INSERT, UPDATE, SELECT, DELETE with placeholder checks
//! - **Storage** - the connection owner and the interface callers use
//! - **Stores** - options, shortcuts, activity history, capability catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use toolbox_storage::prelude::*;
//! use toolbox_storage::args;
//!
//! # async fn run() -> toolbox_storage::Result<()> {
//! let mut storage = Storage::new(StorageConfig::default());
//! storage.connect().await?;
//!
//! let inserted = storage
//!     .insert("star", &["capabilityID"], args![2])
//!     .await?;
//! let rows = storage
//!     .select("star", &["capabilityID"], Some("id = ?"), args![inserted.last_id])
//!     .await?;
//! assert_eq!(rows[0].get_i64("capabilityID"), Some(2));
//!
//! storage.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod catalog;
pub mod config;
pub mod ddl;
pub mod describe;
pub mod error;
pub mod options;
pub mod reconcile;
pub mod registry;
pub mod schema;
pub mod shortcut;
pub mod statement;
pub mod storage;
pub mod value;

pub use config::StorageConfig;
pub use error::{Result, StorageError};
pub use schema::{ColumnDef, ColumnType, TableDef};
pub use storage::{InsertResult, Storage};
pub use value::{Row, SqlValue};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::activity::ActivityKind;
    pub use crate::catalog::{Capability, Catalog, Category};
    pub use crate::config::StorageConfig;
    pub use crate::error::{Result, StorageError};
    pub use crate::options::{OptionRecord, OptionsStore};
    pub use crate::reconcile::{ReconcileReport, SchemaAction};
    pub use crate::schema::{ColumnDef, ColumnType, LiveColumn, TableDef};
    pub use crate::shortcut::{ShortcutRecord, ShortcutStore};
    pub use crate::storage::{InsertResult, Storage};
    pub use crate::value::{Row, SqlValue, ToSqlValue};
}
