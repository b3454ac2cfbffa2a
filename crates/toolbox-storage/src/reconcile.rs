//! Startup schema reconciliation.
//!
//! Compares a [`TableDef`] with the live table and applies the smallest
//! correction that makes them agree:
//!
//! - **Create** when the table does not exist.
//! - **Add columns** when the only difference is columns missing from the
//!   live table. Never touches existing data.
//! - **Rebuild** when a live column has a different declared type or the
//!   live table has a column the definition no longer lists. The table is
//!   recreated in its target shape and the common columns are copied over;
//!   data in dropped columns is lost.
//! - **Unchanged** otherwise.
//!
//! Deciding ([`plan`]) is separate from applying ([`reconcile`]) so the policy
//! can be exercised without a database.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info, warn};

use crate::ddl;
use crate::error::Result;
use crate::schema::{ColumnDef, LiveColumn, TableDef};

/// Why a table has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RebuildReason {
    /// A column's live declared type differs from the definition.
    TypeMismatch {
        /// Column name.
        column: String,
        /// Type in the definition.
        expected: String,
        /// Type reported by the database.
        found: String,
    },
    /// The live table has a column the definition does not list.
    ExtraColumn(String),
}

/// The corrective action for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SchemaAction {
    /// The table does not exist yet.
    Create,
    /// Columns are missing from the live table.
    AddColumns {
        /// Columns that will be added, in definition order.
        add: Vec<ColumnDef>,
        /// `NOT NULL` columns without a default; left out.
        skipped: Vec<ColumnDef>,
    },
    /// The table must be recreated and its rows copied.
    Rebuild {
        /// What triggered the rebuild.
        reason: RebuildReason,
        /// Columns present in both shapes, in definition order.
        common: Vec<String>,
        /// Live columns that will not survive.
        dropped: Vec<String>,
    },
    /// The live table already conforms.
    Unchanged,
}

/// Outcome of reconciling one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Table name.
    pub table: String,
    /// The action that was decided on.
    pub action: SchemaAction,
    /// Every statement executed, in order.
    pub statements: Vec<String>,
}

impl ReconcileReport {
    /// Names of columns that could not be added safely.
    #[must_use]
    pub fn skipped(&self) -> Vec<&str> {
        match &self.action {
            SchemaAction::AddColumns { skipped, .. } => {
                skipped.iter().map(|c| c.name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// One-word summary of the action, for display.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self.action {
            SchemaAction::Create => "created",
            SchemaAction::AddColumns { .. } => "altered",
            SchemaAction::Rebuild { .. } => "rebuilt",
            SchemaAction::Unchanged => "unchanged",
        }
    }
}

/// Decides what to do with `table` given its live columns.
///
/// `live` is `None` when the table does not exist. Type comparison is on
/// the declared name (case-insensitive); the first mismatching column
/// short-circuits to a rebuild, and a rebuild supersedes any missing columns.
#[must_use]
pub fn plan(table: &TableDef, live: Option<&[LiveColumn]>) -> SchemaAction {
    let Some(live) = live else {
        return SchemaAction::Create;
    };

    let live_types: HashMap<&str, &str> = live
        .iter()
        .map(|c| (c.name.as_str(), c.declared_type.as_str()))
        .collect();

    let mut missing = Vec::new();
    let mut reason = None;

    for column in &table.columns {
        match live_types.get(column.name.as_str()) {
            None => missing.push(column.clone()),
            Some(found) if !column.column_type.matches_declared(found) => {
                reason = Some(RebuildReason::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.column_type.sql_name().to_string(),
                    found: (*found).to_string(),
                });
                break;
            }
            Some(_) => {}
        }
    }

    if reason.is_none() {
        reason = live
            .iter()
            .find(|c| !table.has_column(&c.name))
            .map(|c| RebuildReason::ExtraColumn(c.name.clone()));
    }

    if let Some(reason) = reason {
        let (common, dropped) = split_columns(table, live);
        return SchemaAction::Rebuild {
            reason,
            common,
            dropped,
        };
    }

    if missing.is_empty() {
        return SchemaAction::Unchanged;
    }

    let (skipped, add): (Vec<_>, Vec<_>) = missing.into_iter().partition(ColumnDef::is_unsafe_to_add);
    SchemaAction::AddColumns { add, skipped }
}

/// Splits into (columns kept, in definition order; live columns dropped).
fn split_columns(table: &TableDef, live: &[LiveColumn]) -> (Vec<String>, Vec<String>) {
    let live_names: HashSet<&str> = live.iter().map(|c| c.name.as_str()).collect();

    let common = table
        .columns
        .iter()
        .filter(|c| live_names.contains(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();
    let dropped = live
        .iter()
        .filter(|c| !table.has_column(&c.name))
        .map(|c| c.name.clone())
        .collect();

    (common, dropped)
}

/// Returns whether a table exists.
pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let row: Option<(String,)> = sqlx::query_as(ddl::TABLE_EXISTS_SQL)
        .bind(table)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Reads a table's live columns, types uppercased.
pub async fn live_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<LiveColumn>> {
    let rows: Vec<(String, String)> = sqlx::query_as(ddl::TABLE_COLUMNS_SQL)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(name, declared)| LiveColumn::new(name, declared))
        .collect())
}

async fn execute(conn: &mut SqliteConnection, sql: String, log: &mut Vec<String>) -> Result<()> {
    debug!(sql = %sql, "Executing SQL");
    sqlx::query(&sql).execute(&mut *conn).await?;
    log.push(sql);
    Ok(())
}

/// Brings one table in line with its definition.
pub async fn reconcile(conn: &mut SqliteConnection, table: &TableDef) -> Result<ReconcileReport> {
    let live = if table_exists(conn, &table.name).await? {
        Some(live_columns(conn, &table.name).await?)
    } else {
        None
    };

    let action = plan(table, live.as_deref());
    let mut statements = Vec::new();

    match &action {
        SchemaAction::Create => {
            execute(conn, ddl::create_table_sql(table), &mut statements).await?;
            info!(table = %table.name, "Created missing table");
        }

        SchemaAction::AddColumns { add, skipped } => {
            for column in skipped {
                warn!(
                    table = %table.name,
                    column = %column.name,
                    "Cannot add NOT NULL column without a default; supply a default or rebuild"
                );
            }
            for column in add {
                execute(conn, ddl::add_column_sql(&table.name, column), &mut statements).await?;
                info!(table = %table.name, column = %column.name, "Added column");
            }
        }

        SchemaAction::Rebuild {
            reason, dropped, ..
        } => {
            warn!(
                table = %table.name,
                reason = ?reason,
                dropped = ?dropped,
                "Schema drift requires rebuilding table; data in dropped columns will be lost"
            );
            statements = rebuild_table(conn, table).await?;
            info!(table = %table.name, "Rebuilt table to match its definition");
        }

        SchemaAction::Unchanged => {
            debug!(table = %table.name, "Table already conforms");
        }
    }

    Ok(ReconcileReport {
        table: table.name.clone(),
        action,
        statements,
    })
}

/// Recreates `table` in its target shape, keeping the common columns' data.
///
/// Runs as one transaction: create the scratch table from the target
/// definition, copy the common columns, drop the original, rename the
/// scratch table. On failure nothing is changed. Returns the statements
/// executed.
pub async fn rebuild_table(conn: &mut SqliteConnection, table: &TableDef) -> Result<Vec<String>> {
    let temp_name = ddl::temp_table_name(&table.name);
    let mut statements = Vec::new();

    let mut tx = conn.begin().await?;

    let live = live_columns(&mut tx, &table.name).await?;
    let (common, _) = split_columns(table, &live);

    execute(&mut tx, ddl::drop_table_sql(&temp_name, true), &mut statements).await?;
    execute(&mut tx, ddl::create_table_sql(&table.renamed(&temp_name)), &mut statements).await?;
    if !common.is_empty() {
        execute(
            &mut tx,
            ddl::copy_rows_sql(&table.name, &temp_name, &common),
            &mut statements,
        )
        .await?;
    }
    execute(&mut tx, ddl::drop_table_sql(&table.name, false), &mut statements).await?;
    execute(&mut tx, ddl::rename_table_sql(&temp_name, &table.name), &mut statements).await?;

    tx.commit().await?;
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn target() -> TableDef {
        TableDef::new(
            "t",
            vec![
                ColumnDef::integer("id").primary_key().auto_increment(),
                ColumnDef::text("a"),
                ColumnDef::text("c").default_expr("'z'"),
            ],
        )
    }

    fn live(cols: &[(&str, &str)]) -> Vec<LiveColumn> {
        cols.iter().map(|(n, t)| LiveColumn::new(*n, *t)).collect()
    }

    #[test]
    fn test_plan_missing_table() {
        assert_eq!(plan(&target(), None), SchemaAction::Create);
    }

    #[test]
    fn test_plan_conforming_table() {
        let cols = live(&[("id", "INTEGER"), ("a", "TEXT"), ("c", "text")]);
        assert_eq!(plan(&target(), Some(&cols)), SchemaAction::Unchanged);
    }

    #[test]
    fn test_plan_missing_column_is_additive() {
        let cols = live(&[("id", "INTEGER"), ("a", "TEXT")]);
        match plan(&target(), Some(&cols)) {
            SchemaAction::AddColumns { add, skipped } => {
                assert_eq!(add.len(), 1);
                assert_eq!(add[0].name, "c");
                assert!(skipped.is_empty());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_plan_skips_not_null_without_default() {
        let mut table = target();
        table.columns.push(ColumnDef::text("d").not_null());
        let cols = live(&[("id", "INTEGER"), ("a", "TEXT"), ("c", "TEXT")]);
        match plan(&table, Some(&cols)) {
            SchemaAction::AddColumns { add, skipped } => {
                assert!(add.is_empty());
                assert_eq!(skipped[0].name, "d");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_plan_extra_column_rebuilds() {
        let cols = live(&[("id", "INTEGER"), ("a", "TEXT"), ("b", "TEXT")]);
        assert_eq!(
            plan(&target(), Some(&cols)),
            SchemaAction::Rebuild {
                reason: RebuildReason::ExtraColumn("b".into()),
                common: vec!["id".into(), "a".into()],
                dropped: vec!["b".into()],
            }
        );
    }

    #[test]
    fn test_plan_type_mismatch_rebuilds_and_supersedes_additions() {
        // `c` is missing too, but the mismatch on `a` wins.
        let cols = live(&[("id", "INTEGER"), ("a", "INTEGER")]);
        match plan(&target(), Some(&cols)) {
            SchemaAction::Rebuild { reason, common, dropped } => {
                assert_eq!(
                    reason,
                    RebuildReason::TypeMismatch {
                        column: "a".into(),
                        expected: "TEXT".into(),
                        found: "INTEGER".into(),
                    }
                );
                assert_eq!(common, vec!["id".to_string(), "a".to_string()]);
                assert!(dropped.is_empty());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_plan_first_mismatch_short_circuits() {
        let cols = live(&[("id", "TEXT"), ("a", "INTEGER"), ("c", "TEXT")]);
        match plan(&target(), Some(&cols)) {
            SchemaAction::Rebuild {
                reason: RebuildReason::TypeMismatch { column, .. },
                ..
            } => assert_eq!(column, "id"),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_plan_type_names_are_literal() {
        let table = TableDef::new("n", vec![ColumnDef::new("v", ColumnType::Custom("INT".into()))]);
        let cols = live(&[("v", "INTEGER")]);
        assert!(matches!(
            plan(&table, Some(&cols)),
            SchemaAction::Rebuild { .. }
        ));
    }
}
