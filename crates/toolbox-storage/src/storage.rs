//! Connection lifecycle and the storage interface.
//!
//! [`Storage`] owns the one database connection. `connect()` opens it and
//! reconciles every registered table, strictly one after another, before
//! the handle is usable; every other operation needs `&mut self`, so nothing
//! can interleave with reconciliation or with each other.

use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, error, info};

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::reconcile::{self, ReconcileReport};
use crate::registry;
use crate::schema::TableDef;
use crate::statement::{self, Statement};
use crate::value::{bind_value, row_from_sqlite, Row, SqlValue};

/// Result of an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    /// Rows inserted.
    pub changes: u64,
    /// Rowid assigned to the new row.
    pub last_id: i64,
}

/// The storage service: one connection, one owner.
pub struct Storage {
    config: StorageConfig,
    tables: Vec<TableDef>,
    conn: Option<SqliteConnection>,
    last_sync: Vec<ReconcileReport>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("database_url", &self.config.database_url)
            .field("tables", &self.tables.len())
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl Storage {
    /// Creates a disconnected storage for the application tables.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_tables(config, registry::app_tables())
    }

    /// Creates a disconnected storage that reconciles `tables` on connect.
    #[must_use]
    pub fn with_tables(config: StorageConfig, tables: Vec<TableDef>) -> Self {
        Self {
            config,
            tables,
            conn: None,
            last_sync: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the table definitions reconciled on connect.
    #[must_use]
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Returns whether `connect()` has completed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Reports from the most recent successful `connect()`.
    #[must_use]
    pub fn last_sync(&self) -> &[ReconcileReport] {
        &self.last_sync
    }

    /// Opens the database and reconciles every table.
    ///
    /// Does nothing when already connected. On any failure the storage stays
    /// disconnected and the error is returned; nothing is retried.
    pub async fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        match self.open_and_sync().await {
            Ok((conn, reports)) => {
                info!(
                    database = %self.config.database_url,
                    tables = reports.len(),
                    "Database ready"
                );
                self.conn = Some(conn);
                self.last_sync = reports;
                Ok(())
            }
            Err(e) => {
                error!(
                    database = %self.config.database_url,
                    error = %e,
                    "Failed to connect to database"
                );
                self.conn = None;
                Err(e)
            }
        }
    }

    async fn open_and_sync(&self) -> Result<(SqliteConnection, Vec<ReconcileReport>)> {
        let options = self.config.connect_options()?;
        let mut conn = SqliteConnection::connect_with(&options).await?;

        let mut reports = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            match reconcile::reconcile(&mut conn, table).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    if let Err(close_err) = conn.close().await {
                        debug!(error = %close_err, "Error closing connection after failed sync");
                    }
                    return Err(StorageError::reconcile(&table.name, e));
                }
            }
        }

        Ok((conn, reports))
    }

    /// Closes the connection. Does nothing when not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
            info!(database = %self.config.database_url, "Database connection closed");
        }
        Ok(())
    }

    fn conn_mut(&mut self) -> Result<&mut SqliteConnection> {
        self.conn.as_mut().ok_or(StorageError::NotConnected)
    }

    async fn execute(&mut self, stmt: Statement) -> Result<SqliteQueryResult> {
        let conn = self.conn_mut()?;
        debug!(sql = %stmt.sql, args = stmt.args.len(), "Executing SQL");

        let mut query = sqlx::query(&stmt.sql);
        for value in stmt.args {
            query = bind_value(query, value);
        }
        Ok(query.execute(&mut *conn).await?)
    }

    async fn fetch(&mut self, stmt: Statement) -> Result<Vec<Row>> {
        let conn = self.conn_mut()?;
        debug!(sql = %stmt.sql, args = stmt.args.len(), "Executing query");

        let mut query = sqlx::query(&stmt.sql);
        for value in stmt.args {
            query = bind_value(query, value);
        }
        let rows: Vec<SqliteRow> = query.fetch_all(&mut *conn).await?;
        rows.iter().map(row_from_sqlite).collect()
    }

    /// Inserts one row. `columns` and `values` are paired by position.
    pub async fn insert<C: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[C],
        values: Vec<SqlValue>,
    ) -> Result<InsertResult> {
        let stmt = statement::insert(table, columns, values)?;
        let result = self.execute(stmt).await?;
        Ok(InsertResult {
            changes: result.rows_affected(),
            last_id: result.last_insert_rowid(),
        })
    }

    /// Updates matching rows and returns how many changed.
    ///
    /// `where_clause` uses `?` placeholders, bound from `where_args` in order.
    pub async fn update<K, I>(
        &mut self,
        table: &str,
        data: I,
        where_clause: Option<&str>,
        where_args: Vec<SqlValue>,
    ) -> Result<u64>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SqlValue)>,
    {
        let stmt = statement::update(table, data, where_clause, where_args)?;
        Ok(self.execute(stmt).await?.rows_affected())
    }

    /// Selects rows. An empty column list selects every column.
    pub async fn select<C: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[C],
        where_clause: Option<&str>,
        where_args: Vec<SqlValue>,
    ) -> Result<Vec<Row>> {
        let stmt = statement::select(table, columns, where_clause, where_args)?;
        self.fetch(stmt).await
    }

    /// Deletes matching rows and returns how many were removed.
    pub async fn delete_data(
        &mut self,
        table: &str,
        where_clause: Option<&str>,
        where_args: Vec<SqlValue>,
    ) -> Result<u64> {
        let stmt = statement::delete(table, where_clause, where_args)?;
        Ok(self.execute(stmt).await?.rows_affected())
    }

    /// Runs an arbitrary read query. The SQL is passed to SQLite unchanged.
    pub async fn select_custom(&mut self, sql: &str, args: Vec<SqlValue>) -> Result<Vec<Row>> {
        self.fetch(Statement {
            sql: sql.to_string(),
            args,
        })
        .await
    }
}
