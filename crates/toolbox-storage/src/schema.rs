//! Table definition types.
//!
//! A [`TableDef`] is the code-owned description of what a table should look
//! like. The reconciler compares it against the [`LiveColumn`]s reported by
//! the database and corrects the difference at startup.

use serde::{Deserialize, Serialize};

/// Declared column type.
///
/// Comparison against the live schema is by declared name only: `INTEGER`
/// and `INT` are different types here even though SQLite gives them the same
/// affinity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// `INTEGER`.
    Integer,
    /// `TEXT`.
    Text,
    /// `REAL`.
    Real,
    /// `BLOB`.
    Blob,
    /// `NUMERIC`.
    Numeric,
    /// Any other declared type name, emitted verbatim.
    Custom(String),
}

impl ColumnType {
    /// Returns the type name as written in DDL.
    #[must_use]
    pub fn sql_name(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
            Self::Numeric => "NUMERIC",
            Self::Custom(name) => name,
        }
    }

    /// Whether a live declared type (as reported by `PRAGMA table_info`)
    /// names this type. Case-insensitive, otherwise exact.
    #[must_use]
    pub fn matches_declared(&self, declared: &str) -> bool {
        self.sql_name().to_uppercase() == declared.to_uppercase()
    }
}

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub column_type: ColumnType,
    /// `NOT NULL`.
    pub not_null: bool,
    /// `PRIMARY KEY`.
    pub primary_key: bool,
    /// `AUTOINCREMENT`; only meaningful on an `INTEGER PRIMARY KEY`.
    pub auto_increment: bool,
    /// `UNIQUE`.
    pub unique: bool,
    /// Raw SQL default expression, emitted as `DEFAULT (<expr>)`.
    pub default: Option<String>,
}

impl ColumnDef {
    /// Creates a nullable column with no constraints.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
        }
    }

    /// Shorthand for an `INTEGER` column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    /// Shorthand for a `TEXT` column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column `AUTOINCREMENT`.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column `UNIQUE`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default expression, e.g. `datetime('now', 'localtime')`.
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// A `NOT NULL` column without a default cannot be added to a table
    /// that may already hold rows.
    #[must_use]
    pub fn is_unsafe_to_add(&self) -> bool {
        self.not_null && self.default.is_none()
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Creates a new table definition.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Returns a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns whether the table defines a column with this name.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the column names in declaration order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the same definition under another table name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: self.columns.clone(),
        }
    }
}

/// A column as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Declared type, uppercased.
    pub declared_type: String,
}

impl LiveColumn {
    /// Creates a live column snapshot, normalizing the type to uppercase.
    pub fn new(name: impl Into<String>, declared_type: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.as_ref().to_uppercase(),
        }
    }
}
