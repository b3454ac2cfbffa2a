//! SQL values and result rows.
//!
//! Parameters go in as [`SqlValue`]s and rows come back as [`Row`]s: an
//! ordered, string-keyed list of values copied out of the driver's result set.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};

use crate::error::{Result, StorageError};

/// A SQL value that can be used as a parameter or read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value, stored by SQLite as 0/1.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns whether the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as an integer, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns the value as text, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parses a command-line argument: `null`, an integer, a float, or text.
    #[must_use]
    pub fn parse_arg(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("null") {
            Self::Null
        } else if let Ok(i) = arg.parse::<i64>() {
            Self::Int(i)
        } else if let Ok(f) = arg.parse::<f64>() {
            Self::Float(f)
        } else {
            Self::Text(arg.to_string())
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// Builds a `Vec<SqlValue>` from heterogeneous arguments.
///
/// ```
/// use toolbox_storage::{args, SqlValue};
///
/// let values = args![1, "x", None::<i64>];
/// assert_eq!(values[1], SqlValue::Text("x".into()));
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::SqlValue>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::value::ToSqlValue::to_sql_value($value)),+]
    };
}

/// One result row: column names paired with values, in result-set order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.entries.push((column.into(), value));
    }

    /// Returns a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns an integer column, `None` if absent, NULL or not an integer.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    /// Returns a text column, `None` if absent, NULL or not text.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    /// Returns a required integer column.
    pub fn require_i64(&self, column: &str) -> Result<i64> {
        self.get_i64(column)
            .ok_or_else(|| StorageError::Decode(format!("expected integer column '{column}'")))
    }

    /// Returns a required text column.
    pub fn require_str(&self, column: &str) -> Result<&str> {
        self.get_str(column)
            .ok_or_else(|| StorageError::Decode(format!("expected text column '{column}'")))
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Binds a `SqlValue` parameter to a raw query.
pub(crate) fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Storage class of a single fetched value.
enum StorageClass {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

/// Copies a driver row into an owned [`Row`].
pub(crate) fn row_from_sqlite(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();

    for (index, column) in row.columns().iter().enumerate() {
        let class = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                StorageClass::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" | "BOOLEAN" => StorageClass::Integer,
                    "REAL" => StorageClass::Real,
                    "BLOB" => StorageClass::Blob,
                    _ => StorageClass::Text,
                }
            }
        };

        let value = match class {
            StorageClass::Null => SqlValue::Null,
            StorageClass::Integer => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
            StorageClass::Real => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
            StorageClass::Text => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
            StorageClass::Blob => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        };

        out.push(column.name(), value);
    }

    Ok(out)
}
