//! Generic CRUD statement builder.
//!
//! Turns a table name, column list and WHERE fragment into SQL plus an
//! argument vector. WHERE fragments use `?` as a portable placeholder; the
//! builder rewrites each one to SQLite's numbered `?N` form, left to right,
//! and refuses fragments whose placeholder count differs from the argument
//! count.

use std::sync::LazyLock;

use regex::Regex;

use crate::ddl::quote_identifier;
use crate::error::{Result, StorageError};
use crate::value::SqlValue;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// A built statement: SQL text and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL with numbered placeholders.
    pub sql: String,
    /// Arguments, in placeholder order.
    pub args: Vec<SqlValue>,
}

/// Checks that a table or column name is a plain identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}

/// Rewrites every `?` in `clause` to `?N`, numbering from `offset + 1`.
///
/// Question marks inside single-quoted string literals or double-quoted
/// identifiers are left alone. Fails when the number of placeholders differs
/// from `arg_count`.
pub fn rewrite_placeholders(clause: &str, offset: usize, arg_count: usize) -> Result<String> {
    let mut out = String::with_capacity(clause.len() + 8);
    let mut quote: Option<char> = None;
    let mut found = 0;

    for ch in clause.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => {
                quote = Some(ch);
                out.push(ch);
            }
            (Some(open), c) if c == open => {
                // A doubled quote re-opens immediately on the next char.
                quote = None;
                out.push(c);
            }
            (None, '?') => {
                found += 1;
                out.push('?');
                out.push_str(&(offset + found).to_string());
            }
            (_, c) => out.push(c),
        }
    }

    if found != arg_count {
        return Err(StorageError::PlaceholderMismatch {
            placeholders: found,
            arguments: arg_count,
        });
    }

    Ok(out)
}

/// Appends ` WHERE <clause>` when a non-empty clause is given.
fn push_where(
    sql: &mut String,
    where_clause: Option<&str>,
    offset: usize,
    where_args: &[SqlValue],
) -> Result<()> {
    match where_clause.map(str::trim).filter(|c| !c.is_empty()) {
        Some(clause) => {
            let clause = rewrite_placeholders(clause, offset, where_args.len())?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        None if !where_args.is_empty() => {
            return Err(StorageError::PlaceholderMismatch {
                placeholders: 0,
                arguments: where_args.len(),
            });
        }
        None => {}
    }
    Ok(())
}

/// Builds `INSERT INTO table (cols) VALUES (?1, ?2, ...)`.
pub fn insert<C: AsRef<str>>(table: &str, columns: &[C], values: Vec<SqlValue>) -> Result<Statement> {
    validate_identifier(table)?;
    if columns.len() != values.len() {
        return Err(StorageError::ColumnValueMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }

    let mut names = Vec::with_capacity(columns.len());
    for column in columns {
        validate_identifier(column.as_ref())?;
        names.push(quote_identifier(column.as_ref()));
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            names.join(", "),
            placeholders.join(", ")
        ),
        args: values,
    })
}

/// Builds `UPDATE table SET col = ?1, ... [WHERE ...]`.
///
/// SET parameters are numbered first; WHERE placeholders continue after them.
pub fn update<K, I>(
    table: &str,
    data: I,
    where_clause: Option<&str>,
    where_args: Vec<SqlValue>,
) -> Result<Statement>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, SqlValue)>,
{
    validate_identifier(table)?;

    let mut assignments = Vec::new();
    let mut args = Vec::new();
    for (column, value) in data {
        let column = column.into();
        validate_identifier(&column)?;
        args.push(value);
        assignments.push(format!("{} = ?{}", quote_identifier(&column), args.len()));
    }
    if assignments.is_empty() {
        return Err(StorageError::EmptyUpdate);
    }

    let mut sql = format!(
        "UPDATE {} SET {}",
        quote_identifier(table),
        assignments.join(", ")
    );
    push_where(&mut sql, where_clause, args.len(), &where_args)?;
    args.extend(where_args);

    Ok(Statement { sql, args })
}

/// Builds `SELECT cols FROM table [WHERE ...]`. No columns means `*`.
pub fn select<C: AsRef<str>>(
    table: &str,
    columns: &[C],
    where_clause: Option<&str>,
    where_args: Vec<SqlValue>,
) -> Result<Statement> {
    validate_identifier(table)?;

    let column_list = if columns.is_empty() || columns.iter().any(|c| c.as_ref() == "*") {
        "*".to_string()
    } else {
        let mut names = Vec::with_capacity(columns.len());
        for column in columns {
            validate_identifier(column.as_ref())?;
            names.push(quote_identifier(column.as_ref()));
        }
        names.join(", ")
    };

    let mut sql = format!("SELECT {column_list} FROM {}", quote_identifier(table));
    push_where(&mut sql, where_clause, 0, &where_args)?;

    Ok(Statement {
        sql,
        args: where_args,
    })
}

/// Builds `DELETE FROM table [WHERE ...]`.
pub fn delete(table: &str, where_clause: Option<&str>, where_args: Vec<SqlValue>) -> Result<Statement> {
    validate_identifier(table)?;

    let mut sql = format!("DELETE FROM {}", quote_identifier(table));
    push_where(&mut sql, where_clause, 0, &where_args)?;

    Ok(Statement {
        sql,
        args: where_args,
    })
}
