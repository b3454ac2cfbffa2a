//! DDL generation for SQLite.
//!
//! Everything here is a pure function of a [`TableDef`]. Conflicting flags
//! (AUTOINCREMENT on a TEXT column, say) are passed through untouched and
//! left for SQLite to reject when the statement runs.

use crate::schema::{ColumnDef, TableDef};

/// Suffix of the scratch table used while rebuilding.
pub const TEMP_SUFFIX: &str = "_temp_rebuild";

/// Query checking whether a table exists. Binds the table name.
pub const TABLE_EXISTS_SQL: &str = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";

/// Query listing a table's columns and declared types. Binds the table name.
pub const TABLE_COLUMNS_SQL: &str = "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid";

/// Quotes an identifier (table name, column name).
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns the name of the scratch table used to rebuild `table`.
#[must_use]
pub fn temp_table_name(table: &str) -> String {
    format!("{table}{TEMP_SUFFIX}")
}

/// Generates a column clause.
///
/// Constraints always come in the same order: `NOT NULL`, `PRIMARY KEY`,
/// `AUTOINCREMENT`, `UNIQUE`, `DEFAULT (<expr>)`.
#[must_use]
pub fn column_definition(column: &ColumnDef) -> String {
    let mut parts = vec![
        quote_identifier(&column.name),
        column.column_type.sql_name().to_string(),
    ];

    if column.not_null {
        parts.push("NOT NULL".to_string());
    }
    if column.primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if column.auto_increment {
        parts.push("AUTOINCREMENT".to_string());
    }
    if column.unique {
        parts.push("UNIQUE".to_string());
    }
    if let Some(ref expr) = column.default {
        parts.push(format!("DEFAULT ({expr})"));
    }

    parts.join(" ")
}

/// Generates the `CREATE TABLE` statement for a table definition.
#[must_use]
pub fn create_table_sql(table: &TableDef) -> String {
    let col_defs: Vec<String> = table.columns.iter().map(column_definition).collect();

    let mut sql = String::from("CREATE TABLE ");
    sql.push_str(&quote_identifier(&table.name));
    sql.push_str(" (\n  ");
    sql.push_str(&col_defs.join(",\n  "));
    sql.push_str("\n)");
    sql
}

/// Generates `ALTER TABLE ... ADD COLUMN`.
///
/// Only the type, `NOT NULL` (when a default backs it) and the default are
/// carried; SQLite cannot add key or unique constraints this way.
#[must_use]
pub fn add_column_sql(table: &str, column: &ColumnDef) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_identifier(table),
        quote_identifier(&column.name),
        column.column_type.sql_name()
    );

    if let Some(ref expr) = column.default {
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        sql.push_str(&format!(" DEFAULT ({expr})"));
    }

    sql
}

/// Generates `DROP TABLE`.
#[must_use]
pub fn drop_table_sql(table: &str, if_exists: bool) -> String {
    let mut sql = String::from("DROP TABLE ");
    if if_exists {
        sql.push_str("IF EXISTS ");
    }
    sql.push_str(&quote_identifier(table));
    sql
}

/// Generates `ALTER TABLE ... RENAME TO`.
#[must_use]
pub fn rename_table_sql(old_name: &str, new_name: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_identifier(old_name),
        quote_identifier(new_name)
    )
}

/// Generates `INSERT INTO <to> (cols) SELECT cols FROM <from>`.
#[must_use]
pub fn copy_rows_sql(from: &str, to: &str, columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let list = quoted.join(", ");
    format!(
        "INSERT INTO {} ({list}) SELECT {list} FROM {}",
        quote_identifier(to),
        quote_identifier(from)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::schema::ColumnType;

    #[test]
    fn test_column_constraint_order() {
        let col = ColumnDef::integer("id")
            .unique()
            .auto_increment()
            .primary_key()
            .not_null()
            .default_expr("0");
        assert_eq!(
            column_definition(&col),
            "\"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT UNIQUE DEFAULT (0)"
        );
    }

    #[test]
    fn test_create_table_preserves_column_order() {
        let sql = create_table_sql(&registry::shortcut());
        assert_eq!(
            sql,
            "CREATE TABLE \"shortcut\" (\n  \
             \"id\" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,\n  \
             \"capabilityID\" INTEGER NOT NULL UNIQUE,\n  \
             \"key\" TEXT NOT NULL UNIQUE,\n  \
             \"createTime\" TEXT DEFAULT (datetime('now', 'localtime'))\n)"
        );
    }

    #[test]
    fn test_create_table_is_deterministic() {
        let table = registry::options();
        assert_eq!(create_table_sql(&table), create_table_sql(&table));
    }

    #[test]
    fn test_conflicting_flags_pass_through() {
        let col = ColumnDef::text("name").auto_increment();
        assert_eq!(column_definition(&col), "\"name\" TEXT AUTOINCREMENT");
    }

    #[test]
    fn test_custom_type_verbatim() {
        let col = ColumnDef::new("n", ColumnType::Custom("INT".into()));
        assert_eq!(column_definition(&col), "\"n\" INT");
    }

    #[test]
    fn test_add_column_variants() {
        assert_eq!(
            add_column_sql("t", &ColumnDef::text("c")),
            "ALTER TABLE \"t\" ADD COLUMN \"c\" TEXT"
        );
        assert_eq!(
            add_column_sql("t", &ColumnDef::text("c").default_expr("'z'")),
            "ALTER TABLE \"t\" ADD COLUMN \"c\" TEXT DEFAULT ('z')"
        );
        assert_eq!(
            add_column_sql("t", &ColumnDef::text("c").not_null().default_expr("'z'")),
            "ALTER TABLE \"t\" ADD COLUMN \"c\" TEXT NOT NULL DEFAULT ('z')"
        );
    }

    #[test]
    fn test_rebuild_statements() {
        assert_eq!(temp_table_name("star"), "star_temp_rebuild");
        assert_eq!(drop_table_sql("star", false), "DROP TABLE \"star\"");
        assert_eq!(
            drop_table_sql("star_temp_rebuild", true),
            "DROP TABLE IF EXISTS \"star_temp_rebuild\""
        );
        assert_eq!(
            rename_table_sql("star_temp_rebuild", "star"),
            "ALTER TABLE \"star_temp_rebuild\" RENAME TO \"star\""
        );
        assert_eq!(
            copy_rows_sql("star", "star_temp_rebuild", &["id".into(), "capabilityID".into()]),
            "INSERT INTO \"star_temp_rebuild\" (\"id\", \"capabilityID\") \
             SELECT \"id\", \"capabilityID\" FROM \"star\""
        );
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
