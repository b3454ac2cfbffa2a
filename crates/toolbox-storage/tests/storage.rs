//! Storage lifecycle and CRUD through the public interface.

use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

use toolbox_storage::args;
use toolbox_storage::prelude::*;

fn file_config(dir: &TempDir) -> StorageConfig {
    let path = dir.path().join("toolbox.db");
    StorageConfig::default().with_database_url(format!("sqlite://{}", path.display()))
}

async fn memory_storage() -> Storage {
    let mut storage = Storage::new(StorageConfig::in_memory());
    storage.connect().await.unwrap();
    storage
}

#[tokio::test]
async fn test_insert_select_round_trip() {
    let mut storage = memory_storage().await;

    let inserted = storage
        .insert(
            "options",
            &["capabilityID", "key", "val", "remake"],
            args![0, "theme", "dark", "general"],
        )
        .await
        .unwrap();
    assert_eq!(inserted.changes, 1);

    let rows = storage
        .select(
            "options",
            &["capabilityID", "key", "val", "remake"],
            Some("id = ?"),
            args![inserted.last_id],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get_i64("capabilityID"), Some(0));
    assert_eq!(row.get_str("key"), Some("theme"));
    assert_eq!(row.get_str("val"), Some("dark"));
    assert_eq!(row.get_str("remake"), Some("general"));
}

#[tokio::test]
async fn test_select_star_returns_all_columns_in_order() {
    let mut storage = memory_storage().await;
    storage.insert("star", &["capabilityID"], args![1]).await.unwrap();

    let rows = storage.select::<&str>("star", &[], None, vec![]).await.unwrap();
    assert_eq!(
        rows[0].columns().collect::<Vec<_>>(),
        vec!["id", "capabilityID", "createTime"]
    );
}

#[tokio::test]
async fn test_update_matching_nothing_reports_zero() {
    let mut storage = memory_storage().await;

    let changes = storage
        .update(
            "options",
            [("val", SqlValue::Text("light".into()))],
            Some("key = ?"),
            args!["missing"],
        )
        .await
        .unwrap();
    assert_eq!(changes, 0);
}

#[tokio::test]
async fn test_update_and_delete_counts() {
    let mut storage = memory_storage().await;
    for id in [1, 1, 2] {
        storage.insert("recently", &["capabilityID"], args![id]).await.unwrap();
    }

    let changes = storage
        .update(
            "recently",
            [("capabilityID", SqlValue::Int(3))],
            Some("capabilityID = ? AND id > ?"),
            args![1, 1],
        )
        .await
        .unwrap();
    assert_eq!(changes, 1);

    assert_eq!(
        storage.delete_data("recently", Some("capabilityID = ?"), args![1]).await.unwrap(),
        1
    );
    assert_eq!(storage.delete_data("recently", None, vec![]).await.unwrap(), 2);
}

#[tokio::test]
async fn test_placeholder_mismatch_is_rejected_before_execution() {
    let mut storage = memory_storage().await;
    storage.insert("star", &["capabilityID"], args![1]).await.unwrap();

    let err = storage
        .delete_data("star", Some("capabilityID = ? OR id = ?"), args![1])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::PlaceholderMismatch { .. }));

    let rows = storage.select::<&str>("star", &[], None, vec![]).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_select_custom() {
    let mut storage = memory_storage().await;
    for id in [4, 5, 5] {
        storage.insert("star", &["capabilityID"], args![id]).await.unwrap();
    }

    let rows = storage
        .select_custom(
            "SELECT capabilityID, COUNT(*) AS uses FROM star GROUP BY capabilityID ORDER BY uses DESC",
            vec![],
        )
        .await
        .unwrap();
    assert_eq!(rows[0].get_i64("capabilityID"), Some(5));
    assert_eq!(rows[0].get_i64("uses"), Some(2));
}

#[tokio::test]
async fn test_connect_failure_leaves_storage_disconnected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("toolbox.db");
    let config = StorageConfig::default()
        .with_database_url(format!("sqlite://{}", path.display()))
        .with_create_if_missing(false);

    let mut storage = Storage::new(config);
    let err = storage.connect().await.unwrap_err();

    assert!(matches!(err, StorageError::Database(_)));
    assert!(!storage.is_connected());
    assert!(storage.last_sync().is_empty());
    assert!(matches!(
        storage.select::<&str>("star", &[], None, vec![]).await,
        Err(StorageError::NotConnected)
    ));
}

#[tokio::test]
async fn test_reconcile_failure_names_the_table() {
    let bad = TableDef::new(
        "bad",
        vec![ColumnDef::text("name").primary_key().auto_increment()],
    );
    let mut storage = Storage::with_tables(StorageConfig::in_memory(), vec![bad]);

    let err = storage.connect().await.unwrap_err();
    match err {
        StorageError::Reconcile { table, .. } => assert_eq!(table, "bad"),
        other => panic!("expected reconcile error, got {other:?}"),
    }
    assert!(!storage.is_connected());
}

#[tokio::test]
async fn test_data_survives_reconnect() {
    let dir = TempDir::new().unwrap();

    let mut storage = Storage::new(file_config(&dir));
    storage.connect().await.unwrap();
    storage.insert("star", &["capabilityID"], args![2]).await.unwrap();
    storage.disconnect().await.unwrap();

    let mut storage = Storage::new(file_config(&dir));
    storage.connect().await.unwrap();
    assert!(storage
        .last_sync()
        .iter()
        .all(|r| r.action == SchemaAction::Unchanged));

    let rows = storage.select("star", &["capabilityID"], None, vec![]).await.unwrap();
    assert_eq!(rows[0].get_i64("capabilityID"), Some(2));
}

#[tokio::test]
async fn test_drifted_app_table_is_rebuilt_on_connect() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    // An older layout of `star` with an extra column and a row.
    {
        let options = config.connect_options().unwrap();
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        sqlx::query(
            "CREATE TABLE star (id INTEGER PRIMARY KEY AUTOINCREMENT, capabilityID INTEGER NOT NULL, \
             note TEXT, createTime TEXT DEFAULT (datetime('now', 'localtime')))",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        sqlx::query("INSERT INTO star (capabilityID, note) VALUES (9, 'old')")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
    }

    let mut storage = Storage::new(config);
    storage.connect().await.unwrap();

    let star = storage
        .last_sync()
        .iter()
        .find(|r| r.table == "star")
        .unwrap();
    match &star.action {
        SchemaAction::Rebuild { dropped, .. } => assert_eq!(dropped, &vec!["note".to_string()]),
        other => panic!("expected rebuild, got {other:?}"),
    }

    let rows = storage.select::<&str>("star", &[], None, vec![]).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_i64("capabilityID"), Some(9));
    assert!(rows[0].get("note").is_none());
}
