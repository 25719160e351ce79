//! SQLite access for the item-name store.
//!
//! The store is a single file holding the data table
//! `(id INTEGER PRIMARY KEY, {column} TEXT)` and a `metadata` key-value
//! table. Table and column names come from configuration and are
//! interpolated into the SQL text (they cannot be bound), so they are
//! validated as plain identifiers before any statement is built.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use crate::config::{INSERT_CHUNK_SIZE, POOL_MAX_CONNECTIONS, ROW_COUNT_KEY};
use crate::error::DatasetError;

/// Open a connection pool on the store file.
///
/// `create_if_missing` is set only on build paths; opening an existing store
/// never creates a file behind the caller's back.
pub async fn open(db_path: &Path, create_if_missing: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(create_if_missing);

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open store at {}", db_path.display()))?;

    Ok(pool)
}

/// Create the data table.
///
/// `id` is a rowid alias, so SQLite assigns contiguous one-based keys in
/// insertion order as long as the table is append-only.
pub async fn create_data_table(pool: &SqlitePool, table: &str, column: &str) -> Result<()> {
    let ddl = format!("CREATE TABLE {table} (id INTEGER PRIMARY KEY, {column} TEXT)");
    sqlx::query(&ddl)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create table {table}"))?;
    Ok(())
}

/// Create the metadata table if it is not already present.
pub async fn ensure_metadata_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT)")
        .execute(pool)
        .await
        .context("Failed to create metadata table")?;
    Ok(())
}

/// Append values to the data table inside a single transaction.
///
/// The transaction commits before returning, so rows from a file processed
/// earlier survive a failure in a later one. Returns the number of rows
/// inserted.
pub async fn insert_names(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    names: &[String],
) -> Result<u64> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin insert transaction")?;

    let mut inserted = 0u64;
    for chunk in names.chunks(INSERT_CHUNK_SIZE) {
        let mut query = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {table} ({column}) "));
        query.push_values(chunk, |mut row, name| {
            row.push_bind(name.as_str());
        });
        let result = query
            .build()
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert batch into {table}"))?;
        inserted += result.rows_affected();
    }

    tx.commit()
        .await
        .context("Failed to commit insert transaction")?;

    Ok(inserted)
}

/// Count the rows of the data table with a full scan.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count rows in {table}"))?;
    Ok(count as u64)
}

/// Read the cached row count from the metadata table, if one was written.
pub async fn cached_row_count(pool: &SqlitePool) -> Result<Option<u64>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM metadata WHERE key = ?")
        .bind(ROW_COUNT_KEY)
        .fetch_optional(pool)
        .await
        .context("Failed to read cached row count")?;

    match row {
        None => Ok(None),
        Some((raw,)) => {
            let count = raw
                .parse::<u64>()
                .with_context(|| format!("Corrupt cached row count {raw:?} in metadata table"))?;
            Ok(Some(count))
        }
    }
}

/// Persist the row count under its fixed metadata key.
pub async fn store_row_count(pool: &SqlitePool, count: u64) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
        .bind(ROW_COUNT_KEY)
        .bind(count.to_string())
        .execute(pool)
        .await
        .context("Failed to store cached row count")?;
    Ok(())
}

/// Fetch the value of a single row by its one-based key.
///
/// The outer `Option` is the row's presence, the inner one the value's
/// nullability; the caller maps both gaps to its out-of-range condition.
pub async fn fetch_value(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    id: i64,
) -> Result<Option<Option<String>>> {
    let sql = format!("SELECT {column} FROM {table} WHERE id = ?");
    let row: Option<(Option<String>,)> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to fetch row {id} from {table}"))?;
    Ok(row.map(|(value,)| value))
}

/// Reject table and column names that are not plain identifiers.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DatasetError::InvalidIdentifier(name.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_contiguous_keys() {
        let pool = memory_pool().await;
        create_data_table(&pool, "items", "name").await.unwrap();

        let names: Vec<String> = (0..5).map(|i| format!("item_{i}")).collect();
        let inserted = insert_names(&pool, "items", "name", &names).await.unwrap();
        assert_eq!(inserted, 5);

        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM items ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(rows[0].1, "item_0");
        assert_eq!(rows[4].1, "item_4");
    }

    #[tokio::test]
    async fn test_insert_spanning_multiple_chunks() {
        let pool = memory_pool().await;
        create_data_table(&pool, "items", "name").await.unwrap();

        let names: Vec<String> = (0..INSERT_CHUNK_SIZE + 7).map(|i| i.to_string()).collect();
        let inserted = insert_names(&pool, "items", "name", &names).await.unwrap();
        assert_eq!(inserted as usize, INSERT_CHUNK_SIZE + 7);
        assert_eq!(count_rows(&pool, "items").await.unwrap() as usize, INSERT_CHUNK_SIZE + 7);
    }

    #[tokio::test]
    async fn test_row_count_metadata_round_trip() {
        let pool = memory_pool().await;
        ensure_metadata_table(&pool).await.unwrap();

        assert_eq!(cached_row_count(&pool).await.unwrap(), None);

        store_row_count(&pool, 42).await.unwrap();
        assert_eq!(cached_row_count(&pool).await.unwrap(), Some(42));

        // Overwriting replaces the previous entry
        store_row_count(&pool, 7).await.unwrap();
        assert_eq!(cached_row_count(&pool).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_fetch_value_distinguishes_missing_and_null() {
        let pool = memory_pool().await;
        create_data_table(&pool, "items", "name").await.unwrap();
        insert_names(&pool, "items", "name", &["first".to_string()])
            .await
            .unwrap();
        sqlx::query("INSERT INTO items (name) VALUES (NULL)")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(
            fetch_value(&pool, "items", "name", 1).await.unwrap(),
            Some(Some("first".to_string()))
        );
        assert_eq!(fetch_value(&pool, "items", "name", 2).await.unwrap(), Some(None));
        assert_eq!(fetch_value(&pool, "items", "name", 3).await.unwrap(), None);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("items").is_ok());
        assert!(validate_identifier("G_NAME").is_ok());
        assert!(validate_identifier("_private2").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("items; DROP TABLE items").is_err());
        assert!(validate_identifier("na me").is_err());
    }
}
