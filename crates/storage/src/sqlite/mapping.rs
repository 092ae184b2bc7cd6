use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::repository::StorageError;

/// Value stored for a set completion flag.
pub(crate) const FLAG_SET: &str = "true";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, StorageError> {
    let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(conn)?;
    row.map(|row| row.try_get::<String, _>("value").map_err(ser))
        .transpose()
}

pub(crate) async fn put_value(
    pool: &SqlitePool,
    key: &str,
    value: &str,
    updated_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        ",
    )
    .bind(key)
    .bind(value)
    .bind(updated_at)
    .execute(pool)
    .await
    .map_err(conn)?;
    Ok(())
}

pub(crate) async fn delete_value(pool: &SqlitePool, key: &str) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(key)
        .execute(pool)
        .await
        .map_err(conn)?;
    Ok(())
}

/// Keys starting with `prefix`. `substr` is used instead of `LIKE` so `_` in
/// flag keys is matched literally.
pub(crate) async fn keys_with_prefix(
    pool: &SqlitePool,
    prefix: &str,
) -> Result<Vec<String>, StorageError> {
    let prefix_len = i64::try_from(prefix.chars().count()).map_err(ser)?;
    let rows = sqlx::query("SELECT key FROM kv_store WHERE substr(key, 1, ?1) = ?2 ORDER BY key")
        .bind(prefix_len)
        .bind(prefix)
        .fetch_all(pool)
        .await
        .map_err(conn)?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("key").map_err(ser))
        .collect()
}
