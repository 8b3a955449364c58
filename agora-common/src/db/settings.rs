//! Settings database access
//!
//! Typed reads and writes against the settings key-value table.

use crate::Result;
use sqlx::SqlitePool;
use std::str::FromStr;

/// Default maximum HTTP request body size (1 MiB)
const DEFAULT_MAX_BODY_SIZE_BYTES: usize = 1_048_576;

/// Read a setting and parse it; unparseable or missing values are None
pub async fn get_setting<T: FromStr>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(value.and_then(|v| v.parse::<T>().ok()))
}

/// Write a setting, replacing any existing value
pub async fn set_setting<T: ToString>(pool: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Maximum accepted HTTP request body size in bytes
///
/// Materializes the default on first read so the value is visible (and
/// editable) in the settings table.
pub async fn max_body_size_bytes(pool: &SqlitePool) -> Result<usize> {
    match get_setting::<usize>(pool, "http_max_body_size_bytes").await? {
        Some(size) => Ok(size),
        None => {
            set_setting(pool, "http_max_body_size_bytes", DEFAULT_MAX_BODY_SIZE_BYTES).await?;
            Ok(DEFAULT_MAX_BODY_SIZE_BYTES)
        }
    }
}
