//! Database initialization
//!
//! Creates the database on first run and brings the schema up to date.
//! All migrations are idempotent `CREATE ... IF NOT EXISTS` statements,
//! safe to run on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer, which matters
    // with many request workers sharing the pool
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Run migrations (idempotent - safe to call multiple times)
    create_settings_table(&pool).await?;
    create_users_table(&pool).await?;
    create_threads_table(&pool).await?;
    create_comments_table(&pool).await?;
    create_votes_table(&pool).await?;

    // Initialize default settings
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the users table
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'moderator')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the threads table
///
/// Thread CRUD is owned elsewhere; the vote subsystem only needs the
/// rows to exist for target-existence checks and cascade cleanup.
pub async fn create_threads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS threads (
            guid TEXT PRIMARY KEY,
            author_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            title TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_threads_author ON threads(author_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the comments table
///
/// `parent_id` supports one level of reply nesting (NULL for top-level
/// comments).
pub async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            guid TEXT PRIMARY KEY,
            thread_id TEXT NOT NULL REFERENCES threads(guid) ON DELETE CASCADE,
            author_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            parent_id TEXT REFERENCES comments(guid) ON DELETE CASCADE,
            body TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_thread ON comments(thread_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the votes table
///
/// The composite primary key on `(voter_id, target_id, target_kind)`
/// enforces at most one vote per voter per target and serializes
/// concurrent duplicate creates: the loser surfaces a unique-constraint
/// violation instead of a second row.
pub async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            voter_id TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            target_id TEXT NOT NULL,
            target_kind TEXT NOT NULL CHECK (target_kind IN ('thread', 'comment')),
            direction INTEGER NOT NULL CHECK (direction IN (1, -1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (voter_id, target_id, target_kind)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Secondary index for per-target direction counts
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_votes_target ON votes(target_id, target_kind, direction)",
    )
    .execute(pool)
    .await?;

    // target_id cannot carry a foreign key into two tables, so target
    // deletion cleans up votes through triggers instead
    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_threads_delete_votes
        AFTER DELETE ON threads
        BEGIN
            DELETE FROM votes WHERE target_kind = 'thread' AND target_id = OLD.guid;
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_comments_delete_votes
        AFTER DELETE ON comments
        BEGIN
            DELETE FROM votes WHERE target_kind = 'comment' AND target_id = OLD.guid;
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // HTTP server settings; read back through db::settings at startup
    ensure_setting(pool, "http_max_body_size_bytes", "1048576").await?; // 1 MiB

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // Use INSERT OR IGNORE to handle concurrent initialization race conditions
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}
