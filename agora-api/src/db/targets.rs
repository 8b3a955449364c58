//! Target existence checks
//!
//! Threads and comments are owned by other subsystems; voting only
//! needs to know whether the referenced row exists.

use crate::error::Result;
use crate::vote::store::TargetKind;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Check whether the thread or comment a vote targets exists
pub async fn target_exists(pool: &Pool<Sqlite>, kind: TargetKind, id: Uuid) -> Result<bool> {
    let query = match kind {
        TargetKind::Thread => "SELECT EXISTS(SELECT 1 FROM threads WHERE guid = ?)",
        TargetKind::Comment => "SELECT EXISTS(SELECT 1 FROM comments WHERE guid = ?)",
    };

    let exists: bool = sqlx::query_scalar(query)
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_common::db::init_database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn existence_is_per_kind() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("agora.db")).await.unwrap();

        let author = Uuid::new_v4();
        sqlx::query("INSERT INTO users (guid, username) VALUES (?, 'alice')")
            .bind(author.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let thread_id = Uuid::new_v4();
        sqlx::query("INSERT INTO threads (guid, author_id, title) VALUES (?, ?, 't')")
            .bind(thread_id.to_string())
            .bind(author.to_string())
            .execute(&pool)
            .await
            .unwrap();

        assert!(target_exists(&pool, TargetKind::Thread, thread_id).await.unwrap());
        // The same id is not a comment
        assert!(!target_exists(&pool, TargetKind::Comment, thread_id).await.unwrap());
        assert!(!target_exists(&pool, TargetKind::Thread, Uuid::new_v4()).await.unwrap());
    }
}
