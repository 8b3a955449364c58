//! Vote row persistence
//!
//! One row per (voter, target) pair, keyed by [`VoteKey`]. Each
//! mutation is a single SQL statement, so an apply either lands fully
//! or not at all. The composite primary key in the schema is the
//! authoritative serialization point for concurrent duplicate creates;
//! this module surfaces that as [`Error::Conflict`] so the service can
//! re-decide against the now-current row.

use crate::error::{Error, Result};
use crate::vote::machine::Direction;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Kind of entity a vote targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Thread,
    Comment,
}

impl TargetKind {
    /// Storage representation, also used in log lines and messages
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Thread => "thread",
            TargetKind::Comment => "comment",
        }
    }
}

/// Identity of a vote: at most one row exists per key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteKey {
    pub voter_id: Uuid,
    pub target_id: Uuid,
    pub kind: TargetKind,
}

/// A stored vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRecord {
    pub key: VoteKey,
    pub direction: Direction,
}

/// Persistence operations over vote rows
#[derive(Clone)]
pub struct VoteStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl VoteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Find the vote for a key, if any
    pub async fn find(&self, key: &VoteKey) -> Result<Option<VoteRecord>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT direction FROM votes WHERE voter_id = ? AND target_id = ? AND target_kind = ?",
        )
        .bind(key.voter_id.to_string())
        .bind(key.target_id.to_string())
        .bind(key.kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some((value,)) => {
                let direction = Direction::from_value(value).ok_or_else(|| {
                    Error::Internal(format!("Stored vote has invalid direction {}", value))
                })?;
                Ok(Some(VoteRecord {
                    key: *key,
                    direction,
                }))
            }
        }
    }

    /// Create a vote; a concurrent create for the same key loses with `Conflict`
    pub async fn create(&self, key: &VoteKey, direction: Direction) -> Result<VoteRecord> {
        let result = sqlx::query(
            "INSERT INTO votes (voter_id, target_id, target_kind, direction) VALUES (?, ?, ?, ?)",
        )
        .bind(key.voter_id.to_string())
        .bind(key.target_id.to_string())
        .bind(key.kind.as_str())
        .bind(direction.value())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(VoteRecord {
                key: *key,
                direction,
            }),
            Err(e) if is_unique_violation(&e) => Err(Error::Conflict(format!(
                "Vote already exists for this {}",
                key.kind.as_str()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Change the direction of an existing vote; `NotFound` if it vanished
    pub async fn update_direction(&self, key: &VoteKey, direction: Direction) -> Result<VoteRecord> {
        let result = sqlx::query(
            "UPDATE votes SET direction = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE voter_id = ? AND target_id = ? AND target_kind = ?",
        )
        .bind(direction.value())
        .bind(key.voter_id.to_string())
        .bind(key.target_id.to_string())
        .bind(key.kind.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "No vote to update for this {}",
                key.kind.as_str()
            )));
        }

        Ok(VoteRecord {
            key: *key,
            direction,
        })
    }

    /// Delete an existing vote; `NotFound` if it vanished
    pub async fn delete(&self, key: &VoteKey) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM votes WHERE voter_id = ? AND target_id = ? AND target_kind = ?",
        )
        .bind(key.voter_id.to_string())
        .bind(key.target_id.to_string())
        .bind(key.kind.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "No vote to remove for this {}",
                key.kind.as_str()
            )));
        }

        Ok(())
    }

    /// Count votes of one direction for a target
    pub async fn count_by_direction(
        &self,
        target_id: Uuid,
        kind: TargetKind,
        direction: Direction,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM votes WHERE target_id = ? AND target_kind = ? AND direction = ?",
        )
        .bind(target_id.to_string())
        .bind(kind.as_str())
        .bind(direction.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
