//! Vote orchestration
//!
//! Binds identity checks, the transition machine, the store, and the
//! aggregator into the two operations the HTTP layer exposes.
//!
//! The find/decide/apply sequence is a check-then-act window: a
//! concurrent request for the same key can win the race between our
//! read and our write. The unique constraint turns that into
//! `Conflict` (create) or `NotFound` (update/delete), and the service
//! recovers with one bounded retry that re-reads and re-decides against
//! the now-current row. A replayed request after a timeout lands on the
//! same terminal state instead of crashing.

use crate::db::targets::target_exists;
use crate::error::{Error, Result};
use crate::vote::aggregate::{VoteAggregator, VoteTotals};
use crate::vote::machine::{decide, Direction, VoteAction};
use crate::vote::store::{TargetKind, VoteKey, VoteStore};
use agora_common::auth::{require_role, Identity, Role};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

/// Terminal state of a cast-vote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Updated,
    Removed,
}

impl VoteOutcome {
    /// Human-readable message for the HTTP response body
    pub fn message(self) -> &'static str {
        match self {
            VoteOutcome::Created => "Vote added successfully",
            VoteOutcome::Updated => "Vote updated successfully",
            VoteOutcome::Removed => "Vote removed successfully",
        }
    }
}

/// Public operations of the vote subsystem
#[derive(Clone)]
pub struct VoteService {
    pool: Pool<Sqlite>,
    store: VoteStore,
    aggregator: VoteAggregator,
}

impl VoteService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        let store = VoteStore::new(pool.clone());
        let aggregator = VoteAggregator::new(store.clone());
        Self {
            pool,
            store,
            aggregator,
        }
    }

    /// Cast a vote on a target, applying toggle/flip/create semantics
    ///
    /// Authorization and target validation happen before any mutation;
    /// a failed cast never leaves a partial write behind.
    pub async fn cast_vote(
        &self,
        identity: &Identity,
        voter_id: Uuid,
        target_id: Uuid,
        kind: TargetKind,
        direction: Direction,
    ) -> Result<VoteOutcome> {
        require_role(identity, &[Role::User, Role::Moderator])?;

        if identity.user_id != voter_id {
            return Err(Error::Forbidden(format!(
                "You are not authorized to vote on this {}",
                kind.as_str()
            )));
        }

        if !target_exists(&self.pool, kind, target_id).await? {
            return Err(Error::TargetNotFound(format!(
                "{} not found",
                capitalize(kind.as_str())
            )));
        }

        let key = VoteKey {
            voter_id,
            target_id,
            kind,
        };

        // One bounded retry: if apply loses a race, re-read and re-decide
        let mut attempts = 0;
        loop {
            let existing = self.store.find(&key).await?;
            let action = decide(existing.map(|v| v.direction), direction);

            match self.apply(&key, action).await {
                Ok(outcome) => {
                    info!(
                        voter = %voter_id,
                        target = %target_id,
                        kind = kind.as_str(),
                        ?outcome,
                        "vote applied"
                    );
                    return Ok(outcome);
                }
                Err(e @ (Error::Conflict(_) | Error::NotFound(_))) if attempts == 0 => {
                    debug!("vote apply lost a race, re-deciding: {}", e);
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Current totals for a target; zero votes is a valid, all-zero answer
    pub async fn get_totals(&self, target_id: Uuid, kind: TargetKind) -> Result<VoteTotals> {
        self.aggregator.totals(target_id, kind).await
    }

    async fn apply(&self, key: &VoteKey, action: VoteAction) -> Result<VoteOutcome> {
        match action {
            VoteAction::Create(direction) => {
                self.store.create(key, direction).await?;
                Ok(VoteOutcome::Created)
            }
            VoteAction::Flip(direction) => {
                self.store.update_direction(key, direction).await?;
                Ok(VoteOutcome::Updated)
            }
            VoteAction::Remove => {
                self.store.delete(key).await?;
                Ok(VoteOutcome::Removed)
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
