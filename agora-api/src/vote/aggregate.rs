//! Vote totals per target
//!
//! Counts are recomputed from the vote rows on every read; no cached
//! aggregate field exists to drift out of sync. A target with zero
//! votes yields all zeros, never an error.

use crate::error::Result;
use crate::vote::machine::Direction;
use crate::vote::store::{TargetKind, VoteStore};
use serde::Serialize;
use uuid::Uuid;

/// Aggregate counts for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTotals {
    pub upvotes: i64,
    pub downvotes: i64,
    /// upvotes - downvotes
    pub net: i64,
}

/// Computes totals from the vote store
#[derive(Clone)]
pub struct VoteAggregator {
    store: VoteStore,
}

impl VoteAggregator {
    pub fn new(store: VoteStore) -> Self {
        Self { store }
    }

    /// Compute up/down/net counts for a target
    pub async fn totals(&self, target_id: Uuid, kind: TargetKind) -> Result<VoteTotals> {
        let upvotes = self
            .store
            .count_by_direction(target_id, kind, Direction::Up)
            .await?;
        let downvotes = self
            .store
            .count_by_direction(target_id, kind, Direction::Down)
            .await?;

        Ok(VoteTotals {
            upvotes,
            downvotes,
            net: upvotes - downvotes,
        })
    }
}
