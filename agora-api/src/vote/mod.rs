//! Vote subsystem
//!
//! Split the way the data flows:
//! - [`machine`] - pure transition rules (no I/O)
//! - [`store`] - persistence of vote rows, one row per (voter, target)
//! - [`aggregate`] - fresh per-target counts derived from the store
//! - [`service`] - orchestration of cast-vote and get-totals

pub mod aggregate;
pub mod machine;
pub mod service;
pub mod store;

pub use aggregate::{VoteAggregator, VoteTotals};
pub use machine::{decide, Direction, VoteAction};
pub use service::{VoteOutcome, VoteService};
pub use store::{TargetKind, VoteKey, VoteRecord, VoteStore};
