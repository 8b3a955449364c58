//! Vote transition rules
//!
//! A voter's relationship to a target is three-state: no vote, upvoted,
//! downvoted. [`decide`] is the single place those transitions are
//! defined; everything else in the subsystem just applies its output.
//!
//! Re-casting the direction a voter already holds is a cancellation,
//! not a no-op and not an error. That asymmetry is a product decision
//! carried over intact: the same request body that creates a vote will
//! destroy it on the second submission.

/// Polarity of a vote: Up (+1) or Down (-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Wire/storage representation: +1 for Up, -1 for Down
    pub fn value(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// Parse the wire representation; anything outside {1, -1} is invalid
    pub fn from_value(value: i64) -> Option<Direction> {
        match value {
            1 => Some(Direction::Up),
            -1 => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Mutation the store must apply for a decided transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    /// No existing vote: create one with the requested direction
    Create(Direction),
    /// Existing vote with the opposite direction: flip it
    Flip(Direction),
    /// Existing vote with the same direction: toggle-off, remove it
    Remove,
}

/// Decide the transition for a requested vote against the current state
///
/// Pure function, no I/O. `existing` is the direction of the voter's
/// current vote on the target, if any.
pub fn decide(existing: Option<Direction>, requested: Direction) -> VoteAction {
    match existing {
        None => VoteAction::Create(requested),
        Some(current) if current == requested => VoteAction::Remove,
        Some(_) => VoteAction::Flip(requested),
    }
}
