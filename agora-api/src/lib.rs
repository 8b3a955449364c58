//! # Agora API (agora-api)
//!
//! HTTP backend for the agora forum's voting subsystem.
//!
//! **Purpose:** Accept authenticated vote casts on threads and comments,
//! maintain at most one vote per (voter, target) pair with toggle/flip
//! semantics, and serve per-target vote totals.
//!
//! **Architecture:** axum handlers over a SQLite-backed vote store; the
//! pure transition logic lives in [`vote::machine`] and is applied
//! through single-statement mutations guarded by a unique constraint.

pub mod api;
pub mod db;
pub mod error;
pub mod vote;

pub use error::{Error, Result};
