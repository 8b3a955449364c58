//! # Agora Common Library
//!
//! Shared code for the agora forum backend:
//! - Error taxonomy
//! - Configuration resolution (CLI > env > config file > default)
//! - Database initialization and schema
//! - Token-based authentication (identity, roles)

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use auth::{Identity, Role};
pub use error::{Error, Result};
