//! Database access for agora-api

pub mod targets;
