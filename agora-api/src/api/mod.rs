//! HTTP API for agora-api

pub mod body;
pub mod handlers;
pub mod identity;
pub mod server;

pub use server::{create_router, AppContext};
