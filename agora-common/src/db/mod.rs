//! Database initialization and schema

pub mod init;
pub mod settings;

pub use init::*;
