//! Token-based authentication
//!
//! Tokens are self-contained and validated against a server secret,
//! so verification needs no per-request database lookup:
//!
//! ```text
//! <user_id>.<role>.<expires_ms>.<signature>
//! ```
//!
//! where `signature = SHA-256(user_id.role.expires_ms + secret)` as 64
//! hex characters. The secret is an i64 stored in the `settings` table
//! and generated on first run.
//!
//! This module contains only pure functions and database operations.
//! No HTTP framework dependencies - those live in module-specific code.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Principal roles recognized by the forum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Moderator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            _ => None,
        }
    }
}

/// Authenticated principal resolved from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Check that an identity holds one of the allowed roles
///
/// Pure check, no side effects. Returns `Forbidden` (not
/// `Unauthenticated`) on role mismatch: the caller is known, just not
/// permitted.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Role '{}' is not permitted for this operation",
            identity.role.as_str()
        )))
    }
}

/// Mint a signed token for a user
pub fn mint_token(user_id: Uuid, role: Role, ttl: Duration, secret: i64) -> String {
    let expires_ms = now_ms() + ttl.as_millis() as i64;
    let payload = format!("{}.{}.{}", user_id, role.as_str(), expires_ms);
    let signature = sign(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Verify a token and resolve the identity it carries
///
/// Fails with `Unauthenticated` on malformed shape, unknown role,
/// expiry, or signature mismatch.
pub fn verify_token(token: &str, secret: i64) -> Result<Identity> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 4 {
        return Err(Error::Unauthenticated("Malformed token".to_string()));
    }

    let user_id = Uuid::parse_str(parts[0])
        .map_err(|_| Error::Unauthenticated("Malformed token".to_string()))?;
    let role = Role::parse(parts[1])
        .ok_or_else(|| Error::Unauthenticated("Malformed token".to_string()))?;
    let expires_ms: i64 = parts[2]
        .parse()
        .map_err(|_| Error::Unauthenticated("Malformed token".to_string()))?;

    let payload = format!("{}.{}.{}", parts[0], parts[1], parts[2]);
    if sign(&payload, secret) != parts[3] {
        return Err(Error::Unauthenticated("Invalid token signature".to_string()));
    }

    if expires_ms < now_ms() {
        return Err(Error::Unauthenticated("Token expired".to_string()));
    }

    Ok(Identity { user_id, role })
}

fn sign(payload: &str, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ========================================
// Secret Management
// ========================================

/// Load the token signing secret from database settings
///
/// Generates and stores a new secret if none exists yet.
pub async fn load_token_secret(db: &SqlitePool) -> Result<i64> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_token_secret'")
            .fetch_optional(db)
            .await?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("Invalid token secret in settings: {}", e))),
        None => initialize_token_secret(db).await,
    }
}

/// Generate a cryptographically random non-zero secret and store it
pub async fn initialize_token_secret(db: &SqlitePool) -> Result<i64> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_token_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await?;

    Ok(secret)
}

// ========================================
// Tests
// ========================================
