//! Bearer-token identity extraction
//!
//! Custom extractor pattern: handlers that need an authenticated caller
//! take a [`Requester`] argument, and token verification failures reject
//! the request with 401 before the handler body runs. Verification
//! itself is framework-free and lives in `agora_common::auth`.

use crate::api::server::AppContext;
use crate::error::Error;
use agora_common::auth::{verify_token, Identity};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

/// The authenticated principal making the request
#[derive(Debug, Clone, Copy)]
pub struct Requester(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    AppContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AppContext::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                Error::Unauthenticated("Missing Authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            Error::Unauthenticated("Authorization header must be a Bearer token".to_string())
        })?;

        let identity = verify_token(token, ctx.token_secret)?;
        Ok(Requester(identity))
    }
}
