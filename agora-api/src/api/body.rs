//! JSON body extraction with taxonomy-conformant rejections
//!
//! axum's default `Json` rejection answers 422 with a plain-text body
//! that echoes deserializer detail. Every error leaving this API
//! carries the `{error, message}` shape, so handlers take [`ApiJson`]
//! instead: any body rejection (malformed JSON, wrong field types,
//! oversized payload) becomes a 400 `InvalidInput`.

use crate::error::Error;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// JSON request body whose rejection stays inside the error taxonomy
#[derive(Debug, Clone, Copy)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                // Full rejection detail stays in the logs only
                debug!("rejected request body: {}", rejection);
                Err(Error::InvalidInput(
                    "Request body must be valid JSON with the expected fields".to_string(),
                ))
            }
        }
    }
}
