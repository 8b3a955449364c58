//! HTTP request handlers
//!
//! Implements the REST endpoints for vote casting and vote totals.
//! Path ids arrive as raw strings and are validated as UUIDs here, so a
//! malformed id is a 400 before anything touches the database. The one
//! exception is the cast path's user segment: the identity match runs
//! on the raw string first, so posting to another user's vote path is
//! Forbidden even when the ids are malformed.

use crate::api::body::ApiJson;
use crate::api::identity::Requester;
use crate::api::server::AppContext;
use crate::error::{Error, Result};
use crate::vote::{Direction, TargetKind, VoteOutcome, VoteTotals};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    /// 1 for upvote, -1 for downvote
    direction: i64,
}

#[derive(Debug, Serialize)]
pub struct VoteMessageResponse {
    message: &'static str,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "agora_api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Vote Casting Endpoints
// ============================================================================

/// POST /vote/thread/:thread_id/:user_id - Cast a vote on a thread
pub async fn cast_thread_vote(
    State(ctx): State<AppContext>,
    Requester(identity): Requester,
    Path((thread_id, user_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<CastVoteRequest>,
) -> Result<(StatusCode, Json<VoteMessageResponse>)> {
    cast_vote(ctx, identity, TargetKind::Thread, &thread_id, &user_id, req).await
}

/// POST /vote/comment/:comment_id/:user_id - Cast a vote on a comment
pub async fn cast_comment_vote(
    State(ctx): State<AppContext>,
    Requester(identity): Requester,
    Path((comment_id, user_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<CastVoteRequest>,
) -> Result<(StatusCode, Json<VoteMessageResponse>)> {
    cast_vote(ctx, identity, TargetKind::Comment, &comment_id, &user_id, req).await
}

async fn cast_vote(
    ctx: AppContext,
    identity: agora_common::Identity,
    kind: TargetKind,
    target_id: &str,
    user_id: &str,
    req: CastVoteRequest,
) -> Result<(StatusCode, Json<VoteMessageResponse>)> {
    // Identity match before format validation, compared as raw strings:
    // a mismatched path segment is Forbidden, not a parse error
    if user_id != identity.user_id.to_string() {
        return Err(Error::Forbidden(format!(
            "You are not authorized to vote on this {}",
            kind.as_str()
        )));
    }

    let target_id = parse_target_id(target_id, kind)?;

    let direction = Direction::from_value(req.direction).ok_or_else(|| {
        Error::InvalidInput(
            "Invalid vote value, vote must be 1 for upvote or -1 for downvote".to_string(),
        )
    })?;

    let outcome = ctx
        .votes
        .cast_vote(&identity, identity.user_id, target_id, kind, direction)
        .await?;

    // Creation is 201; update and removal are both 200 successes
    let status = match outcome {
        VoteOutcome::Created => StatusCode::CREATED,
        VoteOutcome::Updated | VoteOutcome::Removed => StatusCode::OK,
    };

    Ok((
        status,
        Json(VoteMessageResponse {
            message: outcome.message(),
        }),
    ))
}

// ============================================================================
// Vote Totals Endpoints
// ============================================================================

/// GET /vote/thread/:thread_id - Current vote totals for a thread
pub async fn thread_totals(
    State(ctx): State<AppContext>,
    Path(thread_id): Path<String>,
) -> Result<Json<VoteTotals>> {
    let target_id = parse_target_id(&thread_id, TargetKind::Thread)?;
    let totals = ctx.votes.get_totals(target_id, TargetKind::Thread).await?;
    Ok(Json(totals))
}

/// GET /vote/comment/:comment_id - Current vote totals for a comment
pub async fn comment_totals(
    State(ctx): State<AppContext>,
    Path(comment_id): Path<String>,
) -> Result<Json<VoteTotals>> {
    let target_id = parse_target_id(&comment_id, TargetKind::Comment)?;
    let totals = ctx.votes.get_totals(target_id, TargetKind::Comment).await?;
    Ok(Json(totals))
}

fn parse_target_id(raw: &str, kind: TargetKind) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        let label = match kind {
            TargetKind::Thread => "Invalid thread ID",
            TargetKind::Comment => "Invalid comment ID",
        };
        Error::InvalidInput(label.to_string())
    })
}
