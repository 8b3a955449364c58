//! Integration tests for the agora vote API
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`
//! against a temporary SQLite database, covering:
//! - Health check
//! - Authentication and the self-only rule
//! - Input validation (ids, direction)
//! - The toggle/flip vote lifecycle and totals

use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use agora_api::api::{create_router, AppContext};
use agora_common::auth::{mint_token, Role};
use agora_common::db::init_database;

struct TestServer {
    _dir: TempDir,
    app: axum::Router,
    pool: Pool<Sqlite>,
    secret: i64,
}

/// Test helper to create a test server over a fresh database
async fn setup_test_server() -> TestServer {
    let dir = TempDir::new().expect("create temp dir");
    let pool = init_database(&dir.path().join("agora.db"))
        .await
        .expect("init database");

    let secret = agora_common::auth::load_token_secret(&pool)
        .await
        .expect("load secret");

    let max_body_bytes = agora_common::db::settings::max_body_size_bytes(&pool)
        .await
        .expect("load settings");

    let ctx = AppContext::new(pool.clone(), secret, max_body_bytes);
    TestServer {
        _dir: dir,
        app: create_router(ctx),
        pool,
        secret,
    }
}

impl TestServer {
    fn token_for(&self, user_id: Uuid) -> String {
        mint_token(user_id, Role::User, Duration::from_secs(3600), self.secret)
    }

    async fn seed_user(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (guid, username) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    async fn seed_thread(&self, author: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO threads (guid, author_id, title) VALUES (?, ?, 'a thread')")
            .bind(id.to_string())
            .bind(author.to_string())
            .execute(&self.pool)
            .await
            .unwrap();
        id
    }

    async fn seed_comment(&self, thread: Uuid, author: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO comments (guid, thread_id, author_id, body) VALUES (?, ?, ?, 'a comment')",
        )
        .bind(id.to_string())
        .bind(thread.to_string())
        .bind(author.to_string())
        .execute(&self.pool)
        .await
        .unwrap();
        id
    }

    async fn vote_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Helper function to make HTTP requests to the test server
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        _ => panic!("Unsupported method"),
    };

    let mut request = Request::builder().method(method).uri(path);

    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = if let Some(json_body) = body {
        request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };

    (status, json_body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = setup_test_server().await;

    let (status, body) = make_request(&server.app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "agora_api");
}

#[tokio::test]
async fn test_cast_without_token_is_unauthorized() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;

    let path = format!("/vote/thread/{}/{}", thread, alice);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        None,
        Some(json!({"direction": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["error"], "unauthenticated");
    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_cast_for_other_user_is_forbidden() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let bob = server.seed_user("bob").await;
    let thread = server.seed_thread(alice).await;

    // Alice's token, Bob's id in the path
    let token = server.token_for(alice);
    let path = format!("/vote/thread/{}/{}", thread, bob);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");
    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let token = server.token_for(alice);

    let path = format!("/vote/thread/not-a-uuid/{}", alice);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["message"], "Invalid thread ID");

    let (status, body) = make_request(&server.app, "GET", "/vote/comment/xyz", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["message"], "Invalid comment ID");
}

#[tokio::test]
async fn test_mismatched_path_user_wins_over_malformed_ids() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let bob = server.seed_user("bob").await;
    let token = server.token_for(alice);

    // Bad thread id but Bob's user segment: the identity match is
    // checked first, so this is Forbidden rather than a 400
    let path = format!("/vote/thread/not-a-uuid/{}", bob);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");

    // Same when the user segment itself is not a UUID
    let (status, body) = make_request(
        &server.app,
        "POST",
        "/vote/comment/not-a-uuid/also-not-a-uuid",
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");
    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request_with_error_shape() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;
    let token = server.token_for(alice);
    let path = format!("/vote/thread/{}/{}", thread, alice);

    // Wrong type for direction: 400 with the standard error body, not
    // a framework 422 leaking deserializer detail
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": "up"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].is_string());

    // Missing body entirely
    let (status, body) = make_request(&server.app, "POST", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "invalid_input");

    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;
    let token = server.token_for(alice);
    let path = format!("/vote/thread/{}/{}", thread, alice);

    // Past the 1 MiB default body cap (but under axum's built-in 2 MB
    // limit, so this exercises the configured setting)
    let padding = "x".repeat(1_500_000);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1, "padding": padding})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "invalid_input");
    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_direction_outside_range_is_rejected() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;
    let token = server.token_for(alice);

    let path = format!("/vote/thread/{}/{}", thread, alice);
    for bad in [0, 2, -2] {
        let (status, body) = make_request(
            &server.app,
            "POST",
            &path,
            Some(&token),
            Some(json!({"direction": bad})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap()["error"], "invalid_input");
    }

    assert_eq!(server.vote_count().await, 0);
}

#[tokio::test]
async fn test_vote_on_missing_target_is_not_found() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let token = server.token_for(alice);

    let path = format!("/vote/thread/{}/{}", Uuid::new_v4(), alice);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "target_not_found");
}

#[tokio::test]
async fn test_thread_vote_lifecycle_and_totals() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let bob = server.seed_user("bob").await;
    let thread = server.seed_thread(alice).await;

    let alice_token = server.token_for(alice);
    let bob_token = server.token_for(bob);
    let totals_path = format!("/vote/thread/{}", thread);

    // Alice casts Up: created
    let path = format!("/vote/thread/{}/{}", thread, alice);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&alice_token),
        Some(json!({"direction": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.unwrap()["message"], "Vote added successfully");

    let (status, body) = make_request(&server.app, "GET", &totals_path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.unwrap(),
        json!({"upvotes": 1, "downvotes": 0, "net": 1})
    );

    // Bob casts Down
    let path = format!("/vote/thread/{}/{}", thread, bob);
    let (status, _) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&bob_token),
        Some(json!({"direction": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = make_request(&server.app, "GET", &totals_path, None, None).await;
    assert_eq!(
        body.unwrap(),
        json!({"upvotes": 1, "downvotes": 1, "net": 0})
    );

    // Alice casts Up again: toggle-off, 200
    let path = format!("/vote/thread/{}/{}", thread, alice);
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&alice_token),
        Some(json!({"direction": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["message"], "Vote removed successfully");

    let (_, body) = make_request(&server.app, "GET", &totals_path, None, None).await;
    assert_eq!(
        body.unwrap(),
        json!({"upvotes": 0, "downvotes": 1, "net": -1})
    );
}

#[tokio::test]
async fn test_flip_returns_updated() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;
    let token = server.token_for(alice);

    let path = format!("/vote/thread/{}/{}", thread, alice);
    make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": 1})),
    )
    .await;

    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["message"], "Vote updated successfully");

    // Still a single row for the (voter, target) pair
    assert_eq!(server.vote_count().await, 1);
}

#[tokio::test]
async fn test_comment_vote_removal_is_a_success() {
    let server = setup_test_server().await;
    let alice = server.seed_user("alice").await;
    let thread = server.seed_thread(alice).await;
    let comment = server.seed_comment(thread, alice).await;
    let token = server.token_for(alice);

    let path = format!("/vote/comment/{}/{}", comment, alice);
    let (status, _) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Toggle-off on a comment is 200, same as for threads
    let (status, body) = make_request(
        &server.app,
        "POST",
        &path,
        Some(&token),
        Some(json!({"direction": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["message"], "Vote removed successfully");
}

#[tokio::test]
async fn test_totals_for_unvoted_target_are_zero() {
    let server = setup_test_server().await;

    let (status, body) = make_request(
        &server.app,
        "GET",
        &format!("/vote/thread/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.unwrap(),
        json!({"upvotes": 0, "downvotes": 0, "net": 0})
    );
}
