use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::error::FeedError;
use crate::feed::models::{CommentDraft, PostDraft, TargetKind, VoteDirection};
use crate::feed::PostsQuery;

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upvotePost", post(upvote_post))
        .route("/downvotePost", post(downvote_post))
        .route("/upvoteComment", post(upvote_comment))
        .route("/downvoteComment", post(downvote_comment))
        .route("/posts", post(posts))
        .route("/post", post(create_post))
        .route("/comment", post(create_comment))
        .route("/comments", post(comments))
        .route("/login", post(login))
        .route("/readSession", post(read_session))
        .route("/healthz", get(health))
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.envelope_message(), "request failed");
        }
        (status, Json(json!({ "error": self.envelope_message() }))).into_response()
    }
}

// ========== Request bodies ==========

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostsRequest {
    min: Option<i64>,
    max: Option<i64>,
    limit: Option<u32>,
    sub: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRequest {
    #[serde(default)]
    post: PostDraft,
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRequest {
    #[serde(default)]
    comment: CommentDraft,
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsRequest {
    #[serde(default)]
    post_id: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadSessionRequest {
    #[serde(default)]
    session_id: String,
}

// ========== Vote routes ==========

async fn vote(
    state: &AppState,
    kind: TargetKind,
    direction: VoteDirection,
    req: VoteRequest,
) -> Result<Response, FeedError> {
    state
        .ledger
        .cast_vote(&req.id, kind, &req.session_id, direction)
        .await?;
    Ok(Json(json!({})).into_response())
}

async fn upvote_post(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Response, FeedError> {
    vote(&state, TargetKind::Post, VoteDirection::Up, req).await
}

async fn downvote_post(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Response, FeedError> {
    vote(&state, TargetKind::Post, VoteDirection::Down, req).await
}

async fn upvote_comment(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Response, FeedError> {
    vote(&state, TargetKind::Comment, VoteDirection::Up, req).await
}

async fn downvote_comment(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Response, FeedError> {
    vote(&state, TargetKind::Comment, VoteDirection::Down, req).await
}

// ========== Feed routes ==========

/// List posts. A malformed or absent body is an empty filter, not an error.
async fn posts(
    State(state): State<AppState>,
    body: Option<Json<PostsRequest>>,
) -> Result<Response, FeedError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let query = PostsQuery {
        min_score: req.min,
        max_score: req.max,
        sub: req.sub,
        limit: req.limit,
    };
    let records = state.feed.list_posts(&query).await?;
    Ok(Json(json!({ "records": records })).into_response())
}

async fn comments(
    State(state): State<AppState>,
    Json(req): Json<CommentsRequest>,
) -> Result<Response, FeedError> {
    let records = state.feed.list_comments(&req.post_id).await?;
    Ok(Json(json!({ "records": records })).into_response())
}

// ========== Posting routes ==========

async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<PostRequest>,
) -> Result<Response, FeedError> {
    let id = state.posting.create_post(&req.post, &req.session_id).await?;
    Ok(Json(json!({ "id": id })).into_response())
}

async fn create_comment(
    State(state): State<AppState>,
    Json(req): Json<CommentRequest>,
) -> Result<Response, FeedError> {
    let id = state
        .posting
        .create_comment(&req.comment, &req.session_id)
        .await?;
    Ok(Json(json!({ "id": id })).into_response())
}

// ========== Identity passthrough ==========

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, FeedError> {
    let payload = state.identity.login(&req.username, &req.password).await?;
    Ok(Json(payload).into_response())
}

async fn read_session(
    State(state): State<AppState>,
    Json(req): Json<ReadSessionRequest>,
) -> Result<Response, FeedError> {
    let session = state.identity.resolve_session(&req.session_id).await?;
    let account = state.identity.read_account(&session.user_id).await?;
    Ok(Json(json!({
        "session": { "id": session.id, "userId": session.user_id },
        "account": { "id": account.id, "username": account.username },
    }))
    .into_response())
}

async fn health() -> &'static str {
    "ok"
}
