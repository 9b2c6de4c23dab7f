//! HTTP API endpoints for profiles, the leaderboard and question moderation.
//!
//! Gameplay itself runs over the WebSocket in [`crate::ws`]; everything here
//! is plain request/response.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::admin_auth_middleware;
use crate::protocol::ThemeInfo;
use crate::ranking::{RankingEntry, DEFAULT_RANKING_LIMIT};
use crate::state::{AppState, ProfileSummary, QuizSnapshot};
use crate::store::{ProfileStore, StoreError, SuggestionDraft};
use crate::types::{Question, QuestionId, UserId, UserProfile};
use crate::ws;

/// Largest leaderboard a client may ask for
const MAX_RANKING_LIMIT: usize = 100;

/// Error response: a status code and a plain-text message
#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError(status, e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/pending", get(list_pending))
        .route("/api/admin/questions", post(inject_question))
        .route("/api/admin/questions/{id}", delete(reject_question))
        .route("/api/admin/questions/{id}/approve", post(approve_question))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{uid}/toggle-admin", post(toggle_admin))
        .route("/api/admin/export", get(export_snapshot))
        .route("/api/admin/import", post(import_snapshot))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/api/themes", get(list_themes))
        .route("/api/users", post(register_user))
        .route("/api/users/{uid}", get(get_profile))
        .route("/api/ranking", get(ranking))
        .route("/api/suggestions", post(submit_suggestion))
        .route("/ws", get(ws::ws_handler))
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// GET /api/themes
pub async fn list_themes() -> Json<Vec<ThemeInfo>> {
    Json(ThemeInfo::all())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Register a player. A taken email is refused with 409 rather than
/// handing back someone else's profile.
///
/// POST /api/users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = state.register_user(req.email, req.display_name).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/users/{uid}
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<UserId>,
) -> ApiResult<Json<ProfileSummary>> {
    Ok(Json(state.profile_summary(&uid).await?))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<usize>,
}

/// GET /api/ranking?limit=N
pub async fn ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<Vec<RankingEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RANKING_LIMIT)
        .clamp(1, MAX_RANKING_LIMIT);
    Ok(Json(state.ranking(limit).await?))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionRequest {
    #[serde(flatten)]
    pub draft: SuggestionDraft,
    /// Submitting player, recorded as the suggester
    #[serde(default)]
    pub uid: Option<UserId>,
}

/// Public suggestions always wait for moderation; admins publish directly
/// through the authenticated `POST /api/admin/questions`.
///
/// POST /api/suggestions
pub async fn submit_suggestion(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestionRequest>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let suggested_by = match &req.uid {
        Some(uid) => Some(state.profiles.get(uid).await?.email),
        None => None,
    };

    let question = state
        .submit_suggestion(req.draft, suggested_by, false)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// GET /api/admin/pending
pub async fn list_pending(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Question>>> {
    Ok(Json(state.pending_questions().await?))
}

/// Add a question that is live immediately.
///
/// POST /api/admin/questions
pub async fn inject_question(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<SuggestionDraft>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let question = state.submit_suggestion(draft, None, true).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Outcome of a moderation action; repeating an action is not an error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationResult {
    pub id: QuestionId,
    pub changed: bool,
}

/// POST /api/admin/questions/{id}/approve
pub async fn approve_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<QuestionId>,
) -> ApiResult<Json<ModerationResult>> {
    let changed = state.approve_question(&id).await?;
    Ok(Json(ModerationResult { id, changed }))
}

/// DELETE /api/admin/questions/{id}
pub async fn reject_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<QuestionId>,
) -> ApiResult<Json<ModerationResult>> {
    let changed = state.reject_question(&id).await?;
    Ok(Json(ModerationResult { id, changed }))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<UserProfile>>> {
    let mut users = state.profiles.list().await?;
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.uid.cmp(&b.uid)));
    Ok(Json(users))
}

/// POST /api/admin/users/{uid}/toggle-admin
pub async fn toggle_admin(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<UserId>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.toggle_admin(&uid).await?))
}

/// Export questions and profiles as JSON.
///
/// GET /api/admin/export
pub async fn export_snapshot(State(state): State<Arc<AppState>>) -> Json<QuizSnapshot> {
    Json(state.export_snapshot().await)
}

/// Replace all questions and profiles with an exported snapshot.
///
/// POST /api/admin/import
pub async fn import_snapshot(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<QuizSnapshot>,
) -> Response {
    match state.import_snapshot(snapshot).await {
        Ok(()) => (StatusCode::OK, "Snapshot imported successfully").into_response(),
        Err(e) => {
            tracing::error!("Snapshot import failed: {}", e);
            (StatusCode::BAD_REQUEST, format!("Import failed: {}", e)).into_response()
        }
    }
}
