//! Like and share endpoints. Every mutation answers with the fresh
//! summary so clients never have to re-fetch.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::json;
use uuid::Uuid;

use domains::AuthUser;
use services::engagement::EngagementSummary;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<EngagementSummary>> {
    Ok(Json(state.engagement.like(notice_id, &auth).await?))
}

pub async fn unlike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<EngagementSummary>> {
    Ok(Json(state.engagement.unlike(notice_id, &auth).await?))
}

pub async fn likes(
    State(state): State<AppState>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<EngagementSummary>> {
    Ok(Json(state.engagement.get_likes(notice_id).await?))
}

pub async fn liked_by_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let liked = state.engagement.check_liked(notice_id, &auth).await?;
    Ok(Json(json!({ "liked": liked })))
}

pub async fn share(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<EngagementSummary>> {
    Ok(Json(state.engagement.add_share(notice_id, &auth).await?))
}

pub async fn shares(
    State(state): State<AppState>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<EngagementSummary>> {
    Ok(Json(state.engagement.get_shares(notice_id).await?))
}
