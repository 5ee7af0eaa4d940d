//! Notice endpoints: the visibility-filtered feed, CRUD, per-author
//! listings, and the filter-option listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use domains::{AuthUser, Notice};
use services::notices::{NoticeDraft, NoticeOptions, NoticeUpdate, NoticeView};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
}

/// The notices the requesting user is entitled to see, newest-first.
pub async fn feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<Vec<NoticeView>>> {
    let notices = state
        .notices
        .get_visible(&auth, query.category.as_deref())
        .await?;
    Ok(Json(notices))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(draft): Json<NoticeDraft>,
) -> ApiResult<(StatusCode, Json<Notice>)> {
    let notice = state.notices.create(draft, &auth).await?;
    Ok((StatusCode::CREATED, Json(notice)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<NoticeView>> {
    Ok(Json(state.notices.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<NoticeUpdate>,
) -> ApiResult<Json<Notice>> {
    Ok(Json(state.notices.update(id, body, &auth).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.notices.delete(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NoticeView>>> {
    Ok(Json(state.notices.list_by_user(user_id).await?))
}

/// Every notice authored by any teacher. Admin only.
pub async fn by_teachers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<NoticeView>>> {
    Ok(Json(state.notices.list_teacher_notices(&auth).await?))
}

pub async fn count(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(json!({ "count": state.notices.count().await? })))
}

pub async fn options(State(state): State<AppState>) -> ApiResult<Json<NoticeOptions>> {
    Ok(Json(state.notices.options().await?))
}
