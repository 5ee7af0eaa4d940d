//! Notification feed endpoints.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use domains::{AuthUser, Notification, ReadFilter};
use services::notifications::NotificationFeed;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedFilter {
    #[serde(default)]
    pub filter: ReadFilter,
}

pub async fn feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<FeedFilter>,
) -> ApiResult<Json<NotificationFeed>> {
    Ok(Json(state.notifications.list(&auth, query.filter).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.notifications.mark_read(id, &auth).await?))
}
