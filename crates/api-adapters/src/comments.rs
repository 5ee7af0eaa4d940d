//! Discussion endpoints: the threaded listing, comment and reply
//! creation, and subtree deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use domains::{AuthUser, DomainError, ReplyParent};
use services::comments::{CommentNode, CommentThread, ReplyNode};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// Exactly one of the two parent ids must be present; this boundary is
/// where "both or neither" becomes a 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub text: String,
    pub comment_id: Option<Uuid>,
    pub parent_reply_id: Option<Uuid>,
}

impl CreateReplyRequest {
    fn parent(&self) -> Result<ReplyParent, DomainError> {
        match (self.comment_id, self.parent_reply_id) {
            (Some(cid), None) => Ok(ReplyParent::Comment(cid)),
            (None, Some(rid)) => Ok(ReplyParent::Reply(rid)),
            _ => Err(DomainError::BadRequest(
                "exactly one of commentId and parentReplyId is required".into(),
            )),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(notice_id): Path<Uuid>,
) -> ApiResult<Json<CommentThread>> {
    Ok(Json(state.comments.list_comments(notice_id).await?))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notice_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentNode>)> {
    let node = state
        .comments
        .create_comment(notice_id, &auth, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn create_reply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateReplyRequest>,
) -> ApiResult<(StatusCode, Json<ReplyNode>)> {
    let parent = body.parent()?;
    let node = state.comments.create_reply(parent, &auth, &body.text).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.comments.delete_comment(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.comments.delete_reply(id, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}
