//! Raw-bytes upload. The response URL is what clients put in the `image`
//! and `avatar` fields; the core treats it as opaque.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use serde_json::json;

use domains::DomainError;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    if body.is_empty() {
        return Err(DomainError::BadRequest("empty upload".into()).into());
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref());
    let url = state.blobs.store(body, content_type, "notices").await?;
    Ok(Json(json!({ "url": url })))
}
