//! Profile endpoints for the account owner and the admin user-management
//! surface: approving teachers, flipping enabled flags, listing accounts
//! by role, and the dashboard insight counts.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use auth_adapters::password;
use domains::{AuthUser, DomainError, Role, User};
use services::accounts::{Insights, ProfileUpdate};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.update_profile(&auth, req).await?))
}

/// Re-proves the current password before accepting the new one. Password
/// hashing is an identity concern, so this stays at the HTTP boundary
/// next to login rather than inside the account service.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<User>> {
    let mut user = state
        .users
        .get(auth.id)
        .await?
        .ok_or_else(|| DomainError::not_found("user", auth.id))?;
    let current_ok = user
        .password_hash
        .as_deref()
        .map(|hash| password::verify(&req.current_password, hash))
        .unwrap_or(false);
    if !current_ok {
        return Err(DomainError::Unauthorized("current password is incorrect".into()).into());
    }
    user.password_hash = Some(password::hash(&req.new_password)?);
    Ok(Json(state.users.update(user).await?))
}

pub async fn insights(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Insights>> {
    Ok(Json(state.accounts.insights(&auth).await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(role): Path<String>,
) -> ApiResult<Json<Vec<User>>> {
    let role = Role::parse(&role)
        .ok_or_else(|| DomainError::BadRequest(format!("unknown role: {role}")))?;
    Ok(Json(state.accounts.list_users(role, &auth).await?))
}

pub async fn approve_teacher(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(teacher_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.approve_teacher(teacher_id, &auth).await?))
}

pub async fn reject_teacher(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(teacher_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.reject_teacher(teacher_id, &auth).await?))
}

pub async fn toggle_teacher_enabled(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(teacher_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.toggle_teacher_enabled(teacher_id, &auth).await?))
}

pub async fn toggle_student_enabled(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(student_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.toggle_student_enabled(student_id, &auth).await?))
}
