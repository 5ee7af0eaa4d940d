//! Bearer-token middleware and the account endpoints: register, OTP
//! verification, and login.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auth_adapters::password;
use domains::{DomainError, Role, TeacherStatus, User};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Resolves the `Authorization: Bearer` header to an [`domains::AuthUser`]
/// and stashes it in request extensions for the handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| DomainError::Unauthorized("missing bearer token".into()))?;
    let auth = state.credentials.authenticate(token).await?;
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub dept: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

/// Creates an unverified account and mails a one-time code. Admin
/// accounts are provisioned out of band, never self-registered.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<User>> {
    if req.role == Role::Admin {
        return Err(DomainError::BadRequest("admin accounts cannot self-register".into()).into());
    }
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(DomainError::Conflict("email already registered".into()).into());
    }

    let user = state
        .users
        .insert(User {
            id: Uuid::now_v7(),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash: Some(password::hash(&req.password)?),
            role: req.role,
            dept: req.dept,
            session: req.session,
            section: req.section,
            status: (req.role == Role::Teacher).then_some(TeacherStatus::Pending),
            is_enabled: true,
            is_verified: false,
            avatar: None,
            created_at: Utc::now(),
        })
        .await?;

    let code = state.otp.issue(&user.email);
    if let Err(e) = state.mailer.send_otp(&user.email, &code).await {
        // The account exists; the user can request a fresh code.
        tracing::warn!(email = %user.email, error = %e, "otp mail failed");
    }
    Ok(Json(user))
}

/// Confirms the one-time code and logs the account in.
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if !state.otp.verify(&req.email, &req.code) {
        return Err(DomainError::Unauthorized("invalid or expired code".into()).into());
    }
    let mut user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| DomainError::Unauthorized("invalid or expired code".into()))?;
    user.is_verified = true;
    let user = state.users.update(user).await?;
    let token = state.credentials.issue(&user).await?;
    Ok(Json(SessionResponse { token, user }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let invalid = || DomainError::Unauthorized("invalid email or password".into());
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;
    let verified = user
        .password_hash
        .as_deref()
        .map(|hash| password::verify(&req.password, hash))
        .unwrap_or(false);
    if !verified {
        return Err(invalid().into());
    }
    if !user.is_verified {
        return Err(DomainError::Forbidden("account is not verified".into()).into());
    }
    let token = state.credentials.issue(&user).await?;
    Ok(Json(SessionResponse { token, user }))
}
