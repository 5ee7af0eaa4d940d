//! # api-adapters
//!
//! The axum HTTP surface over the Campus-Board services. Everything past
//! the three account endpoints requires a bearer token; the middleware
//! resolves it once and hands handlers the `AuthUser` extension.

pub mod accounts;
pub mod auth;
pub mod comments;
pub mod engagement;
pub mod error;
pub mod media;
pub mod notices;
pub mod notifications;
pub mod state;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/notices", get(notices::feed).post(notices::create))
        .route("/notices/options", get(notices::options))
        .route("/notices/count", get(notices::count))
        .route("/notices/teachers", get(notices::by_teachers))
        .route(
            "/notices/{id}",
            get(notices::get).put(notices::update).delete(notices::delete),
        )
        .route("/users/{id}/notices", get(notices::by_user))
        .route(
            "/notices/{id}/comments",
            get(comments::list).post(comments::create_comment),
        )
        .route("/replies", post(comments::create_reply))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/replies/{id}", delete(comments::delete_reply))
        .route(
            "/notices/{id}/likes",
            get(engagement::likes)
                .post(engagement::like)
                .delete(engagement::unlike),
        )
        .route("/notices/{id}/likes/me", get(engagement::liked_by_me))
        .route(
            "/notices/{id}/shares",
            get(engagement::shares).post(engagement::share),
        )
        .route("/notifications", get(notifications::feed))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/media", post(media::upload))
        .route("/profile", put(accounts::update_profile))
        .route("/profile/password", put(accounts::change_password))
        .route("/admin/insights", get(accounts::insights))
        .route("/admin/users/{role}", get(accounts::list_users))
        .route(
            "/admin/teachers/{id}/approve",
            put(accounts::approve_teacher),
        )
        .route("/admin/teachers/{id}/reject", put(accounts::reject_teacher))
        .route(
            "/admin/teachers/{id}/enabled",
            put(accounts::toggle_teacher_enabled),
        )
        .route(
            "/admin/students/{id}/enabled",
            put(accounts::toggle_student_enabled),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
