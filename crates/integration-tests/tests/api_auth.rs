//! The account endpoints and the bearer-token gate, exercised through the
//! router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use auth_adapters::password;
use domains::{Role, User, UserRepo};
use integration_tests::test_state;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let (state, _store) = test_state();
    let app = api_adapters::router(state);

    let response = app
        .clone()
        .oneshot(Request::get("/notices").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::get("/notices")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_verify_login_round_trip() {
    let (state, _store) = test_state();
    let app = api_adapters::router(state.clone());

    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/register",
            json!({
                "first_name": "Sami",
                "last_name": "Akter",
                "email": "sami@example.edu",
                "password": "s3cret-pass",
                "role": "student",
                "dept": "CSE",
                "session": "2022",
                "section": "A"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await;
    assert_eq!(user["is_verified"], json!(false));
    assert!(user.get("password_hash").is_none());

    // Unverified accounts cannot log in yet.
    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/login",
            json!({ "email": "sami@example.edu", "password": "s3cret-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The registration code was only logged; mint a fresh one.
    let code = state.otp.issue("sami@example.edu");
    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/verify",
            json!({ "email": "sami@example.edu", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    let token = session["token"].as_str().unwrap().to_string();

    // The issued token opens the protected surface.
    let response = app
        .oneshot(
            Request::get("/notices")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_and_admin_registrations_are_rejected() {
    let (state, _store) = test_state();
    let app = api_adapters::router(state);

    let payload = json!({
        "first_name": "Ada",
        "last_name": "Rahman",
        "email": "ada@example.edu",
        "password": "pw",
        "role": "teacher",
        "dept": "CSE"
    });
    let response = app
        .clone()
        .oneshot(json_post("/auth/register", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_post("/auth/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "first_name": "Evil",
                "last_name": "Admin",
                "email": "root@example.edu",
                "password": "pw",
                "role": "admin"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_the_password() {
    let (state, store) = test_state();
    UserRepo::insert(
        store.as_ref(),
        User {
            id: Uuid::now_v7(),
            first_name: "Known".into(),
            last_name: "User".into(),
            email: "known@example.edu".into(),
            password_hash: Some(password::hash("right-password").unwrap()),
            role: Role::Student,
            dept: Some("CSE".into()),
            session: Some("2022".into()),
            section: Some("A".into()),
            status: None,
            is_enabled: true,
            is_verified: true,
            avatar: None,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    let app = api_adapters::router(state);

    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/login",
            json!({ "email": "known@example.edu", "password": "right-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    assert!(session["token"].as_str().is_some());

    let response = app
        .oneshot(json_post(
            "/auth/login",
            json!({ "email": "known@example.edu", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
