//! Admin user management end to end: teacher approval unlocks the
//! authoring gate, enable toggles gate comments, and the profile and
//! password endpoints exercised through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use auth_adapters::password;
use domains::{DomainError, Role, Target, TeacherStatus, User, UserRepo};
use integration_tests::{auth, bearer, seed_admin, seed_student, seed_teacher, test_state};
use services::notices::NoticeDraft;
use storage_adapters::MemoryStore;

fn draft(text: &str) -> NoticeDraft {
    NoticeDraft {
        text: text.into(),
        category: "General".into(),
        target: Target::All,
        department: None,
        session: None,
        section: None,
        image: None,
    }
}

async fn seed_pending_teacher(store: &MemoryStore) -> User {
    let mut teacher = seed_teacher(store, "CSE").await;
    teacher.status = Some(TeacherStatus::Pending);
    UserRepo::update(store, teacher).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_put(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::AUTHORIZATION, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn approval_unlocks_notice_authoring() {
    let (state, store) = test_state();
    let admin = seed_admin(&store).await;
    let teacher = seed_pending_teacher(&store).await;

    let err = state
        .notices
        .create(draft("too early"), &auth(&teacher))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    state
        .accounts
        .approve_teacher(teacher.id, &auth(&admin))
        .await
        .unwrap();

    state
        .notices
        .create(draft("welcome aboard"), &auth(&teacher))
        .await
        .unwrap();
}

#[tokio::test]
async fn rejection_keeps_the_teacher_locked_out() {
    let (state, store) = test_state();
    let admin = seed_admin(&store).await;
    let teacher = seed_pending_teacher(&store).await;

    let rejected = state
        .accounts
        .reject_teacher(teacher.id, &auth(&admin))
        .await
        .unwrap();
    assert_eq!(rejected.status, Some(TeacherStatus::Pending));
    assert!(!rejected.is_enabled);

    let err = state
        .notices
        .create(draft("still out"), &auth(&teacher))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
}

#[tokio::test]
async fn reenabled_student_can_comment_again() {
    let (state, store) = test_state();
    let admin = seed_admin(&store).await;
    let teacher = seed_teacher(&store, "CSE").await;
    let student = seed_student(&store, "CSE", "2022", "A").await;
    let notice = state
        .notices
        .create(draft("open thread"), &auth(&teacher))
        .await
        .unwrap();

    state
        .accounts
        .toggle_student_enabled(student.id, &auth(&admin))
        .await
        .unwrap();
    let err = state
        .comments
        .create_comment(notice.id, &auth(&student), "blocked")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    state
        .accounts
        .toggle_student_enabled(student.id, &auth(&admin))
        .await
        .unwrap();
    state
        .comments
        .create_comment(notice.id, &auth(&student), "back again")
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_surface_is_admin_only() {
    let (state, store) = test_state();
    let admin = seed_admin(&store).await;
    let teacher = seed_teacher(&store, "CSE").await;
    seed_student(&store, "CSE", "2022", "A").await;
    let app = api_adapters::router(state);

    let response = app
        .clone()
        .oneshot(
            Request::get("/admin/insights")
                .header(header::AUTHORIZATION, bearer(&teacher))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::get("/admin/insights")
                .header(header::AUTHORIZATION, bearer(&admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let insights = body_json(response).await;
    assert_eq!(insights["students"], json!(1));
    assert_eq!(insights["teachers"], json!(1));

    let response = app
        .oneshot(
            Request::get("/admin/users/teacher")
                .header(header::AUTHORIZATION, bearer(&admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let teachers = body_json(response).await;
    assert_eq!(teachers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn profile_edit_and_password_change_round_trip() {
    let (state, store) = test_state();
    let student = UserRepo::insert(
        store.as_ref(),
        User {
            id: Uuid::now_v7(),
            first_name: "Mina".into(),
            last_name: "Khan".into(),
            email: "mina@example.edu".into(),
            password_hash: Some(password::hash("old-pass").unwrap()),
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
        .oneshot(json_put(
            "/profile",
            &bearer(&student),
            json!({ "first_name": "Amina", "section": "B" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["first_name"], json!("Amina"));
    assert_eq!(updated["section"], json!("B"));
    assert_eq!(updated["dept"], json!("CSE"));

    // The wrong current password is refused; the right one rotates it.
    let response = app
        .clone()
        .oneshot(json_put(
            "/profile/password",
            &bearer(&student),
            json!({ "current_password": "wrong", "new_password": "new-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_put(
            "/profile/password",
            &bearer(&student),
            json!({ "current_password": "old-pass", "new_password": "new-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(
                        &json!({ "email": "mina@example.edu", "password": "new-pass" }),
                    )
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
