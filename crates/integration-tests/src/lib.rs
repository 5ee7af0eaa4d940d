//! Shared fixtures for the end-to-end suites: the full service stack over
//! the in-memory store, plus stub identity and blob adapters.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use api_adapters::AppState;
use auth_adapters::OtpStore;
use domains::{
    AuthUser, BlobStore, CredentialService, DomainError, Notifier, Result, Role, TeacherStatus,
    User, UserRepo,
};
use services::{
    AccountService, CommentService, EngagementService, NoticeService, NotificationEmitter,
    NotificationService,
};
use storage_adapters::MemoryStore;

/// Tokens are `"<user id>/<role>"`. Deterministic, so tests can mint a
/// bearer header without going through login.
pub struct StubCredentials;

#[async_trait]
impl CredentialService for StubCredentials {
    async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let bad = || DomainError::Unauthorized("invalid or expired token".into());
        let (id, role) = token.split_once('/').ok_or_else(bad)?;
        Ok(AuthUser {
            id: Uuid::parse_str(id).map_err(|_| bad())?,
            role: Role::parse(role).ok_or_else(bad)?,
        })
    }

    async fn issue(&self, user: &User) -> Result<String> {
        Ok(format!("{}/{}", user.id, user.role.as_str()))
    }
}

pub fn bearer(user: &User) -> String {
    format!("Bearer {}/{}", user.id, user.role.as_str())
}

#[derive(Default)]
pub struct InMemoryBlobs {
    blobs: DashMap<String, Bytes>,
}

#[async_trait]
impl BlobStore for InMemoryBlobs {
    async fn store(&self, data: Bytes, _content_type: &str, folder_hint: &str) -> Result<String> {
        let url = format!("/blobs/{folder_hint}/{}", Uuid::now_v7());
        self.blobs.insert(url.clone(), data);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.blobs.remove(url);
        Ok(())
    }
}

/// Mail that goes nowhere; registration flows only need it to succeed.
pub struct NullMailer;

#[async_trait]
impl Notifier for NullMailer {
    async fn send_otp(&self, _email: &str, _code: &str) -> Result<()> {
        Ok(())
    }

    async fn send(&self, _subject: &str, _body: &str, _to: &str) -> Result<()> {
        Ok(())
    }
}

/// The whole application wired over one [`MemoryStore`].
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());

    let users: Arc<dyn domains::UserRepo> = store.clone();
    let notices: Arc<dyn domains::NoticeRepo> = store.clone();
    let comments: Arc<dyn domains::CommentRepo> = store.clone();
    let replies: Arc<dyn domains::ReplyRepo> = store.clone();
    let likes: Arc<dyn domains::LikeRepo> = store.clone();
    let shares: Arc<dyn domains::ShareRepo> = store.clone();
    let notifications: Arc<dyn domains::NotificationRepo> = store.clone();
    let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobs::default());
    let emitter = NotificationEmitter::new(notifications.clone());

    let state = AppState {
        notices: Arc::new(NoticeService::new(
            notices.clone(),
            users.clone(),
            comments.clone(),
            replies.clone(),
            likes.clone(),
            shares.clone(),
            notifications.clone(),
            blobs.clone(),
        )),
        accounts: Arc::new(AccountService::new(users.clone(), notices.clone())),
        comments: Arc::new(CommentService::new(
            comments.clone(),
            replies,
            notices.clone(),
            users.clone(),
            emitter.clone(),
        )),
        engagement: Arc::new(EngagementService::new(
            likes.clone(),
            shares.clone(),
            notices.clone(),
            users.clone(),
            emitter,
        )),
        notifications: Arc::new(NotificationService::new(
            notifications,
            users.clone(),
            notices,
            comments,
            likes,
            shares,
        )),
        users,
        credentials: Arc::new(StubCredentials),
        blobs,
        otp: Arc::new(OtpStore::default()),
        mailer: Arc::new(NullMailer),
    };
    (state, store)
}

fn base_user(role: Role) -> User {
    User {
        id: Uuid::now_v7(),
        first_name: "Test".into(),
        last_name: "User".into(),
        email: format!("{}@example.edu", Uuid::now_v7()),
        password_hash: None,
        role,
        dept: None,
        session: None,
        section: None,
        status: None,
        is_enabled: true,
        is_verified: true,
        avatar: None,
        created_at: Utc::now(),
    }
}

// The store implements every repo trait, so the insert calls are written
// fully qualified.
pub async fn seed_admin(store: &MemoryStore) -> User {
    UserRepo::insert(store, base_user(Role::Admin)).await.unwrap()
}

pub async fn seed_teacher(store: &MemoryStore, dept: &str) -> User {
    let mut user = base_user(Role::Teacher);
    user.dept = Some(dept.to_string());
    user.status = Some(TeacherStatus::Accepted);
    UserRepo::insert(store, user).await.unwrap()
}

pub async fn seed_student(
    store: &MemoryStore,
    dept: &str,
    session: &str,
    section: &str,
) -> User {
    let mut user = base_user(Role::Student);
    user.dept = Some(dept.to_string());
    user.session = Some(session.to_string());
    user.section = Some(section.to_string());
    UserRepo::insert(store, user).await.unwrap()
}

pub fn auth(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        role: user.role,
    }
}
