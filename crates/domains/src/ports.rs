//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Repositories cover the persistent tables; the collaborator ports at the
//! bottom (credential service, blob store, notifier) wrap the external
//! systems the core treats as opaque.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AuthUser, Comment, Like, Notice, Notification, ReadFilter, Reply, Role, Share, User,
};

/// Persistence contract for user accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, user: User) -> Result<User>;
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;
    async fn update(&self, user: User) -> Result<User>;
    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<Uuid>>;
    /// Newest-first.
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>>;

    // Distinct-value listings for the notice-options UI filters.
    async fn distinct_sessions(&self) -> Result<Vec<String>>;
    async fn distinct_departments(&self) -> Result<Vec<String>>;
    async fn distinct_sections(&self) -> Result<Vec<String>>;
}

/// Persistence contract for notices.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NoticeRepo: Send + Sync {
    async fn insert(&self, notice: Notice) -> Result<Notice>;
    async fn get(&self, id: Uuid) -> Result<Option<Notice>>;
    /// All notices, unfiltered. Visibility is a read-time capability filter
    /// computed in the service layer, not a stored ACL.
    async fn list_all(&self) -> Result<Vec<Notice>>;
    async fn list_by_category(&self, category: &str) -> Result<Vec<Notice>>;
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Notice>>;
    async fn list_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Notice>>;
    async fn update(&self, notice: Notice) -> Result<Notice>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn count(&self) -> Result<u64>;
    async fn distinct_categories(&self) -> Result<Vec<String>>;
}

/// Persistence contract for top-level comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: Comment) -> Result<Comment>;
    async fn get(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Newest-first.
    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Comment>>;
    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64>;
    /// Returns false when the row was already gone.
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()>;
}

/// Persistence contract for the reply tree. Replies are a flat arena of
/// records holding a parent id; tree shape is assembled in the service.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ReplyRepo: Send + Sync {
    async fn insert(&self, reply: Reply) -> Result<Reply>;
    async fn get(&self, id: Uuid) -> Result<Option<Reply>>;
    /// Every reply reachable from any comment of the notice, however deep.
    /// Oldest-first.
    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Reply>>;
    /// Direct replies of a comment. Oldest-first.
    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Reply>>;
    /// Direct children of a reply. Oldest-first.
    async fn list_children(&self, parent_reply_id: Uuid) -> Result<Vec<Reply>>;
    /// Returns false when the row was already gone.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Persistence contract for likes. The (notice, user) pair is unique; the
/// store enforces it with an atomic check-and-insert, never read-then-write.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Fails with `Conflict` when the pair already exists.
    async fn insert(&self, like: Like) -> Result<Like>;
    /// Returns false when there was nothing to remove.
    async fn delete(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn exists(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool>;
    /// Newest-first.
    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Like>>;
    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64>;
    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()>;
}

/// Persistence contract for shares. Same uniqueness as likes, but the
/// duplicate case is swallowed rather than surfaced.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ShareRepo: Send + Sync {
    /// Returns true when a row was created, false when the pair already
    /// existed. Never errors on the duplicate case.
    async fn insert_if_absent(&self, share: Share) -> Result<bool>;
    /// Newest-first.
    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Share>>;
    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64>;
    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()>;
}

/// Persistence contract for notifications.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification>;
    async fn get(&self, id: Uuid) -> Result<Option<Notification>>;
    /// Newest-first, optionally restricted by read state.
    async fn list_for_user(&self, user_id: Uuid, filter: ReadFilter) -> Result<Vec<Notification>>;
    async fn count_unread(&self, user_id: Uuid) -> Result<u64>;
    /// Returns false when the row was already gone.
    async fn mark_read(&self, id: Uuid) -> Result<bool>;
    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()>;
}

/// Identity contract. The core receives an already-authenticated
/// `(userId, role)` pair per request; token mechanics are opaque.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Resolves a bearer token to an identity, `Unauthorized` otherwise.
    async fn authenticate(&self, token: &str) -> Result<AuthUser>;
    /// Issues a token for a verified account (login glue).
    async fn issue(&self, user: &User) -> Result<String>;
}

/// Binary/image storage contract. The core only ever stores the returned
/// URL as an opaque string field.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Saves raw bytes and returns a public URL.
    async fn store(&self, data: Bytes, content_type: &str, folder_hint: &str) -> Result<String>;
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Outbound email contract. Entirely outside the core; the default adapter
/// only logs.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()>;
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<()>;
}
