//! # Notice Lifecycle
//!
//! Creation (author-gated), reads through the visibility resolver,
//! owner-or-admin mutation, and the cascading delete that takes a notice's
//! likes, shares, comments, replies, and notifications with it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{
    AuthUser, BlobStore, CommentRepo, DomainError, LikeRepo, Notice, NoticeRepo,
    NotificationRepo, ReplyRepo, Result, Role, ShareRepo, Target, User, UserRepo,
};

use crate::views::ActorView;
use crate::visibility;

/// Input for creating a notice. The image, when present, is an opaque URL
/// the blob store already produced.
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeDraft {
    pub text: String,
    pub category: String,
    pub target: Target,
    pub department: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
    pub image: Option<String>,
}

/// Input for updating a notice. `remove_image` wins over `image`.
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeUpdate {
    pub text: String,
    pub category: String,
    pub target: Target,
    pub department: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

/// A notice paired with its author's display info.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: Notice,
    pub author: ActorView,
}

/// Distinct-value listings for the UI filter dropdowns.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeOptions {
    pub sessions: Vec<String>,
    pub departments: Vec<String>,
    pub sections: Vec<String>,
    pub categories: Vec<String>,
}

pub struct NoticeService {
    notices: Arc<dyn NoticeRepo>,
    users: Arc<dyn UserRepo>,
    comments: Arc<dyn CommentRepo>,
    replies: Arc<dyn ReplyRepo>,
    likes: Arc<dyn LikeRepo>,
    shares: Arc<dyn ShareRepo>,
    notifications: Arc<dyn NotificationRepo>,
    blobs: Arc<dyn BlobStore>,
}

impl NoticeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        notices: Arc<dyn NoticeRepo>,
        users: Arc<dyn UserRepo>,
        comments: Arc<dyn CommentRepo>,
        replies: Arc<dyn ReplyRepo>,
        likes: Arc<dyn LikeRepo>,
        shares: Arc<dyn ShareRepo>,
        notifications: Arc<dyn NotificationRepo>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            notices,
            users,
            comments,
            replies,
            likes,
            shares,
            notifications,
            blobs,
        }
    }

    /// Creates a notice. Only admins and approved, enabled teachers may
    /// post.
    pub async fn create(&self, draft: NoticeDraft, author: &AuthUser) -> Result<Notice> {
        let user = self.known_user(author.id).await?;
        if !user.may_author_notices() {
            return Err(DomainError::Forbidden("you cannot post a notice".into()));
        }
        if draft.text.trim().is_empty() {
            return Err(DomainError::BadRequest("text is required".into()));
        }

        let mut notice = Notice {
            id: Uuid::now_v7(),
            text: draft.text,
            category: draft.category,
            target: draft.target,
            department: draft.department,
            session: draft.session,
            section: draft.section,
            image: draft.image,
            created_by: author.id,
            created_at: Utc::now(),
        };
        notice.normalize_audience();
        self.notices.insert(notice).await
    }

    /// Exactly the notices the requesting user is entitled to see,
    /// newest-first, optionally within one category.
    pub async fn get_visible(
        &self,
        requester: &AuthUser,
        category: Option<&str>,
    ) -> Result<Vec<NoticeView>> {
        let user = self.known_user(requester.id).await?;
        let notices = match category {
            Some(c) => self.notices.list_by_category(c).await?,
            None => self.notices.list_all().await?,
        };
        let visible = visibility::resolve(&user, notices, category);
        self.with_authors(visible).await
    }

    pub async fn get(&self, id: Uuid) -> Result<NoticeView> {
        let notice = self
            .notices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", id))?;
        Ok(self.with_authors(vec![notice]).await?.remove(0))
    }

    /// All notices authored by one user, newest-first.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<NoticeView>> {
        if self.users.get(user_id).await?.is_none() {
            return Err(DomainError::not_found("user", user_id));
        }
        let mut notices = self.notices.list_by_author(user_id).await?;
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.with_authors(notices).await
    }

    /// Every notice authored by any teacher. Admin only.
    pub async fn list_teacher_notices(&self, requester: &AuthUser) -> Result<Vec<NoticeView>> {
        if requester.role != Role::Admin {
            return Err(DomainError::Forbidden(
                "only admins can access teacher notices".into(),
            ));
        }
        let teacher_ids = self.users.list_ids_by_role(Role::Teacher).await?;
        let mut notices = self.notices.list_by_authors(&teacher_ids).await?;
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.with_authors(notices).await
    }

    /// Updates text/category/audience/image. Owner or admin only.
    pub async fn update(
        &self,
        id: Uuid,
        update: NoticeUpdate,
        requester: &AuthUser,
    ) -> Result<Notice> {
        let mut notice = self
            .notices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", id))?;
        self.require_owner_or_admin(&notice, requester, "update")?;

        notice.text = update.text;
        notice.category = update.category;
        notice.target = update.target;
        notice.department = update.department;
        notice.session = update.session;
        notice.section = update.section;
        if update.remove_image {
            notice.image = None;
        } else if let Some(image) = update.image {
            notice.image = Some(image);
        }
        notice.normalize_audience();
        self.notices.update(notice).await
    }

    /// Deletes a notice and everything hanging off it: likes, shares, the
    /// comment/reply trees, and notifications referencing it. Owner or
    /// admin only.
    pub async fn delete(&self, id: Uuid, requester: &AuthUser) -> Result<()> {
        let notice = self
            .notices
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", id))?;
        self.require_owner_or_admin(&notice, requester, "delete")?;

        if let Some(image) = &notice.image {
            // Best-effort: a stale blob is not worth failing the delete.
            if let Err(e) = self.blobs.delete(image).await {
                tracing::warn!(%id, error = %e, "failed to delete notice image blob");
            }
        }

        self.likes.delete_for_notice(id).await?;
        self.shares.delete_for_notice(id).await?;

        // Replies only ever attach to an already-existing parent, so
        // reverse creation order is children-before-parents.
        let replies = self.replies.list_for_notice(id).await?;
        for reply in replies.iter().rev() {
            self.replies.delete(reply.id).await?;
        }
        self.comments.delete_for_notice(id).await?;
        self.notifications.delete_for_notice(id).await?;

        if !self.notices.delete(id).await? {
            return Err(DomainError::not_found("notice", id));
        }
        tracing::info!(%id, "notice deleted with dependents");
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        self.notices.count().await
    }

    /// Distinct sessions/departments/sections/categories for UI filters.
    pub async fn options(&self) -> Result<NoticeOptions> {
        Ok(NoticeOptions {
            sessions: self.users.distinct_sessions().await?,
            departments: self.users.distinct_departments().await?,
            sections: self.users.distinct_sections().await?,
            categories: self.notices.distinct_categories().await?,
        })
    }

    fn require_owner_or_admin(
        &self,
        notice: &Notice,
        requester: &AuthUser,
        action: &str,
    ) -> Result<()> {
        if requester.role != Role::Admin && notice.created_by != requester.id {
            return Err(DomainError::Forbidden(format!(
                "you cannot {action} this notice"
            )));
        }
        Ok(())
    }

    async fn known_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("user not found".into()))
    }

    async fn with_authors(&self, notices: Vec<Notice>) -> Result<Vec<NoticeView>> {
        let author_ids: Vec<Uuid> = notices.iter().map(|n| n.created_by).collect();
        let authors: HashMap<Uuid, ActorView> = self
            .users
            .get_many(&author_ids)
            .await?
            .iter()
            .map(|u| (u.id, ActorView::from_user(u)))
            .collect();
        Ok(notices
            .into_iter()
            .map(|notice| {
                let author = authors
                    .get(&notice.created_by)
                    .cloned()
                    .unwrap_or_else(|| ActorView::unknown(notice.created_by));
                NoticeView { notice, author }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        MockBlobStore, MockCommentRepo, MockLikeRepo, MockNoticeRepo, MockNotificationRepo,
        MockReplyRepo, MockShareRepo, MockUserRepo, TeacherStatus,
    };

    fn teacher(id: Uuid, status: Option<TeacherStatus>, enabled: bool) -> User {
        User {
            id,
            first_name: "Ada".into(),
            last_name: "Rahman".into(),
            email: "ada@example.edu".into(),
            password_hash: None,
            role: Role::Teacher,
            dept: Some("CSE".into()),
            session: None,
            section: None,
            status,
            is_enabled: enabled,
            is_verified: true,
            avatar: None,
            created_at: Utc::now(),
        }
    }

    fn draft() -> NoticeDraft {
        NoticeDraft {
            text: "Midterm moved to Monday".into(),
            category: "Exams".into(),
            target: Target::Teachers,
            department: Some("CSE".into()),
            session: Some("2022".into()),
            section: Some("A".into()),
            image: None,
        }
    }

    fn service_with(notices: MockNoticeRepo, users: MockUserRepo) -> NoticeService {
        NoticeService::new(
            Arc::new(notices),
            Arc::new(users),
            Arc::new(MockCommentRepo::new()),
            Arc::new(MockReplyRepo::new()),
            Arc::new(MockLikeRepo::new()),
            Arc::new(MockShareRepo::new()),
            Arc::new(MockNotificationRepo::new()),
            Arc::new(MockBlobStore::new()),
        )
    }

    #[tokio::test]
    async fn pending_teacher_cannot_post() {
        let author = Uuid::now_v7();
        let mut users = MockUserRepo::new();
        users
            .expect_get()
            .returning(move |_| Ok(Some(teacher(author, Some(TeacherStatus::Pending), true))));
        let mut notices = MockNoticeRepo::new();
        notices.expect_insert().never();

        let svc = service_with(notices, users);
        let err = svc
            .create(
                draft(),
                &AuthUser {
                    id: author,
                    role: Role::Teacher,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn create_normalizes_student_dimensions_away() {
        let author = Uuid::now_v7();
        let mut users = MockUserRepo::new();
        users
            .expect_get()
            .returning(move |_| Ok(Some(teacher(author, Some(TeacherStatus::Accepted), true))));
        let mut notices = MockNoticeRepo::new();
        notices
            .expect_insert()
            .withf(|n| n.session.is_none() && n.section.is_none() && n.department.is_some())
            .returning(Ok);

        let svc = service_with(notices, users);
        let notice = svc
            .create(
                draft(),
                &AuthUser {
                    id: author,
                    role: Role::Teacher,
                },
            )
            .await
            .unwrap();
        assert_eq!(notice.target, Target::Teachers);
    }

    #[tokio::test]
    async fn non_owner_non_admin_cannot_update() {
        let owner = Uuid::now_v7();
        let mut notices = MockNoticeRepo::new();
        notices.expect_get().returning(move |id| {
            Ok(Some(Notice {
                id,
                text: "old".into(),
                category: "General".into(),
                target: Target::All,
                department: None,
                session: None,
                section: None,
                image: None,
                created_by: owner,
                created_at: Utc::now(),
            }))
        });
        notices.expect_update().never();

        let svc = service_with(notices, MockUserRepo::new());
        let stranger = AuthUser {
            id: Uuid::now_v7(),
            role: Role::Teacher,
        };
        let err = svc
            .update(
                Uuid::now_v7(),
                NoticeUpdate {
                    text: "new".into(),
                    category: "General".into(),
                    target: Target::All,
                    department: None,
                    session: None,
                    section: None,
                    image: None,
                    remove_image: false,
                },
                &stranger,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn delete_survives_a_failing_blob_store() {
        let owner = Uuid::now_v7();
        let notice_id = Uuid::now_v7();
        let mut notices = MockNoticeRepo::new();
        notices.expect_get().returning(move |id| {
            Ok(Some(Notice {
                id,
                text: "with image".into(),
                category: "General".into(),
                target: Target::All,
                department: None,
                session: None,
                section: None,
                image: Some("https://blobs/abc".into()),
                created_by: owner,
                created_at: Utc::now(),
            }))
        });
        notices.expect_delete().returning(|_| Ok(true));
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_delete()
            .returning(|_| Err(DomainError::Internal("blob host down".into())));
        let mut likes = MockLikeRepo::new();
        likes.expect_delete_for_notice().returning(|_| Ok(()));
        let mut shares = MockShareRepo::new();
        shares.expect_delete_for_notice().returning(|_| Ok(()));
        let mut replies = MockReplyRepo::new();
        replies.expect_list_for_notice().returning(|_| Ok(vec![]));
        let mut comments = MockCommentRepo::new();
        comments.expect_delete_for_notice().returning(|_| Ok(()));
        let mut notifications = MockNotificationRepo::new();
        notifications.expect_delete_for_notice().returning(|_| Ok(()));

        let svc = NoticeService::new(
            Arc::new(notices),
            Arc::new(MockUserRepo::new()),
            Arc::new(comments),
            Arc::new(replies),
            Arc::new(likes),
            Arc::new(shares),
            Arc::new(notifications),
            Arc::new(blobs),
        );
        svc.delete(
            notice_id,
            &AuthUser {
                id: owner,
                role: Role::Teacher,
            },
        )
        .await
        .unwrap();
    }
}
