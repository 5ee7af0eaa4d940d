//! # Engagement Counters
//!
//! Like and share records are (notice, user) pairs, unique per pair, with
//! counts computed by aggregation at read time — no denormalized counter
//! fields to invalidate. Uniqueness is the storage layer's job (atomic
//! check-and-insert), never a read-then-write in here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use domains::{
    AuthUser, DomainError, Like, LikeRepo, NoticeRepo, NotificationKind, Result, Share,
    ShareRepo, UserRepo,
};

use crate::notifications::NotificationEmitter;
use crate::timefmt::hours_ago;
use crate::views::ActorView;

/// One like/share row shaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementEntry {
    pub id: Uuid,
    pub actor: ActorView,
    pub notice_id: Uuid,
    pub time: String,
}

/// Fresh total plus the full ordered actor list, returned by every
/// engagement mutation and read.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementSummary {
    pub notice_id: Uuid,
    pub total: u64,
    pub entries: Vec<EngagementEntry>,
}

pub struct EngagementService {
    likes: Arc<dyn LikeRepo>,
    shares: Arc<dyn ShareRepo>,
    notices: Arc<dyn NoticeRepo>,
    users: Arc<dyn UserRepo>,
    emitter: NotificationEmitter,
}

impl EngagementService {
    pub fn new(
        likes: Arc<dyn LikeRepo>,
        shares: Arc<dyn ShareRepo>,
        notices: Arc<dyn NoticeRepo>,
        users: Arc<dyn UserRepo>,
        emitter: NotificationEmitter,
    ) -> Self {
        Self {
            likes,
            shares,
            notices,
            users,
            emitter,
        }
    }

    /// Likes a notice. A second like by the same user is a `Conflict`
    /// surfaced straight from the store's uniqueness constraint.
    pub async fn like(&self, notice_id: Uuid, user: &AuthUser) -> Result<EngagementSummary> {
        let notice = self
            .notices
            .get(notice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", notice_id))?;

        self.likes
            .insert(Like {
                id: Uuid::now_v7(),
                notice_id,
                user_id: user.id,
                created_at: Utc::now(),
            })
            .await?;

        self.emitter
            .emit(
                notice.created_by,
                user.id,
                Some(notice_id),
                NotificationKind::LikeNotice,
                "",
            )
            .await;

        self.like_summary(notice_id).await
    }

    /// Removes a like. Unliking a notice that was never liked is a
    /// `Conflict` — there is nothing to remove.
    pub async fn unlike(&self, notice_id: Uuid, user: &AuthUser) -> Result<EngagementSummary> {
        if !self.likes.delete(notice_id, user.id).await? {
            return Err(DomainError::Conflict(
                "you have not liked this notice".into(),
            ));
        }
        self.like_summary(notice_id).await
    }

    pub async fn get_likes(&self, notice_id: Uuid) -> Result<EngagementSummary> {
        self.like_summary(notice_id).await
    }

    pub async fn check_liked(&self, notice_id: Uuid, user: &AuthUser) -> Result<bool> {
        self.likes.exists(notice_id, user.id).await
    }

    /// Records a share. Idempotent: a repeated share by the same user
    /// succeeds without creating a second row — the unique-constraint
    /// collision is swallowed by the store, not surfaced.
    pub async fn add_share(&self, notice_id: Uuid, user: &AuthUser) -> Result<EngagementSummary> {
        let notice = self
            .notices
            .get(notice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", notice_id))?;

        let created = self
            .shares
            .insert_if_absent(Share {
                id: Uuid::now_v7(),
                notice_id,
                user_id: user.id,
                created_at: Utc::now(),
            })
            .await?;
        if !created {
            tracing::debug!(%notice_id, user_id = %user.id, "duplicate share swallowed");
        }

        self.emitter
            .emit(
                notice.created_by,
                user.id,
                Some(notice_id),
                NotificationKind::ShareNotice,
                "",
            )
            .await;

        self.share_summary(notice_id).await
    }

    pub async fn get_shares(&self, notice_id: Uuid) -> Result<EngagementSummary> {
        self.share_summary(notice_id).await
    }

    async fn like_summary(&self, notice_id: Uuid) -> Result<EngagementSummary> {
        let total = self.likes.count_for_notice(notice_id).await?;
        let rows = self.likes.list_for_notice(notice_id).await?;
        let entries = self
            .entries(
                notice_id,
                rows.into_iter().map(|l| (l.id, l.user_id, l.created_at)),
            )
            .await?;
        Ok(EngagementSummary {
            notice_id,
            total,
            entries,
        })
    }

    async fn share_summary(&self, notice_id: Uuid) -> Result<EngagementSummary> {
        let total = self.shares.count_for_notice(notice_id).await?;
        let rows = self.shares.list_for_notice(notice_id).await?;
        let entries = self
            .entries(
                notice_id,
                rows.into_iter().map(|s| (s.id, s.user_id, s.created_at)),
            )
            .await?;
        Ok(EngagementSummary {
            notice_id,
            total,
            entries,
        })
    }

    async fn entries(
        &self,
        notice_id: Uuid,
        rows: impl Iterator<Item = (Uuid, Uuid, chrono::DateTime<Utc>)>,
    ) -> Result<Vec<EngagementEntry>> {
        let rows: Vec<_> = rows.collect();
        let user_ids: Vec<Uuid> = rows.iter().map(|(_, uid, _)| *uid).collect();
        let actors: HashMap<Uuid, ActorView> = self
            .users
            .get_many(&user_ids)
            .await?
            .iter()
            .map(|u| (u.id, ActorView::from_user(u)))
            .collect();
        Ok(rows
            .into_iter()
            .map(|(id, user_id, created_at)| EngagementEntry {
                id,
                actor: actors
                    .get(&user_id)
                    .cloned()
                    .unwrap_or_else(|| ActorView::unknown(user_id)),
                notice_id,
                time: hours_ago(created_at),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        MockLikeRepo, MockNoticeRepo, MockNotificationRepo, MockShareRepo, MockUserRepo, Notice,
        Role, Target,
    };

    fn notice(id: Uuid, created_by: Uuid) -> Notice {
        Notice {
            id,
            text: "Library hours".into(),
            category: "General".into(),
            target: Target::All,
            department: None,
            session: None,
            section: None,
            image: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    fn service_with(
        likes: MockLikeRepo,
        shares: MockShareRepo,
        notices: MockNoticeRepo,
        users: MockUserRepo,
        notifications: MockNotificationRepo,
    ) -> EngagementService {
        EngagementService::new(
            Arc::new(likes),
            Arc::new(shares),
            Arc::new(notices),
            Arc::new(users),
            NotificationEmitter::new(Arc::new(notifications)),
        )
    }

    #[tokio::test]
    async fn duplicate_like_surfaces_conflict() {
        let notice_id = Uuid::now_v7();
        let owner = Uuid::now_v7();
        let mut notices = MockNoticeRepo::new();
        notices
            .expect_get()
            .returning(move |_| Ok(Some(notice(notice_id, owner))));
        let mut likes = MockLikeRepo::new();
        likes
            .expect_insert()
            .returning(|_| Err(DomainError::Conflict("like already exists".into())));

        let svc = service_with(
            likes,
            MockShareRepo::new(),
            notices,
            MockUserRepo::new(),
            MockNotificationRepo::new(),
        );
        let user = AuthUser {
            id: Uuid::now_v7(),
            role: Role::Student,
        };
        let err = svc.like(notice_id, &user).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn unlike_without_a_like_is_a_conflict() {
        let mut likes = MockLikeRepo::new();
        likes.expect_delete().returning(|_, _| Ok(false));

        let svc = service_with(
            likes,
            MockShareRepo::new(),
            MockNoticeRepo::new(),
            MockUserRepo::new(),
            MockNotificationRepo::new(),
        );
        let user = AuthUser {
            id: Uuid::now_v7(),
            role: Role::Student,
        };
        let err = svc.unlike(Uuid::now_v7(), &user).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn like_notifies_the_owner_once() {
        let notice_id = Uuid::now_v7();
        let owner = Uuid::now_v7();
        let liker = Uuid::now_v7();

        let mut notices = MockNoticeRepo::new();
        notices
            .expect_get()
            .returning(move |_| Ok(Some(notice(notice_id, owner))));
        let mut likes = MockLikeRepo::new();
        likes.expect_insert().returning(Ok);
        likes.expect_count_for_notice().returning(|_| Ok(1));
        likes.expect_list_for_notice().returning(|_| Ok(vec![]));
        let mut users = MockUserRepo::new();
        users.expect_get_many().returning(|_| Ok(vec![]));
        let mut notifications = MockNotificationRepo::new();
        notifications
            .expect_insert()
            .withf(move |n| n.user_id == owner && n.kind == NotificationKind::LikeNotice)
            .once()
            .returning(Ok);

        let svc = service_with(likes, MockShareRepo::new(), notices, users, notifications);
        let user = AuthUser {
            id: liker,
            role: Role::Student,
        };
        let summary = svc.like(notice_id, &user).await.unwrap();
        assert_eq!(summary.total, 1);
    }

    #[tokio::test]
    async fn self_like_creates_no_notification() {
        let notice_id = Uuid::now_v7();
        let owner = Uuid::now_v7();

        let mut notices = MockNoticeRepo::new();
        notices
            .expect_get()
            .returning(move |_| Ok(Some(notice(notice_id, owner))));
        let mut likes = MockLikeRepo::new();
        likes.expect_insert().returning(Ok);
        likes.expect_count_for_notice().returning(|_| Ok(1));
        likes.expect_list_for_notice().returning(|_| Ok(vec![]));
        let mut users = MockUserRepo::new();
        users.expect_get_many().returning(|_| Ok(vec![]));
        let mut notifications = MockNotificationRepo::new();
        notifications.expect_insert().never();

        let svc = service_with(likes, MockShareRepo::new(), notices, users, notifications);
        let user = AuthUser {
            id: owner,
            role: Role::Admin,
        };
        svc.like(notice_id, &user).await.unwrap();
    }

    #[tokio::test]
    async fn share_of_a_missing_notice_is_not_found() {
        let mut notices = MockNoticeRepo::new();
        notices.expect_get().returning(|_| Ok(None));
        let mut shares = MockShareRepo::new();
        shares.expect_insert_if_absent().never();

        let svc = service_with(
            MockLikeRepo::new(),
            shares,
            notices,
            MockUserRepo::new(),
            MockNotificationRepo::new(),
        );
        let user = AuthUser {
            id: Uuid::now_v7(),
            role: Role::Student,
        };
        let err = svc.add_share(Uuid::now_v7(), &user).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn repeated_share_succeeds_without_a_second_row() {
        let notice_id = Uuid::now_v7();
        let owner = Uuid::now_v7();

        let mut shares = MockShareRepo::new();
        shares.expect_insert_if_absent().returning(|_| Ok(false));
        shares.expect_count_for_notice().returning(|_| Ok(1));
        shares.expect_list_for_notice().returning(|_| Ok(vec![]));
        let mut notices = MockNoticeRepo::new();
        notices
            .expect_get()
            .returning(move |_| Ok(Some(notice(notice_id, owner))));
        let mut users = MockUserRepo::new();
        users.expect_get_many().returning(|_| Ok(vec![]));
        let mut notifications = MockNotificationRepo::new();
        notifications.expect_insert().returning(Ok);

        let svc = service_with(MockLikeRepo::new(), shares, notices, users, notifications);
        let user = AuthUser {
            id: Uuid::now_v7(),
            role: Role::Student,
        };
        let summary = svc.add_share(notice_id, &user).await.unwrap();
        assert_eq!(summary.total, 1);
    }
}
