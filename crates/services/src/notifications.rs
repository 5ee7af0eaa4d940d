//! # Notification Emitter & Feed
//!
//! The emitter is a best-effort post-commit hook: it runs after the
//! triggering mutation has already succeeded, never notifies a user about
//! their own action, and swallows (logs) every failure so the primary
//! result stands regardless of notification delivery.
//!
//! The feed side assembles the recipient's notification list with actor
//! display info, a per-kind lead-in line, the notice snapshot, and live
//! engagement totals.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use domains::{
    AuthUser, CommentRepo, DomainError, LikeRepo, Notice, NoticeRepo, Notification,
    NotificationKind, NotificationRepo, ReadFilter, Result, ShareRepo, UserRepo,
};

use crate::timefmt::hours_ago;
use crate::views::ActorView;

/// Fire-and-forget notification recording.
#[derive(Clone)]
pub struct NotificationEmitter {
    notifications: Arc<dyn NotificationRepo>,
}

impl NotificationEmitter {
    pub fn new(notifications: Arc<dyn NotificationRepo>) -> Self {
        Self { notifications }
    }

    /// Records a notification for `recipient`. Returns `None` without
    /// writing anything when the actor is the recipient, and `None` when
    /// the store rejects the write — the caller's mutation has already
    /// succeeded and must not be invalidated here.
    pub async fn emit(
        &self,
        recipient: Uuid,
        actor: Uuid,
        notice_id: Option<Uuid>,
        kind: NotificationKind,
        text: impl Into<String>,
    ) -> Option<Notification> {
        if recipient == actor {
            return None;
        }
        let notification = Notification {
            id: Uuid::now_v7(),
            user_id: recipient,
            from_user_id: actor,
            notice_id,
            kind,
            text: text.into(),
            is_read: false,
            created_at: chrono::Utc::now(),
        };
        match self.notifications.insert(notification).await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), error = %e, "notification write failed; dropping");
                None
            }
        }
    }
}

/// One entry of the notification feed, shaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub actor: ActorView,
    /// The per-kind lead-in line, e.g. "liked your notice on".
    pub lead_in: &'static str,
    /// The text snapshot taken at emission time, falling back to the
    /// notice text.
    pub highlight: String,
    pub notice: Option<Notice>,
    pub time: String,
    pub total_comments: u64,
    pub total_likes: u64,
    pub total_shares: u64,
    pub is_read: bool,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub total: usize,
    pub unread: u64,
    pub notifications: Vec<NotificationView>,
}

fn lead_in(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::LikeNotice => "liked your notice on",
        NotificationKind::CommentNotice => "commented:",
        NotificationKind::ReplyComment => "replied to your comment on",
        NotificationKind::LikeComment => "liked your comment regarding",
        NotificationKind::ShareNotice => "shared your notice",
    }
}

fn link_for(kind: NotificationKind, notice_id: Option<Uuid>) -> String {
    let mut link = notice_id
        .map(|id| format!("/view-notice/{id}"))
        .unwrap_or_default();
    if matches!(
        kind,
        NotificationKind::ReplyComment | NotificationKind::LikeComment
    ) {
        if let Some(id) = notice_id {
            link.push_str(&format!("#comment-{id}"));
        }
    }
    link
}

/// Read side of the notification feed.
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepo>,
    users: Arc<dyn UserRepo>,
    notices: Arc<dyn NoticeRepo>,
    comments: Arc<dyn CommentRepo>,
    likes: Arc<dyn LikeRepo>,
    shares: Arc<dyn ShareRepo>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepo>,
        users: Arc<dyn UserRepo>,
        notices: Arc<dyn NoticeRepo>,
        comments: Arc<dyn CommentRepo>,
        likes: Arc<dyn LikeRepo>,
        shares: Arc<dyn ShareRepo>,
    ) -> Self {
        Self {
            notifications,
            users,
            notices,
            comments,
            likes,
            shares,
        }
    }

    /// The recipient's feed, newest-first, optionally restricted to read
    /// or unread entries. Always reports the unread total alongside.
    pub async fn list(&self, user: &AuthUser, filter: ReadFilter) -> Result<NotificationFeed> {
        let rows = self.notifications.list_for_user(user.id, filter).await?;
        let unread = self.notifications.count_unread(user.id).await?;

        let actor_ids: Vec<Uuid> = rows.iter().map(|n| n.from_user_id).collect();
        let actors: HashMap<Uuid, ActorView> = self
            .users
            .get_many(&actor_ids)
            .await?
            .iter()
            .map(|u| (u.id, ActorView::from_user(u)))
            .collect();

        let mut views = Vec::with_capacity(rows.len());
        for n in rows {
            let (notice, total_comments, total_likes, total_shares) = match n.notice_id {
                Some(nid) => (
                    self.notices.get(nid).await?,
                    self.comments.count_for_notice(nid).await?,
                    self.likes.count_for_notice(nid).await?,
                    self.shares.count_for_notice(nid).await?,
                ),
                None => (None, 0, 0, 0),
            };
            let highlight = if n.text.is_empty() {
                notice.as_ref().map(|x| x.text.clone()).unwrap_or_default()
            } else {
                n.text.clone()
            };
            views.push(NotificationView {
                id: n.id,
                kind: n.kind,
                actor: actors
                    .get(&n.from_user_id)
                    .cloned()
                    .unwrap_or_else(|| ActorView::unknown(n.from_user_id)),
                lead_in: lead_in(n.kind),
                highlight,
                notice,
                time: hours_ago(n.created_at),
                total_comments,
                total_likes,
                total_shares,
                is_read: n.is_read,
                link: link_for(n.kind, n.notice_id),
            });
        }

        Ok(NotificationFeed {
            total: views.len(),
            unread,
            notifications: views,
        })
    }

    /// Marks one notification read. Only the recipient may do this.
    pub async fn mark_read(&self, id: Uuid, user: &AuthUser) -> Result<Notification> {
        let mut notification = self
            .notifications
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("notification", id))?;
        if notification.user_id != user.id {
            return Err(DomainError::Forbidden(
                "not the recipient of this notification".into(),
            ));
        }
        if !self.notifications.mark_read(id).await? {
            return Err(DomainError::not_found("notification", id));
        }
        notification.is_read = true;
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockNotificationRepo;

    #[tokio::test]
    async fn emit_skips_self_action() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_insert().never();
        let emitter = NotificationEmitter::new(Arc::new(repo));
        let me = Uuid::now_v7();
        let out = emitter
            .emit(me, me, None, NotificationKind::LikeNotice, "")
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn emit_swallows_store_failures() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_insert()
            .returning(|_| Err(DomainError::Internal("db down".into())));
        let emitter = NotificationEmitter::new(Arc::new(repo));
        let out = emitter
            .emit(
                Uuid::now_v7(),
                Uuid::now_v7(),
                Some(Uuid::now_v7()),
                NotificationKind::CommentNotice,
                "nice",
            )
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn emit_records_for_a_different_recipient() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_insert().returning(Ok);
        let emitter = NotificationEmitter::new(Arc::new(repo));
        let out = emitter
            .emit(
                Uuid::now_v7(),
                Uuid::now_v7(),
                Some(Uuid::now_v7()),
                NotificationKind::ShareNotice,
                "",
            )
            .await;
        let n = out.expect("notification should be recorded");
        assert_eq!(n.kind, NotificationKind::ShareNotice);
        assert!(!n.is_read);
    }

    #[test]
    fn reply_links_carry_a_comment_anchor() {
        let nid = Uuid::now_v7();
        let link = link_for(NotificationKind::ReplyComment, Some(nid));
        assert_eq!(link, format!("/view-notice/{nid}#comment-{nid}"));
        let plain = link_for(NotificationKind::LikeNotice, Some(nid));
        assert_eq!(plain, format!("/view-notice/{nid}"));
    }
}
