//! # In-memory store
//!
//! DashMap-backed implementation of every repository port. Likes and
//! shares are keyed by the (notice, user) pair, so pair uniqueness is an
//! atomic property of the map itself — the same contract the Postgres
//! unique indexes provide.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use domains::{
    Comment, CommentRepo, DomainError, Like, LikeRepo, Notice, NoticeRepo, Notification,
    NotificationRepo, ReadFilter, Reply, ReplyRepo, Result, Role, Share, ShareRepo, User,
    UserRepo,
};

/// One shared arena for all tables. Clone an `Arc<MemoryStore>` once per
/// port: the struct implements every repo trait.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    notices: DashMap<Uuid, Notice>,
    comments: DashMap<Uuid, Comment>,
    replies: DashMap<Uuid, Reply>,
    likes: DashMap<(Uuid, Uuid), Like>,
    shares: DashMap<(Uuid, Uuid), Share>,
    notifications: DashMap<Uuid, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn replies_sorted<F>(&self, pred: F) -> Vec<Reply>
    where
        F: Fn(&Reply) -> bool,
    {
        let mut out: Vec<Reply> = self
            .replies
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: User) -> Result<User> {
        if self
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(DomainError::Conflict("email already registered".into()));
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.clone()))
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let wanted: HashSet<Uuid> = ids.iter().copied().collect();
        Ok(self
            .users
            .iter()
            .filter(|u| wanted.contains(u.key()))
            .map(|u| u.clone())
            .collect())
    }

    async fn update(&self, user: User) -> Result<User> {
        if !self.users.contains_key(&user.id) {
            return Err(DomainError::not_found("user", user.id));
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<Uuid>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| *u.key())
            .collect())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let mut out: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn distinct_sessions(&self) -> Result<Vec<String>> {
        Ok(distinct(self.users.iter().filter_map(|u| {
            (u.role == Role::Student).then(|| u.session.clone()).flatten()
        })))
    }

    async fn distinct_departments(&self) -> Result<Vec<String>> {
        Ok(distinct(self.users.iter().filter_map(|u| {
            matches!(u.role, Role::Student | Role::Teacher)
                .then(|| u.dept.clone())
                .flatten()
        })))
    }

    async fn distinct_sections(&self) -> Result<Vec<String>> {
        Ok(distinct(self.users.iter().filter_map(|u| {
            (u.role == Role::Student).then(|| u.section.clone()).flatten()
        })))
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.collect::<HashSet<_>>().into_iter().collect();
    out.sort();
    out
}

#[async_trait]
impl NoticeRepo for MemoryStore {
    async fn insert(&self, notice: Notice) -> Result<Notice> {
        self.notices.insert(notice.id, notice.clone());
        Ok(notice)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notice>> {
        Ok(self.notices.get(&id).map(|n| n.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Notice>> {
        Ok(self.notices.iter().map(|n| n.clone()).collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Notice>> {
        Ok(self
            .notices
            .iter()
            .filter(|n| n.category == category)
            .map(|n| n.clone())
            .collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Notice>> {
        Ok(self
            .notices
            .iter()
            .filter(|n| n.created_by == author_id)
            .map(|n| n.clone())
            .collect())
    }

    async fn list_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Notice>> {
        let wanted: HashSet<Uuid> = author_ids.iter().copied().collect();
        Ok(self
            .notices
            .iter()
            .filter(|n| wanted.contains(&n.created_by))
            .map(|n| n.clone())
            .collect())
    }

    async fn update(&self, notice: Notice) -> Result<Notice> {
        if !self.notices.contains_key(&notice.id) {
            return Err(DomainError::not_found("notice", notice.id));
        }
        self.notices.insert(notice.id, notice.clone());
        Ok(notice)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.notices.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.notices.len() as u64)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        Ok(distinct(self.notices.iter().map(|n| n.category.clone())))
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Comment>> {
        let mut out: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.notice_id == notice_id)
            .map(|c| c.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.notice_id == notice_id)
            .count() as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        self.comments.retain(|_, c| c.notice_id != notice_id);
        Ok(())
    }
}

#[async_trait]
impl ReplyRepo for MemoryStore {
    async fn insert(&self, reply: Reply) -> Result<Reply> {
        // Mirror of the Postgres CHECK constraint.
        if reply.comment_id.is_some() == reply.parent_reply_id.is_some() {
            return Err(DomainError::BadRequest(
                "reply must have exactly one parent".into(),
            ));
        }
        self.replies.insert(reply.id, reply.clone());
        Ok(reply)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reply>> {
        Ok(self.replies.get(&id).map(|r| r.clone()))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Reply>> {
        let comment_ids: HashSet<Uuid> = self
            .comments
            .iter()
            .filter(|c| c.notice_id == notice_id)
            .map(|c| *c.key())
            .collect();

        // Transitive closure: start from direct replies, then pull in
        // descendants level by level.
        let mut collected: Vec<Reply> = self.replies_sorted(|r| {
            r.comment_id.map(|cid| comment_ids.contains(&cid)).unwrap_or(false)
        });
        let mut frontier: HashSet<Uuid> = collected.iter().map(|r| r.id).collect();
        while !frontier.is_empty() {
            let next: Vec<Reply> = self.replies_sorted(|r| {
                r.parent_reply_id
                    .map(|pid| frontier.contains(&pid))
                    .unwrap_or(false)
            });
            frontier = next.iter().map(|r| r.id).collect();
            collected.extend(next);
        }
        collected.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(collected)
    }

    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Reply>> {
        Ok(self.replies_sorted(|r| r.comment_id == Some(comment_id)))
    }

    async fn list_children(&self, parent_reply_id: Uuid) -> Result<Vec<Reply>> {
        Ok(self.replies_sorted(|r| r.parent_reply_id == Some(parent_reply_id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.replies.remove(&id).is_some())
    }
}

#[async_trait]
impl LikeRepo for MemoryStore {
    async fn insert(&self, like: Like) -> Result<Like> {
        match self.likes.entry((like.notice_id, like.user_id)) {
            Entry::Occupied(_) => Err(DomainError::Conflict(
                "you already liked this notice".into(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(like.clone());
                Ok(like)
            }
        }
    }

    async fn delete(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.likes.remove(&(notice_id, user_id)).is_some())
    }

    async fn exists(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.likes.contains_key(&(notice_id, user_id)))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Like>> {
        let mut out: Vec<Like> = self
            .likes
            .iter()
            .filter(|l| l.notice_id == notice_id)
            .map(|l| l.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        Ok(self
            .likes
            .iter()
            .filter(|l| l.notice_id == notice_id)
            .count() as u64)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        self.likes.retain(|_, l| l.notice_id != notice_id);
        Ok(())
    }
}

#[async_trait]
impl ShareRepo for MemoryStore {
    async fn insert_if_absent(&self, share: Share) -> Result<bool> {
        match self.shares.entry((share.notice_id, share.user_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(share);
                Ok(true)
            }
        }
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Share>> {
        let mut out: Vec<Share> = self
            .shares
            .iter()
            .filter(|s| s.notice_id == notice_id)
            .map(|s| s.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        Ok(self
            .shares
            .iter()
            .filter(|s| s.notice_id == notice_id)
            .count() as u64)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        self.shares.retain(|_, s| s.notice_id != notice_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|n| n.clone()))
    }

    async fn list_for_user(&self, user_id: Uuid, filter: ReadFilter) -> Result<Vec<Notification>> {
        let mut out: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| match filter {
                ReadFilter::All => true,
                ReadFilter::Read => n.is_read,
                ReadFilter::Unread => !n.is_read,
            })
            .map(|n| n.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        self.notifications
            .retain(|_, n| n.notice_id != Some(notice_id));
        Ok(())
    }
}
