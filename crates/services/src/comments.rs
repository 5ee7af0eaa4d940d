//! # Comment Tree Manager
//!
//! CRUD for comments and arbitrarily-nested replies with authorization and
//! cascading deletion, plus assembly of the nested reply tree for
//! presentation.
//!
//! Replies live in storage as a flat arena of records holding a parent id
//! (a comment id for top-level replies, a reply id for nested ones). Tree
//! shape is materialized per request from a parent→children map — no live
//! object graph, which matches the relational backing store and sidesteps
//! cyclic-reference concerns.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use domains::{
    AuthUser, Comment, CommentRepo, DomainError, NoticeRepo, NotificationKind, Reply,
    ReplyParent, ReplyRepo, Result, Role, UserRepo,
};

use crate::notifications::NotificationEmitter;
use crate::timefmt::hours_ago;
use crate::views::ActorView;

/// A comment with its materialized reply tree.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub id: Uuid,
    pub notice_id: Uuid,
    pub author: ActorView,
    pub text: String,
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<ReplyNode>,
}

/// One node of the reply tree.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyNode {
    pub id: Uuid,
    pub author: ActorView,
    pub text: String,
    pub time: String,
    pub created_at: DateTime<Utc>,
    pub children: Vec<ReplyNode>,
}

/// The full discussion attached to one notice.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    pub total: usize,
    pub comments: Vec<CommentNode>,
}

pub struct CommentService {
    comments: Arc<dyn CommentRepo>,
    replies: Arc<dyn ReplyRepo>,
    notices: Arc<dyn NoticeRepo>,
    users: Arc<dyn UserRepo>,
    emitter: NotificationEmitter,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepo>,
        replies: Arc<dyn ReplyRepo>,
        notices: Arc<dyn NoticeRepo>,
        users: Arc<dyn UserRepo>,
        emitter: NotificationEmitter,
    ) -> Self {
        Self {
            comments,
            replies,
            notices,
            users,
            emitter,
        }
    }

    /// Creates a top-level comment on a notice and notifies the notice
    /// owner (unless they are the author).
    pub async fn create_comment(
        &self,
        notice_id: Uuid,
        author: &AuthUser,
        text: &str,
    ) -> Result<CommentNode> {
        let text = non_empty(text)?;
        let user = self.authoring_user(author).await?;
        let notice = self
            .notices
            .get(notice_id)
            .await?
            .ok_or_else(|| DomainError::not_found("notice", notice_id))?;

        let comment = self
            .comments
            .insert(Comment {
                id: Uuid::now_v7(),
                notice_id,
                user_id: author.id,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        // Post-commit, best-effort: the comment stands either way.
        self.emitter
            .emit(
                notice.created_by,
                author.id,
                Some(notice_id),
                NotificationKind::CommentNotice,
                text,
            )
            .await;

        Ok(CommentNode {
            id: comment.id,
            notice_id: comment.notice_id,
            author: ActorView::from_user(&user),
            text: comment.text,
            time: hours_ago(comment.created_at),
            created_at: comment.created_at,
            replies: Vec::new(),
        })
    }

    /// Creates a reply under a comment or under another reply. The owning
    /// notice's author is notified whenever the reply is reachable from a
    /// comment, however deep the nesting.
    pub async fn create_reply(
        &self,
        parent: ReplyParent,
        author: &AuthUser,
        text: &str,
    ) -> Result<ReplyNode> {
        let text = non_empty(text)?;
        let user = self.authoring_user(author).await?;

        let (comment_id, parent_reply_id) = match parent {
            ReplyParent::Comment(id) => {
                self.comments
                    .get(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("comment", id))?;
                (Some(id), None)
            }
            ReplyParent::Reply(id) => {
                self.replies
                    .get(id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("parent reply", id))?;
                (None, Some(id))
            }
        };

        let reply = self
            .replies
            .insert(Reply {
                id: Uuid::now_v7(),
                comment_id,
                parent_reply_id,
                user_id: author.id,
                text: text.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        if let Some(comment) = self.owning_comment(&reply).await? {
            if let Some(notice) = self.notices.get(comment.notice_id).await? {
                self.emitter
                    .emit(
                        notice.created_by,
                        author.id,
                        Some(notice.id),
                        NotificationKind::ReplyComment,
                        text,
                    )
                    .await;
            }
        }

        Ok(ReplyNode {
            id: reply.id,
            author: ActorView::from_user(&user),
            text: reply.text,
            time: hours_ago(reply.created_at),
            created_at: reply.created_at,
            children: Vec::new(),
        })
    }

    /// The full discussion for a notice: comments newest-first, each with
    /// its reply tree (children oldest-first).
    pub async fn list_comments(&self, notice_id: Uuid) -> Result<CommentThread> {
        let comments = self.comments.list_for_notice(notice_id).await?;
        let replies = self.replies.list_for_notice(notice_id).await?;

        let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
        author_ids.extend(replies.iter().map(|r| r.user_id));
        let actors: HashMap<Uuid, ActorView> = self
            .users
            .get_many(&author_ids)
            .await?
            .iter()
            .map(|u| (u.id, ActorView::from_user(u)))
            .collect();

        let nodes = assemble_thread(comments, replies, &actors);
        Ok(CommentThread {
            total: nodes.len(),
            comments: nodes,
        })
    }

    /// Deletes a comment and its entire reply subtree. Allowed for the
    /// comment author, the notice owner, and admins.
    pub async fn delete_comment(&self, comment_id: Uuid, requester: &AuthUser) -> Result<()> {
        let comment = self
            .comments
            .get(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        let notice = self.notices.get(comment.notice_id).await?;

        let is_owner = notice.map(|n| n.created_by == requester.id).unwrap_or(false);
        if comment.user_id != requester.id && !is_owner && requester.role != Role::Admin {
            return Err(DomainError::Forbidden(
                "not authorized to delete this comment".into(),
            ));
        }

        let roots = self.replies.list_for_comment(comment_id).await?;
        self.delete_reply_subtrees(roots).await?;

        if !self.comments.delete(comment_id).await? {
            // Lost a race with a concurrent delete; the subtree pass above
            // is idempotent, so surfacing NotFound is safe for retries.
            return Err(DomainError::not_found("comment", comment_id));
        }
        tracing::debug!(%comment_id, "comment deleted with reply subtree");
        Ok(())
    }

    /// Deletes a reply and its entire subtree. Allowed for the reply
    /// author, the owning notice's owner (resolved by walking up to the
    /// root comment), and admins.
    pub async fn delete_reply(&self, reply_id: Uuid, requester: &AuthUser) -> Result<()> {
        let reply = self
            .replies
            .get(reply_id)
            .await?
            .ok_or_else(|| DomainError::not_found("reply", reply_id))?;

        let notice = match self.owning_comment(&reply).await? {
            Some(comment) => self.notices.get(comment.notice_id).await?,
            None => None,
        };
        let is_owner = notice.map(|n| n.created_by == requester.id).unwrap_or(false);
        if reply.user_id != requester.id && !is_owner && requester.role != Role::Admin {
            return Err(DomainError::Forbidden(
                "not authorized to delete this reply".into(),
            ));
        }

        self.delete_reply_subtrees(vec![reply]).await?;
        tracing::debug!(%reply_id, "reply subtree deleted");
        Ok(())
    }

    /// Walks parent links upward until the root comment is reached.
    /// Returns `None` for orphaned chains (a parent deleted concurrently).
    async fn owning_comment(&self, reply: &Reply) -> Result<Option<Comment>> {
        let mut current = reply.clone();
        loop {
            if let Some(comment_id) = current.comment_id {
                return self.comments.get(comment_id).await;
            }
            let Some(parent_id) = current.parent_reply_id else {
                // Unreachable for rows that satisfy the storage CHECK
                // constraint, but a broken row must not loop forever.
                return Ok(None);
            };
            match self.replies.get(parent_id).await? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Physically deletes the given replies and all their descendants,
    /// children strictly before parents. The traversal records nodes in
    /// parent-before-child order, so deleting in reverse yields a valid
    /// post-order; an interrupted run leaves only complete subtrees
    /// missing and can be finished by retrying.
    async fn delete_reply_subtrees(&self, roots: Vec<Reply>) -> Result<()> {
        let mut stack = roots;
        let mut ordered: Vec<Uuid> = Vec::new();
        while let Some(reply) = stack.pop() {
            ordered.push(reply.id);
            stack.extend(self.replies.list_children(reply.id).await?);
        }
        for id in ordered.iter().rev() {
            // A false return means someone else removed it first; the goal
            // state is reached either way.
            self.replies.delete(*id).await?;
        }
        Ok(())
    }

    async fn authoring_user(&self, author: &AuthUser) -> Result<domains::User> {
        let user = self
            .users
            .get(author.id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("user not found".into()))?;
        if !user.may_comment() {
            return Err(DomainError::Forbidden(
                "account is not allowed to comment".into(),
            ));
        }
        Ok(user)
    }
}

fn non_empty(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::BadRequest("text is required".into()));
    }
    Ok(trimmed)
}

/// Pure tree assembly: indexes replies by immediate parent once, then
/// grows each comment's tree from the map — O(replies) instead of the
/// O(depth × replies) repeated-filter variant.
pub(crate) fn assemble_thread(
    comments: Vec<Comment>,
    replies: Vec<Reply>,
    actors: &HashMap<Uuid, ActorView>,
) -> Vec<CommentNode> {
    let mut by_comment: HashMap<Uuid, Vec<Reply>> = HashMap::new();
    let mut by_parent: HashMap<Uuid, Vec<Reply>> = HashMap::new();
    for reply in replies {
        match (reply.comment_id, reply.parent_reply_id) {
            (Some(cid), _) => by_comment.entry(cid).or_default().push(reply),
            (None, Some(pid)) => by_parent.entry(pid).or_default().push(reply),
            (None, None) => {
                tracing::warn!(reply_id = %reply.id, "reply with no parent link; skipping");
            }
        }
    }

    comments
        .into_iter()
        .map(|comment| {
            let roots = by_comment.remove(&comment.id).unwrap_or_default();
            let replies = roots
                .into_iter()
                .map(|r| grow(r, &by_parent, actors))
                .collect();
            CommentNode {
                id: comment.id,
                notice_id: comment.notice_id,
                author: actor_for(actors, comment.user_id),
                text: comment.text,
                time: hours_ago(comment.created_at),
                created_at: comment.created_at,
                replies,
            }
        })
        .collect()
}

fn grow(
    reply: Reply,
    by_parent: &HashMap<Uuid, Vec<Reply>>,
    actors: &HashMap<Uuid, ActorView>,
) -> ReplyNode {
    let children = by_parent
        .get(&reply.id)
        .into_iter()
        .flatten()
        .cloned()
        .map(|child| grow(child, by_parent, actors))
        .collect();
    ReplyNode {
        id: reply.id,
        author: actor_for(actors, reply.user_id),
        text: reply.text,
        time: hours_ago(reply.created_at),
        created_at: reply.created_at,
        children,
    }
}

fn actor_for(actors: &HashMap<Uuid, ActorView>, user_id: Uuid) -> ActorView {
    actors
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| ActorView::unknown(user_id))
}
