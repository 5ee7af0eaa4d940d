//! # Postgres store
//!
//! sqlx implementation of the repository ports. Data mapping follows the
//! relational model in `migrations/`: enums travel as TEXT and are parsed
//! back at the boundary, the like/share pair uniqueness is a unique index
//! surfaced as `Conflict`, and the transitive reply listing is a recursive
//! CTE.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use domains::{
    Comment, CommentRepo, DomainError, Like, LikeRepo, Notice, NoticeRepo, Notification,
    NotificationKind, NotificationRepo, ReadFilter, Reply, ReplyRepo, Result, Role, Share,
    ShareRepo, Target, TeacherStatus, User, UserRepo,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_err(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return DomainError::Conflict("already exists".into());
        }
    }
    DomainError::Internal(e.to_string())
}

fn parse_role(s: &str) -> Result<Role> {
    Role::parse(s).ok_or_else(|| DomainError::Internal(format!("invalid role in store: {s}")))
}

fn parse_target(s: &str) -> Result<Target> {
    Target::parse(s).ok_or_else(|| DomainError::Internal(format!("invalid target in store: {s}")))
}

fn parse_kind(s: &str) -> Result<NotificationKind> {
    NotificationKind::parse(s)
        .ok_or_else(|| DomainError::Internal(format!("invalid notification kind in store: {s}")))
}

fn row_to_user(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: parse_role(&row.get::<String, _>("role"))?,
        dept: row.get("dept"),
        session: row.get("session"),
        section: row.get("section"),
        status: row
            .get::<Option<String>, _>("status")
            .as_deref()
            .and_then(TeacherStatus::parse),
        is_enabled: row.get("is_enabled"),
        is_verified: row.get("is_verified"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
    })
}

fn row_to_notice(row: &PgRow) -> Result<Notice> {
    Ok(Notice {
        id: row.get("id"),
        text: row.get("text"),
        category: row.get("category"),
        target: parse_target(&row.get::<String, _>("target"))?,
        department: row.get("department"),
        session: row.get("session"),
        section: row.get("section"),
        image: row.get("image"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    })
}

fn row_to_comment(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        notice_id: row.get("notice_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

fn row_to_reply(row: &PgRow) -> Reply {
    Reply {
        id: row.get("id"),
        comment_id: row.get("comment_id"),
        parent_reply_id: row.get("parent_reply_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert(&self, user: User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, role, dept, \
             session, section, status, is_enabled, is_verified, avatar, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.dept)
        .bind(&user.session)
        .bind(&user.section)
        .bind(user.status.map(|s| s.as_str()))
        .bind(user.is_enabled)
        .bind(user.is_verified)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_user(&row))
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_user(&row))
            .transpose()
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_user)
            .collect()
    }

    async fn update(&self, user: User) -> Result<User> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $2, last_name = $3, email = $4, password_hash = $5, \
             role = $6, dept = $7, session = $8, section = $9, status = $10, is_enabled = $11, \
             is_verified = $12, avatar = $13 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.dept)
        .bind(&user.session)
        .bind(&user.section)
        .bind(user.status.map(|s| s.as_str()))
        .bind(user.is_enabled)
        .bind(user.is_verified)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user", user.id));
        }
        Ok(user)
    }

    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        sqlx::query("SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_user)
            .collect()
    }

    async fn distinct_sessions(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT session FROM users \
             WHERE role = 'student' AND session IS NOT NULL ORDER BY session",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.iter().map(|r| r.get("session")).collect())
    }

    async fn distinct_departments(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT dept FROM users \
             WHERE role IN ('student', 'teacher') AND dept IS NOT NULL ORDER BY dept",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.iter().map(|r| r.get("dept")).collect())
    }

    async fn distinct_sections(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT section FROM users \
             WHERE role = 'student' AND section IS NOT NULL ORDER BY section",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.iter().map(|r| r.get("section")).collect())
    }
}

#[async_trait]
impl NoticeRepo for PgStore {
    async fn insert(&self, notice: Notice) -> Result<Notice> {
        sqlx::query(
            "INSERT INTO notices (id, text, category, target, department, session, section, \
             image, created_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(notice.id)
        .bind(&notice.text)
        .bind(&notice.category)
        .bind(notice.target.as_str())
        .bind(&notice.department)
        .bind(&notice.session)
        .bind(&notice.section)
        .bind(&notice.image)
        .bind(notice.created_by)
        .bind(notice.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(notice)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notice>> {
        sqlx::query("SELECT * FROM notices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_notice(&row))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Notice>> {
        sqlx::query("SELECT * FROM notices ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_notice)
            .collect()
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Notice>> {
        sqlx::query("SELECT * FROM notices WHERE category = $1 ORDER BY created_at DESC")
            .bind(category)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_notice)
            .collect()
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Notice>> {
        sqlx::query("SELECT * FROM notices WHERE created_by = $1 ORDER BY created_at DESC")
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_notice)
            .collect()
    }

    async fn list_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Notice>> {
        sqlx::query("SELECT * FROM notices WHERE created_by = ANY($1) ORDER BY created_at DESC")
            .bind(author_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_notice)
            .collect()
    }

    async fn update(&self, notice: Notice) -> Result<Notice> {
        let result = sqlx::query(
            "UPDATE notices SET text = $2, category = $3, target = $4, department = $5, \
             session = $6, section = $7, image = $8 WHERE id = $1",
        )
        .bind(notice.id)
        .bind(&notice.text)
        .bind(&notice.category)
        .bind(notice.target.as_str())
        .bind(&notice.department)
        .bind(&notice.session)
        .bind(&notice.section)
        .bind(&notice.image)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("notice", notice.id));
        }
        Ok(notice)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM notices")
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT category FROM notices ORDER BY category")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(rows.iter().map(|r| r.get("category")).collect())
    }
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, notice_id, user_id, text, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(comment.notice_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(comment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(sqlx::query("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_comment(&row)))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Comment>> {
        let rows =
            sqlx::query("SELECT * FROM comments WHERE notice_id = $1 ORDER BY created_at DESC")
                .bind(notice_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM comments WHERE notice_id = $1")
            .bind(notice_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl ReplyRepo for PgStore {
    async fn insert(&self, reply: Reply) -> Result<Reply> {
        sqlx::query(
            "INSERT INTO replies (id, comment_id, parent_reply_id, user_id, text, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(reply.id)
        .bind(reply.comment_id)
        .bind(reply.parent_reply_id)
        .bind(reply.user_id)
        .bind(&reply.text)
        .bind(reply.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(reply)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reply>> {
        Ok(sqlx::query("SELECT * FROM replies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_reply(&row)))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Reply>> {
        // Nested replies carry no comment_id, so the direct join is not
        // enough; walk the parent links with a recursive CTE.
        let rows = sqlx::query(
            "WITH RECURSIVE tree AS ( \
                 SELECT r.* FROM replies r \
                 JOIN comments c ON r.comment_id = c.id WHERE c.notice_id = $1 \
                 UNION ALL \
                 SELECT r.* FROM replies r JOIN tree t ON r.parent_reply_id = t.id \
             ) SELECT * FROM tree ORDER BY created_at ASC",
        )
        .bind(notice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.iter().map(row_to_reply).collect())
    }

    async fn list_for_comment(&self, comment_id: Uuid) -> Result<Vec<Reply>> {
        let rows =
            sqlx::query("SELECT * FROM replies WHERE comment_id = $1 ORDER BY created_at ASC")
                .bind(comment_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(rows.iter().map(row_to_reply).collect())
    }

    async fn list_children(&self, parent_reply_id: Uuid) -> Result<Vec<Reply>> {
        let rows = sqlx::query(
            "SELECT * FROM replies WHERE parent_reply_id = $1 ORDER BY created_at ASC",
        )
        .bind(parent_reply_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.iter().map(row_to_reply).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM replies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LikeRepo for PgStore {
    async fn insert(&self, like: Like) -> Result<Like> {
        sqlx::query(
            "INSERT INTO likes (id, notice_id, user_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(like.id)
        .bind(like.notice_id)
        .bind(like.user_id)
        .bind(like.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_err(e) {
            DomainError::Conflict(_) => {
                DomainError::Conflict("you already liked this notice".into())
            }
            other => other,
        })?;
        Ok(like)
    }

    async fn delete(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE notice_id = $1 AND user_id = $2")
            .bind(notice_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE notice_id = $1 AND user_id = $2) AS found",
        )
        .bind(notice_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.get("found"))
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Like>> {
        let rows =
            sqlx::query("SELECT * FROM likes WHERE notice_id = $1 ORDER BY created_at DESC")
                .bind(notice_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(rows
            .iter()
            .map(|row| Like {
                id: row.get("id"),
                notice_id: row.get("notice_id"),
                user_id: row.get("user_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM likes WHERE notice_id = $1")
            .bind(notice_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM likes WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[async_trait]
impl ShareRepo for PgStore {
    async fn insert_if_absent(&self, share: Share) -> Result<bool> {
        // The unique index does the check-and-insert atomically; the
        // duplicate case is swallowed here, not surfaced.
        let result = sqlx::query(
            "INSERT INTO shares (id, notice_id, user_id, created_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (notice_id, user_id) DO NOTHING",
        )
        .bind(share.id)
        .bind(share.notice_id)
        .bind(share.user_id)
        .bind(share.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_notice(&self, notice_id: Uuid) -> Result<Vec<Share>> {
        let rows =
            sqlx::query("SELECT * FROM shares WHERE notice_id = $1 ORDER BY created_at DESC")
                .bind(notice_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(rows
            .iter()
            .map(|row| Share {
                id: row.get("id"),
                notice_id: row.get("notice_id"),
                user_id: row.get("user_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn count_for_notice(&self, notice_id: Uuid) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM shares WHERE notice_id = $1")
            .bind(notice_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM shares WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

fn row_to_notification(row: &PgRow) -> Result<Notification> {
    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        from_user_id: row.get("from_user_id"),
        notice_id: row.get("notice_id"),
        kind: parse_kind(&row.get::<String, _>("kind"))?,
        text: row.get("text"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl NotificationRepo for PgStore {
    async fn insert(&self, notification: Notification) -> Result<Notification> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, from_user_id, notice_id, kind, text, \
             is_read, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.from_user_id)
        .bind(notification.notice_id)
        .bind(notification.kind.as_str())
        .bind(&notification.text)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        sqlx::query("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .map(|row| row_to_notification(&row))
            .transpose()
    }

    async fn list_for_user(&self, user_id: Uuid, filter: ReadFilter) -> Result<Vec<Notification>> {
        let sql = match filter {
            ReadFilter::All => {
                "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"
            }
            ReadFilter::Read => {
                "SELECT * FROM notifications WHERE user_id = $1 AND is_read \
                 ORDER BY created_at DESC"
            }
            ReadFilter::Unread => {
                "SELECT * FROM notifications WHERE user_id = $1 AND NOT is_read \
                 ORDER BY created_at DESC"
            }
        };
        sqlx::query(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?
            .iter()
            .map(row_to_notification)
            .collect()
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<u64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS n FROM notifications WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err)?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_notice(&self, notice_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
