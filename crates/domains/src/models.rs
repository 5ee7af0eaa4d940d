//! # Domain Models
//!
//! These structs represent the core entities of Campus-Board.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. The set is closed: anything that is not a student,
/// teacher, or admin cannot exist in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Admin approval state for teacher accounts. Students and admins carry
/// no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherStatus {
    Pending,
    Accepted,
}

impl TeacherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherStatus::Pending => "pending",
            TeacherStatus::Accepted => "accepted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TeacherStatus::Pending),
            "accepted" => Some(TeacherStatus::Accepted),
            _ => None,
        }
    }
}

/// A registered account: student, teacher, or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 hash; absent for accounts that have not completed registration.
    /// Never serialized outward.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: Role,
    /// Targeting attributes. Role-dependent: students carry all three,
    /// teachers carry `dept` only, admins carry none.
    pub dept: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
    /// Meaningful only for teachers.
    pub status: Option<TeacherStatus>,
    /// Gates write actions for teachers and students.
    pub is_enabled: bool,
    /// Set after OTP confirmation.
    pub is_verified: bool,
    /// Opaque blob-store URL.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Notices may be authored by admins and by approved, enabled teachers.
    pub fn may_author_notices(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Teacher => self.status == Some(TeacherStatus::Accepted) && self.is_enabled,
            Role::Student => false,
        }
    }

    /// Comments and replies may be authored by admins, enabled students,
    /// and approved, enabled teachers.
    pub fn may_comment(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Teacher => self.status == Some(TeacherStatus::Accepted) && self.is_enabled,
            Role::Student => self.is_enabled,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Top-level audience dimension of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    All,
    Students,
    Teachers,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::All => "all",
            Target::Students => "students",
            Target::Teachers => "teachers",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Target::All),
            "students" => Some(Target::Students),
            "teachers" => Some(Target::Teachers),
            _ => None,
        }
    }
}

/// A posted announcement with an audience-targeting scope.
///
/// `department`, `session`, and `section` are `None` when the notice is
/// open to every audience in that dimension. `session` and `section` are
/// only meaningful when `target = students`; [`Notice::normalize_audience`]
/// clears them otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub text: String,
    /// Free-form; deduplicated for suggestion lists.
    pub category: String,
    pub target: Target,
    pub department: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
    /// Opaque blob-store URL.
    pub image: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    /// Enforces the invariant that `session`/`section` are only set when
    /// the notice targets students.
    pub fn normalize_audience(&mut self) {
        if self.target != Target::Students {
            self.session = None;
            self.section = None;
        }
    }
}

/// A top-level discussion entry attached to a notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub notice_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A node in the unbounded-depth reply tree rooted at a comment.
///
/// Exactly one of `comment_id` / `parent_reply_id` is set — the storage
/// layer enforces this with a CHECK constraint, and the service layer only
/// constructs replies through [`ReplyParent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Option<Uuid>,
    pub parent_reply_id: Option<Uuid>,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Where a new reply attaches. Makes "both or neither" unrepresentable
/// inside the core; the API boundary is where that BadRequest lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyParent {
    Comment(Uuid),
    Reply(Uuid),
}

/// One like per (notice, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub notice_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One share per (notice, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub notice_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The event class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    LikeNotice,
    CommentNotice,
    ReplyComment,
    /// Reserved; nothing emits this today.
    LikeComment,
    ShareNotice,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LikeNotice => "like-notice",
            NotificationKind::CommentNotice => "comment-notice",
            NotificationKind::ReplyComment => "reply-comment",
            NotificationKind::LikeComment => "like-comment",
            NotificationKind::ShareNotice => "share-notice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like-notice" => Some(NotificationKind::LikeNotice),
            "comment-notice" => Some(NotificationKind::CommentNotice),
            "reply-comment" => Some(NotificationKind::ReplyComment),
            "like-comment" => Some(NotificationKind::LikeComment),
            "share-notice" => Some(NotificationKind::ShareNotice),
            _ => None,
        }
    }
}

/// A recorded event surfaced to a user as the side effect of another
/// user's engagement or comment action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    /// Actor.
    pub from_user_id: Uuid,
    pub notice_id: Option<Uuid>,
    pub kind: NotificationKind,
    /// Free text snapshot taken at emission time.
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Read-state filter for the notification feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

/// The already-authenticated identity a request carries. Produced by the
/// credential service; the core never sees tokens or passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}
