//! Shared presentation fragments returned by the feed-shaped services.

use serde::Serialize;
use uuid::Uuid;

use domains::{Role, User};

/// Shown when an actor's account has been deleted out from under a row
/// that still references it.
pub const FALLBACK_AVATAR: &str = "Fallback/avatar.png";

/// How an acting user is displayed in like/share/comment/notification
/// listings.
#[derive(Debug, Clone, Serialize)]
pub struct ActorView {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub avatar: String,
}

impl ActorView {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.display_name(),
            role: user.role,
            avatar: user
                .avatar
                .clone()
                .unwrap_or_else(|| FALLBACK_AVATAR.to_string()),
        }
    }

    /// Placeholder for rows whose author no longer resolves.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: "Unknown".to_string(),
            role: Role::Student,
            avatar: FALLBACK_AVATAR.to_string(),
        }
    }
}
