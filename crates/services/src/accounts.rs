//! # Account Administration
//!
//! Admin-side user management: approving and rejecting teacher
//! registrations, flipping the enabled flag that gates write actions,
//! and the dashboard insight counts. Profile edits by the account owner
//! live here too.
//!
//! Rejection does not delete the account — the row stays `pending` and
//! is disabled, so the email cannot be re-registered and the teacher
//! never passes the authoring gate.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{AuthUser, DomainError, NoticeRepo, Result, Role, TeacherStatus, User, UserRepo};

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Insights {
    pub students: u64,
    pub teachers: u64,
    pub pending_teachers: u64,
    pub notices: u64,
}

/// Owner-editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dept: Option<String>,
    pub session: Option<String>,
    pub section: Option<String>,
    pub avatar: Option<String>,
}

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    notices: Arc<dyn NoticeRepo>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, notices: Arc<dyn NoticeRepo>) -> Self {
        Self { users, notices }
    }

    /// Accounts of one role, newest-first. Admin only.
    pub async fn list_users(&self, role: Role, auth: &AuthUser) -> Result<Vec<User>> {
        require_admin(auth)?;
        self.users.list_by_role(role).await
    }

    /// Marks a pending teacher as accepted. Admin only.
    pub async fn approve_teacher(&self, teacher_id: Uuid, auth: &AuthUser) -> Result<User> {
        require_admin(auth)?;
        let mut teacher = self.get_role(teacher_id, Role::Teacher).await?;
        teacher.status = Some(TeacherStatus::Accepted);
        let teacher = self.users.update(teacher).await?;
        tracing::info!(teacher_id = %teacher.id, "teacher approved");
        Ok(teacher)
    }

    /// Turns down a pending teacher: the account stays pending and is
    /// disabled. Admin only.
    pub async fn reject_teacher(&self, teacher_id: Uuid, auth: &AuthUser) -> Result<User> {
        require_admin(auth)?;
        let mut teacher = self.get_role(teacher_id, Role::Teacher).await?;
        teacher.status = Some(TeacherStatus::Pending);
        teacher.is_enabled = false;
        let teacher = self.users.update(teacher).await?;
        tracing::info!(teacher_id = %teacher.id, "teacher rejected");
        Ok(teacher)
    }

    /// Flips the enabled flag of a teacher account. Admin only.
    pub async fn toggle_teacher_enabled(&self, teacher_id: Uuid, auth: &AuthUser) -> Result<User> {
        require_admin(auth)?;
        let mut teacher = self.get_role(teacher_id, Role::Teacher).await?;
        teacher.is_enabled = !teacher.is_enabled;
        self.users.update(teacher).await
    }

    /// Flips the enabled flag of a student account. Admin only.
    pub async fn toggle_student_enabled(&self, student_id: Uuid, auth: &AuthUser) -> Result<User> {
        require_admin(auth)?;
        let mut student = self.get_role(student_id, Role::Student).await?;
        student.is_enabled = !student.is_enabled;
        self.users.update(student).await
    }

    /// Dashboard counts. Admin only.
    pub async fn insights(&self, auth: &AuthUser) -> Result<Insights> {
        require_admin(auth)?;
        let students = self.users.list_ids_by_role(Role::Student).await?.len() as u64;
        let teachers = self.users.list_by_role(Role::Teacher).await?;
        let pending_teachers = teachers
            .iter()
            .filter(|t| t.status == Some(TeacherStatus::Pending))
            .count() as u64;
        Ok(Insights {
            students,
            teachers: teachers.len() as u64,
            pending_teachers,
            notices: self.notices.count().await?,
        })
    }

    /// Applies the caller's own profile edits. Role, email, status, and
    /// the enabled flag are not reachable from here.
    pub async fn update_profile(&self, auth: &AuthUser, update: ProfileUpdate) -> Result<User> {
        let mut user = self
            .users
            .get(auth.id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", auth.id))?;
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(dept) = update.dept {
            user.dept = Some(dept);
        }
        if let Some(session) = update.session {
            user.session = Some(session);
        }
        if let Some(section) = update.section {
            user.section = Some(section);
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }
        self.users.update(user).await
    }

    async fn get_role(&self, id: Uuid, role: Role) -> Result<User> {
        let user = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))?;
        if user.role != role {
            return Err(DomainError::BadRequest(format!(
                "user is not a {}",
                role.as_str()
            )));
        }
        Ok(user)
    }
}

fn require_admin(auth: &AuthUser) -> Result<()> {
    if auth.role != Role::Admin {
        return Err(DomainError::Forbidden("admin privileges required".into()));
    }
    Ok(())
}
