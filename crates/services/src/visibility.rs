//! # Visibility Resolver
//!
//! Decides which notices a given user is entitled to see. This is a
//! capability filter recomputed on every read, not a stored ACL: the cost
//! is O(notices × OR-clauses), which is fine at notice-board scale.
//!
//! One pure predicate per role, selected by role dispatch — the same
//! OR-composed clauses are then shared by the unfiltered and the
//! category-filtered read paths instead of being duplicated per path.

use domains::{Notice, Role, Target, User};

/// True when `user` may see `notice`, per the role-dependent audience
/// rules.
pub fn visible_to(user: &User, notice: &Notice) -> bool {
    match user.role {
        Role::Admin => true,
        Role::Teacher => teacher_sees(user, notice),
        Role::Student => student_sees(user, notice),
    }
}

/// Filters `notices` down to the subset `user` may see, optionally within
/// one category, ordered newest-first.
pub fn resolve(user: &User, mut notices: Vec<Notice>, category: Option<&str>) -> Vec<Notice> {
    notices.retain(|n| {
        category.is_none_or(|c| n.category == c) && visible_to(user, n)
    });
    notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notices
}

/// `None` on a notice dimension means "every audience in this dimension".
fn dimension_matches(notice_value: &Option<String>, own_value: &Option<String>) -> bool {
    match notice_value {
        None => true,
        Some(v) => own_value.as_deref() == Some(v.as_str()),
    }
}

/// A teacher sees a notice when any clause matches:
/// - target=all and the department is open or their own
/// - target=teachers and the department is open or their own
/// - target=students and they authored it themselves (teachers manage
///   their own student-facing notices)
fn teacher_sees(user: &User, notice: &Notice) -> bool {
    match notice.target {
        Target::All => dimension_matches(&notice.department, &user.dept),
        Target::Teachers => dimension_matches(&notice.department, &user.dept),
        Target::Students => notice.created_by == user.id,
    }
}

/// A student sees a notice when any clause matches:
/// - target=all and the department is open or their own
/// - target=students and any of session/department/section is open or
///   their own
fn student_sees(user: &User, notice: &Notice) -> bool {
    match notice.target {
        Target::All => dimension_matches(&notice.department, &user.dept),
        Target::Students => {
            dimension_matches(&notice.session, &user.session)
                || dimension_matches(&notice.department, &user.dept)
                || dimension_matches(&notice.section, &user.section)
        }
        Target::Teachers => false,
    }
}
