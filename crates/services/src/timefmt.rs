//! Display-time helpers for the feed surfaces.

use chrono::{DateTime, Utc};

/// Whole-hours-ago display value, e.g. "5h ago". Sub-hour ages floor to
/// "0h ago", matching the notice-board UI convention.
pub fn hours_ago(created_at: DateTime<Utc>) -> String {
    hours_ago_at(created_at, Utc::now())
}

pub(crate) fn hours_ago_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - created_at).num_hours().max(0);
    format!("{hours}h ago")
}
