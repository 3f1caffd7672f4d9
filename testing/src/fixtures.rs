//! Builders for common test inputs.

use chrono::{DateTime, Duration, Utc};
use eventdesk_core::types::{Actor, Capacity, CategoryDraft, CategoryId, EventDraft, UserId};

/// A fresh regular user.
#[must_use]
pub fn user() -> Actor {
    Actor::user(UserId::new())
}

/// A fresh administrator.
#[must_use]
pub fn admin() -> Actor {
    Actor::admin(UserId::new())
}

/// Category draft with the given name and no description.
#[must_use]
pub fn category(name: &str) -> CategoryDraft {
    CategoryDraft {
        name: name.to_string(),
        description: String::new(),
    }
}

/// Event draft in `category`, `days` after `now`.
///
/// Title "Launch", location "Lagos".
#[must_use]
pub fn event_draft(
    category_id: CategoryId,
    now: DateTime<Utc>,
    days: i64,
    capacity: u32,
) -> EventDraft {
    EventDraft {
        title: "Launch".to_string(),
        description: "Product launch".to_string(),
        date: now + Duration::days(days),
        location: "Lagos".to_string(),
        category_id,
        capacity: Capacity::new(capacity),
    }
}
