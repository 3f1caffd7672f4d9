//! Shared setup for the integration suites.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, Utc};
use eventdesk::EventDesk;
use eventdesk::types::{Actor, Capacity, CategoryId, EventDraft, EventId};
use eventdesk_core::environment::Clock;
use eventdesk_testing::{ManualClock, fixtures};
use std::sync::Arc;

/// An engine on a manual clock with one category and an admin.
pub struct Harness {
    pub desk: EventDesk,
    pub clock: Arc<ManualClock>,
    pub admin: Actor,
    pub category: CategoryId,
}

impl Harness {
    pub async fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let desk = EventDesk::with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        let admin = fixtures::admin();
        let category = desk
            .catalog
            .create_category(&admin, fixtures::category("Conference"))
            .await
            .unwrap()
            .id;
        Self {
            desk,
            clock,
            admin,
            category,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Publish "Launch" in Lagos `days` from now.
    pub async fn event(&self, owner: &Actor, days: i64, capacity: u32) -> EventId {
        self.desk
            .catalog
            .create_event(
                owner,
                fixtures::event_draft(self.category, self.now(), days, capacity),
            )
            .await
            .unwrap()
            .id
    }

    /// Publish an event with explicit title and location.
    pub async fn titled(&self, owner: &Actor, title: &str, location: &str, days: i64) -> EventId {
        self.desk
            .catalog
            .create_event(
                owner,
                EventDraft {
                    title: title.to_string(),
                    description: String::new(),
                    date: self.now() + Duration::days(days),
                    location: location.to_string(),
                    category_id: self.category,
                    capacity: Capacity::unlimited(),
                },
            )
            .await
            .unwrap()
            .id
    }
}
