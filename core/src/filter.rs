//! Upcoming-events query.
//!
//! An [`EventFilter`] narrows the set of events dated at or after `now`.
//! Absent criteria are no-ops. Date bounds are inclusive: both bounds form a
//! closed range, a single bound is one-sided.

use crate::types::{CategoryId, Event};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort key for upcoming events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Event date
    #[default]
    Date,
    /// Creation timestamp
    CreatedAt,
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Oldest first
    #[default]
    Ascending,
    /// Newest first
    Descending,
}

/// Ordering of the upcoming-events sequence. Defaults to date ascending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventOrder {
    /// Sort key
    pub field: OrderField,
    /// Sort direction
    pub direction: Direction,
}

impl EventOrder {
    /// Date, ascending.
    #[must_use]
    pub const fn by_date() -> Self {
        Self {
            field: OrderField::Date,
            direction: Direction::Ascending,
        }
    }

    /// Parses the `ordering` query form: `date`, `-date`, `created_at`,
    /// `-created_at`. Unknown keys yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (direction, key) = match raw.strip_prefix('-') {
            Some(key) => (Direction::Descending, key),
            None => (Direction::Ascending, raw),
        };
        let field = match key {
            "date" => OrderField::Date,
            "created_at" => OrderField::CreatedAt,
            _ => return None,
        };
        Some(Self { field, direction })
    }

    /// Compares two events under this ordering, tie-breaking on id so the
    /// sequence is stable across calls.
    #[must_use]
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let primary = match self.field {
            OrderField::Date => a.date.cmp(&b.date),
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ordered = match self.direction {
            Direction::Ascending => primary,
            Direction::Descending => primary.reverse(),
        };
        ordered.then_with(|| a.id.cmp(&b.id))
    }
}

/// Criteria for listing upcoming events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Case-insensitive title substring
    pub title: Option<String>,
    /// Case-insensitive location substring
    pub location: Option<String>,
    /// Exact category
    pub category: Option<CategoryId>,
    /// Case-insensitive substring matched against title or location
    pub search: Option<String>,
    /// Inclusive lower bound on the event date
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the event date
    pub end_date: Option<DateTime<Utc>>,
    /// Result ordering
    #[serde(default)]
    pub order: EventOrder,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl EventFilter {
    /// Filter narrowing by title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Filter narrowing by location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Filter narrowing by category.
    #[must_use]
    pub const fn category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Filter narrowing by free text.
    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Filter narrowing to `[start, end]`, either side optional.
    #[must_use]
    pub const fn between(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Filter with a different ordering.
    #[must_use]
    pub const fn ordered(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }

    /// Whether `event` belongs to the upcoming set at `now`.
    #[must_use]
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        if event.date < now {
            return false;
        }
        if let Some(title) = &self.title {
            if !contains_ci(&event.title, title) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ci(&event.location, location) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if event.category_id != category {
                return false;
            }
        }
        if let Some(text) = &self.search {
            if !contains_ci(&event.title, text) && !contains_ci(&event.location, text) {
                return false;
            }
        }
        if self.start_date.is_some_and(|start| event.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| event.date > end) {
            return false;
        }
        true
    }

    /// Filters and orders a set of events.
    #[must_use]
    pub fn apply<'a, I>(&self, events: I, now: DateTime<Utc>) -> Vec<Event>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut selected: Vec<Event> = events
            .into_iter()
            .filter(|event| self.matches(event, now))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.order.compare(a, b));
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Capacity, EventId, UserId};
    use chrono::Duration;

    fn event(title: &str, location: &str, category: CategoryId, date: DateTime<Utc>) -> Event {
        Event {
            id: EventId::new(),
            title: title.to_string(),
            description: String::new(),
            date,
            location: location.to_string(),
            category_id: category,
            created_by: UserId::new(),
            capacity: Capacity::unlimited(),
            created_at: date - Duration::days(30),
        }
    }

    #[test]
    fn past_events_never_match() {
        let now = Utc::now();
        let past = event(
            "Launch",
            "Lagos",
            CategoryId::new(),
            now - Duration::hours(1),
        );
        assert!(!EventFilter::default().matches(&past, now));
    }

    #[test]
    fn event_at_now_is_upcoming() {
        let now = Utc::now();
        let e = event("Launch", "Lagos", CategoryId::new(), now);
        assert!(EventFilter::default().matches(&e, now));
    }

    #[test]
    fn title_and_location_are_case_insensitive() {
        let now = Utc::now();
        let e = event(
            "Rust Launch",
            "Lagos Island",
            CategoryId::new(),
            now + Duration::days(1),
        );
        assert!(EventFilter::default().title("launch").matches(&e, now));
        assert!(EventFilter::default().location("LAGOS").matches(&e, now));
        assert!(!EventFilter::default().title("meetup").matches(&e, now));
    }

    #[test]
    fn search_covers_title_or_location() {
        let now = Utc::now();
        let e = event(
            "Launch",
            "Abuja",
            CategoryId::new(),
            now + Duration::days(1),
        );
        assert!(EventFilter::default().search("abu").matches(&e, now));
        assert!(EventFilter::default().search("laun").matches(&e, now));
        assert!(!EventFilter::default().search("kano").matches(&e, now));
    }

    #[test]
    fn date_bounds_are_inclusive_and_optional() {
        let now = Utc::now();
        let date = now + Duration::days(3);
        let e = event("Launch", "Lagos", CategoryId::new(), date);
        let within = |start, end| EventFilter::default().between(start, end).matches(&e, now);

        assert!(within(Some(date), Some(date)));
        assert!(within(Some(date), None));
        assert!(within(None, Some(date)));
        assert!(!within(Some(date + Duration::seconds(1)), None));
        assert!(!within(None, Some(date - Duration::seconds(1))));
    }

    #[test]
    fn apply_orders_by_date_then_respects_direction() {
        let now = Utc::now();
        let category = CategoryId::new();
        let later = event("B", "Lagos", category, now + Duration::days(9));
        let sooner = event("A", "Lagos", category, now + Duration::days(2));
        let events = vec![later.clone(), sooner.clone()];

        let ascending = EventFilter::default().apply(&events, now);
        assert_eq!(ascending, vec![sooner.clone(), later.clone()]);

        let descending = EventFilter::default()
            .ordered(EventOrder::parse("-date").unwrap_or_default())
            .apply(&events, now);
        assert_eq!(descending, vec![later, sooner]);
    }

    #[test]
    fn parse_ordering_keys() {
        assert_eq!(EventOrder::parse("date"), Some(EventOrder::by_date()));
        assert_eq!(
            EventOrder::parse("-created_at"),
            Some(EventOrder {
                field: OrderField::CreatedAt,
                direction: Direction::Descending,
            })
        );
        assert_eq!(EventOrder::parse("title"), None);
    }
}
