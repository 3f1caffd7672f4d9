//! Upcoming-event sequences and fixed-size pages over them.

use crate::error::RegistryError;
use crate::types::Event;
use serde::{Deserialize, Serialize};

/// Number of results per page.
pub const PAGE_SIZE: usize = 10;

/// A finite, ordered result of an upcoming-events query.
///
/// Iteration borrows the snapshot, so the sequence can be walked any number
/// of times and always yields the same events in the same order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpcomingEvents {
    events: Vec<Event>,
}

impl UpcomingEvents {
    /// Wraps an already filtered and ordered list.
    #[must_use]
    pub const fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Lazy iterator from the first event.
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pages (at least one, possibly empty).
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.events.len().div_ceil(PAGE_SIZE).max(1)
    }

    /// One-based page `number`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for page 0 or a page past the end.
    /// Page 1 of an empty sequence is valid and empty.
    pub fn page(&self, number: usize) -> Result<Page<Event>, RegistryError> {
        if number == 0 || number > self.page_count() {
            return Err(RegistryError::not_found("Page", number));
        }
        let start = (number - 1) * PAGE_SIZE;
        let results = self
            .events
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        Ok(Page {
            results,
            count: self.events.len(),
            number,
            next: (number < self.page_count()).then_some(number + 1),
            previous: (number > 1).then(|| number - 1),
        })
    }

    /// Consumes the sequence.
    #[must_use]
    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a UpcomingEvents {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub results: Vec<T>,
    /// Total items across all pages
    pub count: usize,
    /// This page's one-based number
    pub number: usize,
    /// Next page number, if any
    pub next: Option<usize>,
    /// Previous page number, if any
    pub previous: Option<usize>,
}
