//! Storage contract for the registration engine.
//!
//! A [`Repository`] stores the four entities and enforces the hard
//! constraints that must hold under concurrent callers:
//!
//! - unique category name, unique `(event, ticket type)`, unique `(user, event)`
//! - events cascade to their pricing rows and registrations on delete
//! - a category cannot be deleted while events reference it
//! - admission ([`Repository::admit`]) and seat-reclaiming status changes
//!   run their checks and their write as one atomic unit
//!
//! Field validation and authorization happen before the repository is
//! called; the repository only re-checks what it alone can see atomically.
//!
//! # Implementations
//!
//! - `InMemoryRepository` (in `eventdesk-testing`): async mutex over maps
//! - `PostgresRepository` (in `eventdesk-postgres`): transactions and row locks
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures so services can hold `Arc<dyn Repository>`.

use crate::error::RegistryError;
use crate::filter::EventFilter;
use crate::listing::UpcomingEvents;
use crate::types::{
    CategoryId, Event, EventCategory, EventId, Registration, RegistrationId, RegistrationStatus,
    TicketId, TicketPricing, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every [`Repository`] method.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RegistryError>> + Send + 'a>>;

/// A request to admit one user to one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Id assigned to the registration if admitted
    pub registration_id: RegistrationId,
    /// Registering user
    pub user_id: UserId,
    /// Target event
    pub event_id: EventId,
    /// Instant of the check, also the registration date
    pub now: DateTime<Utc>,
}

/// A status change on an existing registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// Registration to change
    pub registration_id: RegistrationId,
    /// Required current status, if any
    pub expected: Option<RegistrationStatus>,
    /// New status
    pub status: RegistrationStatus,
}

impl StatusChange {
    /// `registered → cancelled`, refused from any other status.
    #[must_use]
    pub const fn cancel(registration_id: RegistrationId) -> Self {
        Self {
            registration_id,
            expected: Some(RegistrationStatus::Registered),
            status: RegistrationStatus::Cancelled,
        }
    }

    /// Unconditional move to `status`.
    #[must_use]
    pub const fn set(registration_id: RegistrationId, status: RegistrationStatus) -> Self {
        Self {
            registration_id,
            expected: None,
            status,
        }
    }

    /// Checks the change against the registration's current status.
    ///
    /// Returns `true` when the change must reclaim a seat, which requires a
    /// capacity check in the same atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Conflict`] if `expected` does not match.
    pub fn check(&self, current: RegistrationStatus) -> Result<bool, RegistryError> {
        if let Some(expected) = self.expected {
            if expected != current {
                return Err(RegistryError::conflict(format!(
                    "Registration is {current}, expected {expected}"
                )));
            }
        }
        Ok(self.status.holds_seat() && !current.holds_seat())
    }
}

/// Durable storage for categories, events, pricing and registrations.
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Stores a new category.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Conflict`] if the name is taken.
    fn insert_category(&self, category: EventCategory) -> RepoFuture<'_, ()>;

    /// Looks up a category.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn category(&self, id: CategoryId) -> RepoFuture<'_, Option<EventCategory>>;

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn categories(&self) -> RepoFuture<'_, Vec<EventCategory>>;

    /// Replaces a stored category.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, [`RegistryError::Conflict`] if
    /// the new name belongs to another category.
    fn update_category(&self, category: EventCategory) -> RepoFuture<'_, ()>;

    /// Deletes a category.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, [`RegistryError::Conflict`]
    /// while any event references it.
    fn delete_category(&self, id: CategoryId) -> RepoFuture<'_, ()>;

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Stores a new event.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Validation`] if the category does not exist.
    fn insert_event(&self, event: Event) -> RepoFuture<'_, ()>;

    /// Looks up an event.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn event(&self, id: EventId) -> RepoFuture<'_, Option<Event>>;

    /// Replaces a stored event.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, [`RegistryError::Validation`]
    /// if the category does not exist.
    fn update_event(&self, event: Event) -> RepoFuture<'_, ()>;

    /// Deletes an event with its pricing rows and registrations.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent.
    fn delete_event(&self, id: EventId) -> RepoFuture<'_, ()>;

    /// Events dated at or after `now` matching `filter`, in filter order.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn upcoming_events(
        &self,
        filter: EventFilter,
        now: DateTime<Utc>,
    ) -> RepoFuture<'_, UpcomingEvents>;

    /// Live count of `registered` registrations for an event.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn seats_taken(&self, event_id: EventId) -> RepoFuture<'_, u32>;

    // ------------------------------------------------------------------
    // Pricing
    // ------------------------------------------------------------------

    /// Stores a new pricing row.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if the event is absent,
    /// [`RegistryError::Conflict`] if the ticket type exists for the event.
    fn insert_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()>;

    /// Looks up a pricing row.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn pricing(&self, id: TicketId) -> RepoFuture<'_, Option<TicketPricing>>;

    /// Replaces a stored pricing row.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, [`RegistryError::Conflict`] if
    /// renamed onto an existing ticket type.
    fn update_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()>;

    /// Deletes a pricing row.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent.
    fn delete_pricing(&self, id: TicketId) -> RepoFuture<'_, ()>;

    /// Pricing rows of an event in insertion order.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn pricing_for_event(&self, event_id: EventId) -> RepoFuture<'_, Vec<TicketPricing>>;

    // ------------------------------------------------------------------
    // Registrations
    // ------------------------------------------------------------------

    /// Admits a user to an event atomically.
    ///
    /// Loads the event, runs [`crate::admission::check`] and inserts the
    /// registration without letting another admission interleave.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if the event is absent, then whatever
    /// [`crate::admission::check`] reports.
    fn admit(&self, request: AdmissionRequest) -> RepoFuture<'_, Registration>;

    /// Looks up a registration.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn registration(&self, id: RegistrationId) -> RepoFuture<'_, Option<Registration>>;

    /// Registrations of an event by registration date, optionally narrowed
    /// to one user.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Storage`] on backend failure.
    fn registrations_for_event(
        &self,
        event_id: EventId,
        user: Option<UserId>,
    ) -> RepoFuture<'_, Vec<Registration>>;

    /// Applies a status change atomically, re-checking capacity when the
    /// change reclaims a seat.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if absent, [`RegistryError::Conflict`] on
    /// an unexpected current status, [`RegistryError::Capacity`] if a seat
    /// must be reclaimed from a full event.
    fn change_registration_status(&self, change: StatusChange) -> RepoFuture<'_, Registration>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn cancel_requires_registered() {
        let change = StatusChange::cancel(RegistrationId::new());
        assert_eq!(change.check(RegistrationStatus::Registered), Ok(false));
        assert_eq!(
            change
                .check(RegistrationStatus::Cancelled)
                .map_err(|e| e.kind()),
            Err(ErrorKind::Conflict)
        );
        assert!(change.check(RegistrationStatus::Attended).is_err());
    }

    #[test]
    fn reinstating_reclaims_a_seat() {
        let change = StatusChange::set(RegistrationId::new(), RegistrationStatus::Registered);
        assert_eq!(change.check(RegistrationStatus::Cancelled), Ok(true));
        assert_eq!(change.check(RegistrationStatus::Attended), Ok(true));
        assert_eq!(change.check(RegistrationStatus::Registered), Ok(false));

        let attend = StatusChange::set(RegistrationId::new(), RegistrationStatus::Attended);
        assert_eq!(attend.check(RegistrationStatus::Registered), Ok(false));
    }
}
