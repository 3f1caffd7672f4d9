//! In-memory repository for fast, deterministic testing.
//!
//! Every operation holds one async mutex for its whole duration, so the
//! admission check and the insert in [`Repository::admit`] can never
//! interleave with another admission.

use chrono::{DateTime, Utc};
use eventdesk_core::admission::{self, AdmissionSnapshot};
use eventdesk_core::error::RegistryError;
use eventdesk_core::filter::EventFilter;
use eventdesk_core::listing::UpcomingEvents;
use eventdesk_core::repository::{AdmissionRequest, RepoFuture, Repository, StatusChange};
use eventdesk_core::types::{
    CategoryId, Event, EventCategory, EventId, Registration, RegistrationId, TicketId,
    TicketPricing, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    categories: HashMap<CategoryId, EventCategory>,
    events: HashMap<EventId, Event>,
    // Vecs keep insertion order for listing
    tickets: Vec<TicketPricing>,
    registrations: Vec<Registration>,
}

impl State {
    fn seats_taken(&self, event_id: EventId) -> u32 {
        let count = self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status.holds_seat())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn require_category(&self, id: CategoryId) -> Result<(), RegistryError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(RegistryError::validation(format!("Category {id} does not exist")))
        }
    }

    fn ticket_type_taken(&self, ticket: &TicketPricing) -> bool {
        self.tickets.iter().any(|t| {
            t.id != ticket.id
                && t.event_id == ticket.event_id
                && t.ticket_type == ticket.ticket_type
        })
    }
}

/// `HashMap`-backed [`Repository`] guarded by a tokio mutex.
///
/// Cloning shares the underlying storage.
///
/// # Example
///
/// ```
/// use eventdesk_testing::InMemoryRepository;
/// use eventdesk_core::repository::Repository;
/// use eventdesk_core::types::{CategoryId, EventCategory};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = InMemoryRepository::new();
/// let category = EventCategory {
///     id: CategoryId::new(),
///     name: "Conference".to_string(),
///     description: String::new(),
/// };
/// repository.insert_category(category.clone()).await?;
/// assert_eq!(repository.category(category.id).await?, Some(category));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    /// Create a new empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored registrations, across all events
    pub async fn registration_count(&self) -> usize {
        self.state.lock().await.registrations.len()
    }

    /// Total number of stored pricing rows, across all events
    pub async fn pricing_count(&self) -> usize {
        self.state.lock().await.tickets.len()
    }
}

impl Repository for InMemoryRepository {
    fn insert_category(&self, category: EventCategory) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.categories.values().any(|c| c.name == category.name) {
                return Err(RegistryError::conflict(format!(
                    "Category '{}' already exists",
                    category.name
                )));
            }
            state.categories.insert(category.id, category);
            Ok(())
        })
    }

    fn category(&self, id: CategoryId) -> RepoFuture<'_, Option<EventCategory>> {
        Box::pin(async move { Ok(self.state.lock().await.categories.get(&id).cloned()) })
    }

    fn categories(&self) -> RepoFuture<'_, Vec<EventCategory>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut categories: Vec<_> = state.categories.values().cloned().collect();
            categories.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(categories)
        })
    }

    fn update_category(&self, category: EventCategory) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.categories.contains_key(&category.id) {
                return Err(RegistryError::not_found("Category", category.id));
            }
            if state
                .categories
                .values()
                .any(|c| c.id != category.id && c.name == category.name)
            {
                return Err(RegistryError::conflict(format!(
                    "Category '{}' already exists",
                    category.name
                )));
            }
            state.categories.insert(category.id, category);
            Ok(())
        })
    }

    fn delete_category(&self, id: CategoryId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.categories.contains_key(&id) {
                return Err(RegistryError::not_found("Category", id));
            }
            if state.events.values().any(|e| e.category_id == id) {
                return Err(RegistryError::conflict("Category is still referenced by events"));
            }
            state.categories.remove(&id);
            Ok(())
        })
    }

    fn insert_event(&self, event: Event) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.require_category(event.category_id)?;
            state.events.insert(event.id, event);
            Ok(())
        })
    }

    fn event(&self, id: EventId) -> RepoFuture<'_, Option<Event>> {
        Box::pin(async move { Ok(self.state.lock().await.events.get(&id).cloned()) })
    }

    fn update_event(&self, event: Event) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.events.contains_key(&event.id) {
                return Err(RegistryError::not_found("Event", event.id));
            }
            state.require_category(event.category_id)?;
            state.events.insert(event.id, event);
            Ok(())
        })
    }

    fn delete_event(&self, id: EventId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.events.remove(&id).is_none() {
                return Err(RegistryError::not_found("Event", id));
            }
            state.tickets.retain(|t| t.event_id != id);
            state.registrations.retain(|r| r.event_id != id);
            Ok(())
        })
    }

    fn upcoming_events(
        &self,
        filter: EventFilter,
        now: DateTime<Utc>,
    ) -> RepoFuture<'_, UpcomingEvents> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(UpcomingEvents::new(filter.apply(state.events.values(), now)))
        })
    }

    fn seats_taken(&self, event_id: EventId) -> RepoFuture<'_, u32> {
        Box::pin(async move { Ok(self.state.lock().await.seats_taken(event_id)) })
    }

    fn insert_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if !state.events.contains_key(&ticket.event_id) {
                return Err(RegistryError::not_found("Event", ticket.event_id));
            }
            if state.ticket_type_taken(&ticket) {
                return Err(RegistryError::conflict(format!(
                    "Ticket type '{}' already exists for this event",
                    ticket.ticket_type
                )));
            }
            state.tickets.push(ticket);
            Ok(())
        })
    }

    fn pricing(&self, id: TicketId) -> RepoFuture<'_, Option<TicketPricing>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.tickets.iter().find(|t| t.id == id).cloned())
        })
    }

    fn update_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let Some(index) = state.tickets.iter().position(|t| t.id == ticket.id) else {
                return Err(RegistryError::not_found("Ticket", ticket.id));
            };
            if state.ticket_type_taken(&ticket) {
                return Err(RegistryError::conflict(format!(
                    "Ticket type '{}' already exists for this event",
                    ticket.ticket_type
                )));
            }
            state.tickets[index] = ticket;
            Ok(())
        })
    }

    fn delete_pricing(&self, id: TicketId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let before = state.tickets.len();
            state.tickets.retain(|t| t.id != id);
            if state.tickets.len() == before {
                return Err(RegistryError::not_found("Ticket", id));
            }
            Ok(())
        })
    }

    fn pricing_for_event(&self, event_id: EventId) -> RepoFuture<'_, Vec<TicketPricing>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state
                .tickets
                .iter()
                .filter(|t| t.event_id == event_id)
                .cloned()
                .collect())
        })
    }

    fn admit(&self, request: AdmissionRequest) -> RepoFuture<'_, Registration> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let event = state
                .events
                .get(&request.event_id)
                .ok_or_else(|| RegistryError::not_found("Event", request.event_id))?;

            let already_registered = state
                .registrations
                .iter()
                .any(|r| r.event_id == request.event_id && r.user_id == request.user_id);
            let snapshot = AdmissionSnapshot::of(
                event,
                state.seats_taken(request.event_id),
                already_registered,
            );
            admission::check(&snapshot, request.now)?;

            let registration = Registration::new(
                request.registration_id,
                request.user_id,
                request.event_id,
                request.now,
            );
            state.registrations.push(registration.clone());
            Ok(registration)
        })
    }

    fn registration(&self, id: RegistrationId) -> RepoFuture<'_, Option<Registration>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.registrations.iter().find(|r| r.id == id).cloned())
        })
    }

    fn registrations_for_event(
        &self,
        event_id: EventId,
        user: Option<UserId>,
    ) -> RepoFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            let mut registrations: Vec<_> = state
                .registrations
                .iter()
                .filter(|r| r.event_id == event_id && user.is_none_or(|u| r.user_id == u))
                .cloned()
                .collect();
            registrations.sort_by_key(|r| r.registered_at);
            Ok(registrations)
        })
    }

    fn change_registration_status(&self, change: StatusChange) -> RepoFuture<'_, Registration> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            let Some(current) = state
                .registrations
                .iter()
                .find(|r| r.id == change.registration_id)
                .cloned()
            else {
                return Err(RegistryError::not_found("Registration", change.registration_id));
            };

            if change.check(current.status)? {
                let event = state
                    .events
                    .get(&current.event_id)
                    .ok_or_else(|| RegistryError::not_found("Event", current.event_id))?;
                let snapshot =
                    AdmissionSnapshot::of(event, state.seats_taken(current.event_id), false);
                admission::check_capacity(&snapshot)?;
            }

            let updated = Registration {
                status: change.status,
                ..current
            };
            if let Some(slot) = state.registrations.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated.clone();
            }
            Ok(updated)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use eventdesk_core::error::ErrorKind;
    use eventdesk_core::types::{Capacity, RegistrationStatus};

    async fn seeded(capacity: u32) -> (InMemoryRepository, Event) {
        let repository = InMemoryRepository::new();
        let category = EventCategory {
            id: CategoryId::new(),
            name: "Conference".to_string(),
            description: String::new(),
        };
        repository.insert_category(category.clone()).await.unwrap();
        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
            title: "Launch".to_string(),
            description: String::new(),
            date: now + Duration::days(5),
            location: "Lagos".to_string(),
            category_id: category.id,
            created_by: UserId::new(),
            capacity: Capacity::new(capacity),
            created_at: now,
        };
        repository.insert_event(event.clone()).await.unwrap();
        (repository, event)
    }

    fn request(event: &Event, user: UserId) -> AdmissionRequest {
        AdmissionRequest {
            registration_id: RegistrationId::new(),
            user_id: user,
            event_id: event.id,
            now: Utc::now(),
        }
    }

    #[tokio::test]
    async fn admit_rejects_duplicates_and_full_events() {
        let (repository, event) = seeded(1).await;
        let user = UserId::new();
        repository.admit(request(&event, user)).await.unwrap();

        let duplicate = repository.admit(request(&event, user)).await.unwrap_err();
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);

        let full = repository
            .admit(request(&event, UserId::new()))
            .await
            .unwrap_err();
        assert_eq!(full.kind(), ErrorKind::Capacity);
        assert_eq!(repository.registration_count().await, 1);
    }

    #[tokio::test]
    async fn deleting_event_cascades() {
        let (repository, event) = seeded(0).await;
        repository
            .admit(request(&event, UserId::new()))
            .await
            .unwrap();
        repository.delete_event(event.id).await.unwrap();
        assert_eq!(repository.registration_count().await, 0);
        assert_eq!(repository.event(event.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn referenced_category_cannot_be_deleted() {
        let (repository, event) = seeded(0).await;
        let err = repository
            .delete_category(event.category_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn reinstating_into_full_event_is_refused() {
        let (repository, event) = seeded(1).await;
        let first = repository
            .admit(request(&event, UserId::new()))
            .await
            .unwrap();
        repository
            .change_registration_status(StatusChange::cancel(first.id))
            .await
            .unwrap();
        repository
            .admit(request(&event, UserId::new()))
            .await
            .unwrap();

        let reinstate = StatusChange::set(first.id, RegistrationStatus::Registered);
        let err = repository
            .change_registration_status(reinstate)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capacity);
    }
}
