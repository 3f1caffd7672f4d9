//! Categories and events.
//!
//! Every mutating operation authorizes through [`AuthorizationPolicy`] and
//! validates through [`eventdesk_core::validation`] before touching storage.
//! Lookups that feed an authorization decision run first, so a missing
//! target reports `NotFound` ahead of `Permission`.

use crate::environment::RegistryEnvironment;
use crate::metrics;
use eventdesk_core::environment::truncate_micros;
use eventdesk_core::error::RegistryError;
use eventdesk_core::filter::EventFilter;
use eventdesk_core::listing::{Page, UpcomingEvents};
use eventdesk_core::policy::{Action, AuthorizationPolicy};
use eventdesk_core::types::{
    Actor, CategoryDraft, CategoryId, CategoryPatch, Event, EventCategory, EventDraft, EventId,
    EventPatch, Occupancy,
};
use eventdesk_core::validation;

/// Owns categories and events.
#[derive(Clone, Debug)]
pub struct Catalog {
    env: RegistryEnvironment,
}

impl Catalog {
    /// Create a catalog over the given environment
    #[must_use]
    pub const fn new(env: RegistryEnvironment) -> Self {
        Self { env }
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    /// Create a category (admin only).
    ///
    /// # Errors
    ///
    /// `Unauthenticated`/`Permission` for non-admins, `Validation` on a bad
    /// name, `Conflict` if the name is taken.
    #[tracing::instrument(skip_all, fields(actor = %actor, name = %draft.name))]
    pub async fn create_category(
        &self,
        actor: &Actor,
        draft: CategoryDraft,
    ) -> Result<EventCategory, RegistryError> {
        AuthorizationPolicy::authorize(actor, &Action::WriteCategory)?;
        validation::validate_category_draft(&draft)?;

        let category = EventCategory {
            id: CategoryId::new(),
            name: draft.name,
            description: draft.description,
        };
        self.env.repository.insert_category(category.clone()).await?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Update a category (admin only).
    ///
    /// # Errors
    ///
    /// `Unauthenticated`/`Permission` for non-admins, `NotFound`,
    /// `Validation` on an empty patch or bad name, `Conflict` on a taken name.
    #[tracing::instrument(skip_all, fields(actor = %actor, category_id = %id))]
    pub async fn update_category(
        &self,
        actor: &Actor,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<EventCategory, RegistryError> {
        AuthorizationPolicy::authorize(actor, &Action::WriteCategory)?;
        validation::validate_category_patch(&patch)?;

        let mut category = self.category(id).await?;
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        self.env.repository.update_category(category.clone()).await?;
        tracing::info!("Category updated");
        Ok(category)
    }

    /// Delete a category (admin only) that no event references.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`/`Permission` for non-admins, `NotFound`, `Conflict`
    /// while events reference it.
    #[tracing::instrument(skip_all, fields(actor = %actor, category_id = %id))]
    pub async fn delete_category(
        &self,
        actor: &Actor,
        id: CategoryId,
    ) -> Result<(), RegistryError> {
        AuthorizationPolicy::authorize(actor, &Action::WriteCategory)?;
        self.env.repository.delete_category(id).await?;
        tracing::info!("Category deleted");
        Ok(())
    }

    /// Look up a category.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub async fn category(&self, id: CategoryId) -> Result<EventCategory, RegistryError> {
        self.env
            .repository
            .category(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Category", id))
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    pub async fn categories(&self) -> Result<Vec<EventCategory>, RegistryError> {
        self.env.repository.categories().await
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Create an event owned by the calling user.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous callers, `Validation` on a date not
    /// strictly in the future, malformed fields or an unknown category.
    #[tracing::instrument(skip_all, fields(actor = %actor, title = %draft.title))]
    pub async fn create_event(
        &self,
        actor: &Actor,
        mut draft: EventDraft,
    ) -> Result<Event, RegistryError> {
        AuthorizationPolicy::authorize(actor, &Action::CreateEvent)?;
        let created_by = actor
            .user_id()
            .ok_or_else(|| RegistryError::unauthenticated("Log in to create events"))?;

        let now = self.env.now();
        draft.date = truncate_micros(draft.date);
        validation::validate_event_draft(&draft, now)?;

        let event = Event::from_draft(EventId::new(), draft, created_by, now);
        self.env.repository.insert_event(event.clone()).await?;

        metrics::record_event_created();
        tracing::info!(
            event_id = %event.id,
            date = %event.date,
            capacity = %event.capacity,
            "Event created"
        );
        Ok(event)
    }

    /// Look up an event.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub async fn event(&self, id: EventId) -> Result<Event, RegistryError> {
        self.env
            .repository
            .event(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Event", id))
    }

    /// Update an event (creator or admin).
    ///
    /// A supplied date is re-validated against the current time even when it
    /// equals the stored one.
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Unauthenticated`/`Permission`, then `Validation`.
    #[tracing::instrument(skip_all, fields(actor = %actor, event_id = %id))]
    pub async fn update_event(
        &self,
        actor: &Actor,
        id: EventId,
        mut patch: EventPatch,
    ) -> Result<Event, RegistryError> {
        let mut event = self.event(id).await?;
        AuthorizationPolicy::authorize(actor, &Action::MutateEvent(&event))?;
        patch.date = patch.date.map(truncate_micros);
        validation::validate_event_patch(&patch, self.env.now())?;

        patch.apply_to(&mut event);
        self.env.repository.update_event(event.clone()).await?;
        tracing::info!("Event updated");
        Ok(event)
    }

    /// Delete an event with its pricing rows and registrations (creator or admin).
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Unauthenticated`/`Permission`.
    #[tracing::instrument(skip_all, fields(actor = %actor, event_id = %id))]
    pub async fn delete_event(&self, actor: &Actor, id: EventId) -> Result<(), RegistryError> {
        let event = self.event(id).await?;
        AuthorizationPolicy::authorize(actor, &Action::MutateEvent(&event))?;
        self.env.repository.delete_event(id).await?;
        tracing::info!("Event deleted");
        Ok(())
    }

    /// Upcoming events (dated at or after now) matching `filter`.
    ///
    /// The result is a snapshot: walk it as many times as needed.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    pub async fn list_upcoming(
        &self,
        filter: EventFilter,
    ) -> Result<UpcomingEvents, RegistryError> {
        self.env
            .repository
            .upcoming_events(filter, self.env.now())
            .await
    }

    /// One page (ten events) of [`Catalog::list_upcoming`].
    ///
    /// # Errors
    ///
    /// `NotFound` for a page out of range, `Storage` on backend failure.
    pub async fn upcoming_page(
        &self,
        filter: EventFilter,
        page: usize,
    ) -> Result<Page<Event>, RegistryError> {
        self.list_upcoming(filter).await?.page(page)
    }

    /// Live seat accounting for an event.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event is absent.
    pub async fn occupancy(&self, id: EventId) -> Result<Occupancy, RegistryError> {
        let event = self.event(id).await?;
        let seats_taken = self.env.repository.seats_taken(id).await?;
        Ok(event.occupancy(seats_taken))
    }

    /// Remaining seats, `None` when capacity is unlimited.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event is absent.
    pub async fn seats_available(&self, id: EventId) -> Result<Option<u32>, RegistryError> {
        Ok(self.occupancy(id).await?.seats_available())
    }

    /// Whether the event admits no further registrations.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event is absent.
    pub async fn is_full(&self, id: EventId) -> Result<bool, RegistryError> {
        Ok(self.occupancy(id).await?.is_full())
    }
}
