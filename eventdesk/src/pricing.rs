//! Ticket pricing per event.

use crate::environment::RegistryEnvironment;
use eventdesk_core::error::RegistryError;
use eventdesk_core::policy::{Action, AuthorizationPolicy};
use eventdesk_core::types::{
    Actor, Currency, Event, EventId, Price, PricingPatch, TicketId, TicketPricing,
};
use eventdesk_core::validation;

/// Owns the pricing rows of every event.
///
/// Rights over a row follow rights over its owning event.
#[derive(Clone, Debug)]
pub struct PricingBook {
    env: RegistryEnvironment,
}

impl PricingBook {
    /// Create a pricing book over the given environment
    #[must_use]
    pub const fn new(env: RegistryEnvironment) -> Self {
        Self { env }
    }

    async fn owning_event(&self, event_id: EventId) -> Result<Event, RegistryError> {
        self.env
            .repository
            .event(event_id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Event", event_id))
    }

    /// Look up a pricing row.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub async fn pricing(&self, id: TicketId) -> Result<TicketPricing, RegistryError> {
        self.env
            .repository
            .pricing(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Ticket", id))
    }

    /// Add a ticket type to an event.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event is absent, `Unauthenticated`/`Permission`
    /// unless creator or admin, `Validation` on a bad label, `Conflict` if
    /// the ticket type already exists for the event.
    #[tracing::instrument(skip_all, fields(actor = %actor, event_id = %event_id, ticket_type = tracing::field::Empty))]
    pub async fn add_pricing(
        &self,
        actor: &Actor,
        event_id: EventId,
        ticket_type: impl Into<String>,
        price: Price,
        currency: Currency,
    ) -> Result<TicketPricing, RegistryError> {
        let event = self.owning_event(event_id).await?;
        let ticket = TicketPricing {
            id: TicketId::new(),
            event_id,
            ticket_type: ticket_type.into(),
            price,
            currency,
        };
        tracing::Span::current().record("ticket_type", ticket.ticket_type.as_str());

        AuthorizationPolicy::authorize(
            actor,
            &Action::MutatePricing {
                ticket: &ticket,
                event: &event,
            },
        )?;
        validation::validate_ticket_type(&ticket.ticket_type)?;

        self.env.repository.insert_pricing(ticket.clone()).await?;
        tracing::info!(
            ticket_id = %ticket.id,
            price = %ticket.price,
            currency = %ticket.currency,
            "Pricing added"
        );
        Ok(ticket)
    }

    /// Update a pricing row.
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Unauthenticated`/`Permission`, then `Validation`,
    /// `Conflict` if renamed onto an existing ticket type.
    #[tracing::instrument(skip_all, fields(actor = %actor, ticket_id = %id))]
    pub async fn update_pricing(
        &self,
        actor: &Actor,
        id: TicketId,
        patch: PricingPatch,
    ) -> Result<TicketPricing, RegistryError> {
        let mut ticket = self.pricing(id).await?;
        let event = self.owning_event(ticket.event_id).await?;
        AuthorizationPolicy::authorize(
            actor,
            &Action::MutatePricing {
                ticket: &ticket,
                event: &event,
            },
        )?;
        validation::validate_pricing_patch(&patch)?;

        patch.apply_to(&mut ticket);
        self.env.repository.update_pricing(ticket.clone()).await?;
        tracing::info!("Pricing updated");
        Ok(ticket)
    }

    /// Delete a pricing row.
    ///
    /// # Errors
    ///
    /// `NotFound`, then `Unauthenticated`/`Permission`.
    #[tracing::instrument(skip_all, fields(actor = %actor, ticket_id = %id))]
    pub async fn delete_pricing(&self, actor: &Actor, id: TicketId) -> Result<(), RegistryError> {
        let ticket = self.pricing(id).await?;
        let event = self.owning_event(ticket.event_id).await?;
        AuthorizationPolicy::authorize(
            actor,
            &Action::MutatePricing {
                ticket: &ticket,
                event: &event,
            },
        )?;
        self.env.repository.delete_pricing(id).await?;
        tracing::info!("Pricing deleted");
        Ok(())
    }

    /// Pricing rows of an event in insertion order.
    ///
    /// An unknown event has no pricing rows.
    ///
    /// # Errors
    ///
    /// `Storage` on backend failure.
    pub async fn list_pricing(
        &self,
        event_id: EventId,
    ) -> Result<Vec<TicketPricing>, RegistryError> {
        self.env.repository.pricing_for_event(event_id).await
    }
}
