//! Authorization policy.
//!
//! Pure predicates deciding whether an [`Actor`] may perform an action on a
//! target. Reads of categories, events and pricing are unconditional and
//! therefore have no predicate here.
//!
//! | Action                         | Allowed for                    |
//! |--------------------------------|--------------------------------|
//! | write category                 | admin                          |
//! | create event                   | any authenticated user         |
//! | mutate event / its pricing     | admin, event creator           |
//! | view all registrations         | admin, event creator           |
//! | manage one registration        | admin, event creator, owner    |
//!
//! Failures surface as [`RegistryError::Unauthenticated`] for anonymous
//! callers and [`RegistryError::Permission`] otherwise.

use crate::error::RegistryError;
use crate::types::{Actor, Event, Registration, TicketPricing};

/// An action to authorize, carrying its target.
#[derive(Clone, Copy, Debug)]
pub enum Action<'a> {
    /// Create, update or delete a category
    WriteCategory,
    /// Create a new event
    CreateEvent,
    /// Update or delete an event
    MutateEvent(&'a Event),
    /// Create, update or delete a pricing row of an event
    MutatePricing {
        /// Pricing row (for create, a row not yet stored)
        ticket: &'a TicketPricing,
        /// The row's owning event
        event: &'a Event,
    },
    /// List every registration of an event
    ViewAllRegistrations(&'a Event),
    /// Read, cancel or change the status of one registration
    ManageRegistration {
        /// Registration
        registration: &'a Registration,
        /// Its event
        event: &'a Event,
    },
    /// Administrative status change on a registration
    SetRegistrationStatus(&'a Event),
}

impl Action<'_> {
    /// Short human-readable description used in error messages.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::WriteCategory => "modify categories",
            Self::CreateEvent => "create events",
            Self::MutateEvent(_) => "modify this event",
            Self::MutatePricing { .. } => "modify tickets for this event",
            Self::ViewAllRegistrations(_) => "view all registrations for this event",
            Self::ManageRegistration { .. } => "manage this registration",
            Self::SetRegistrationStatus(_) => "change registration status for this event",
        }
    }
}

/// Stateless authorization policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Only admins write categories.
    #[must_use]
    pub const fn can_write_category(actor: &Actor) -> bool {
        actor.is_admin()
    }

    /// Any authenticated user may create events.
    #[must_use]
    pub const fn can_create_event(actor: &Actor) -> bool {
        actor.is_authenticated()
    }

    /// Admins and the event's creator may mutate it.
    #[must_use]
    pub fn can_mutate_event(actor: &Actor, event: &Event) -> bool {
        actor.is_admin() || actor.is(event.created_by)
    }

    /// Pricing follows the rights over its owning event.
    ///
    /// A ticket presented with an event it does not belong to is refused.
    #[must_use]
    pub fn can_mutate_pricing(actor: &Actor, ticket: &TicketPricing, event: &Event) -> bool {
        ticket.event_id == event.id && Self::can_mutate_event(actor, event)
    }

    /// Admins and the event's creator see every registration.
    #[must_use]
    pub fn can_view_all_registrations(actor: &Actor, event: &Event) -> bool {
        actor.is_admin() || actor.is(event.created_by)
    }

    /// The registrant, the event's creator and admins may manage a registration.
    #[must_use]
    pub fn can_manage_registration(
        actor: &Actor,
        registration: &Registration,
        event: &Event,
    ) -> bool {
        registration.event_id == event.id
            && (actor.is(registration.user_id) || Self::can_view_all_registrations(actor, event))
    }

    /// Keyed dispatch over every action.
    #[must_use]
    pub fn allows(actor: &Actor, action: &Action<'_>) -> bool {
        match action {
            Action::WriteCategory => Self::can_write_category(actor),
            Action::CreateEvent => Self::can_create_event(actor),
            Action::MutateEvent(event) => Self::can_mutate_event(actor, event),
            Action::MutatePricing { ticket, event } => {
                Self::can_mutate_pricing(actor, ticket, event)
            }
            Action::ViewAllRegistrations(event) | Action::SetRegistrationStatus(event) => {
                Self::can_view_all_registrations(actor, event)
            }
            Action::ManageRegistration {
                registration,
                event,
            } => Self::can_manage_registration(actor, registration, event),
        }
    }

    /// Like [`AuthorizationPolicy::allows`], but as a `Result`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unauthenticated`] if the actor is anonymous
    /// - [`RegistryError::Permission`] if the actor is known but not allowed
    pub fn authorize(actor: &Actor, action: &Action<'_>) -> Result<(), RegistryError> {
        if Self::allows(actor, action) {
            return Ok(());
        }
        if actor.is_authenticated() {
            Err(RegistryError::permission(format!("You are not allowed to {}", action.describe())))
        } else {
            Err(RegistryError::unauthenticated(format!("Log in to {}", action.describe())))
        }
    }

    /// Requires an authenticated actor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unauthenticated`] for anonymous actors.
    pub fn require_authenticated(actor: &Actor) -> Result<(), RegistryError> {
        if actor.is_authenticated() {
            Ok(())
        } else {
            Err(RegistryError::unauthenticated("Authentication credentials were not provided"))
        }
    }
}
