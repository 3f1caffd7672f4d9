//! Registrations and admission control.
//!
//! ```text
//! register(actor, event)
//!   anonymous?            → Unauthenticated
//!   ┌─ one atomic unit in the repository ───────────────┐
//!   │ event missing?      → NotFound                      │
//!   │ event.date < now?   → Validation("event in past")   │
//!   │ already registered? → Conflict("duplicate ...")     │
//!   │ event full?         → Capacity("event full")        │
//!   │ insert (registered, now)                            │
//!   └────────────────────────────────────────────────────┘
//! ```
//!
//! Seat counts are always computed live from `registered` rows, so a
//! cancellation frees its seat for the very next admission.

use crate::environment::RegistryEnvironment;
use crate::metrics;
use eventdesk_core::error::RegistryError;
use eventdesk_core::policy::{Action, AuthorizationPolicy};
use eventdesk_core::repository::{AdmissionRequest, StatusChange};
use eventdesk_core::types::{
    Actor, Event, EventId, Registration, RegistrationId, RegistrationStatus, UserId,
};

/// Owns registrations.
#[derive(Clone, Debug)]
pub struct RegistrationLedger {
    env: RegistryEnvironment,
}

impl RegistrationLedger {
    /// Create a ledger over the given environment
    #[must_use]
    pub const fn new(env: RegistryEnvironment) -> Self {
        Self { env }
    }

    fn registrant(actor: &Actor) -> Result<UserId, RegistryError> {
        AuthorizationPolicy::require_authenticated(actor)?;
        actor.user_id().ok_or_else(|| {
            RegistryError::unauthenticated("Authentication credentials were not provided")
        })
    }

    async fn event(&self, id: EventId) -> Result<Event, RegistryError> {
        self.env
            .repository
            .event(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Event", id))
    }

    /// Loads a registration with its event for an authorization decision.
    async fn registration_with_event(
        &self,
        id: RegistrationId,
    ) -> Result<(Registration, Event), RegistryError> {
        let registration = self
            .env
            .repository
            .registration(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Registration", id))?;
        let event = self.event(registration.event_id).await?;
        Ok((registration, event))
    }

    /// Register the calling user for an event.
    ///
    /// # Errors
    ///
    /// In order: `Unauthenticated`, `NotFound`, `Validation("event in past")`,
    /// `Conflict("duplicate registration")`, `Capacity("event full")`.
    #[tracing::instrument(skip_all, fields(actor = %actor, event_id = %event_id))]
    pub async fn register(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> Result<Registration, RegistryError> {
        let user_id = Self::registrant(actor)?;
        let request = AdmissionRequest {
            registration_id: RegistrationId::new(),
            user_id,
            event_id,
            now: self.env.now(),
        };

        let result = self.env.repository.admit(request).await;
        metrics::record_registration(&result);
        match &result {
            Ok(registration) => {
                tracing::info!(registration_id = %registration.id, "Registration admitted");
            }
            Err(e) if e.is_admission_rejection() => {
                tracing::info!(reason = %e, "Registration rejected");
            }
            Err(e) => tracing::warn!(error = %e, "Registration failed"),
        }
        result
    }

    /// Registrations of an event visible to the caller.
    ///
    /// The event's creator and admins see every registration; anyone else
    /// sees only their own (zero or one).
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous callers, `NotFound` for an unknown event.
    pub async fn list_registrations(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> Result<Vec<Registration>, RegistryError> {
        let user_id = Self::registrant(actor)?;
        let event = self.event(event_id).await?;
        let only = if AuthorizationPolicy::allows(actor, &Action::ViewAllRegistrations(&event)) {
            None
        } else {
            Some(user_id)
        };
        self.env
            .repository
            .registrations_for_event(event_id, only)
            .await
    }

    /// Look up one registration (owner, event creator or admin).
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `NotFound`, then `Permission`.
    pub async fn registration(
        &self,
        actor: &Actor,
        id: RegistrationId,
    ) -> Result<Registration, RegistryError> {
        Self::registrant(actor)?;
        let (registration, event) = self.registration_with_event(id).await?;
        AuthorizationPolicy::authorize(
            actor,
            &Action::ManageRegistration {
                registration: &registration,
                event: &event,
            },
        )?;
        Ok(registration)
    }

    /// Cancel a registration (owner, event creator or admin).
    ///
    /// Only a `registered` registration can be cancelled.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `NotFound`, `Permission`, then `Conflict` if the
    /// registration is not currently `registered`.
    #[tracing::instrument(skip_all, fields(actor = %actor, registration_id = %id))]
    pub async fn cancel(
        &self,
        actor: &Actor,
        id: RegistrationId,
    ) -> Result<Registration, RegistryError> {
        Self::registrant(actor)?;
        let (registration, event) = self.registration_with_event(id).await?;
        AuthorizationPolicy::authorize(
            actor,
            &Action::ManageRegistration {
                registration: &registration,
                event: &event,
            },
        )?;

        let cancelled = self
            .env
            .repository
            .change_registration_status(StatusChange::cancel(id))
            .await?;
        metrics::record_registration_cancelled();
        tracing::info!(event_id = %cancelled.event_id, "Registration cancelled");
        Ok(cancelled)
    }

    /// Administrative status change (event creator or admin).
    ///
    /// Moving back to `registered` reclaims a seat and is refused if the
    /// event is full at that instant.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `NotFound`, `Permission`, then `Capacity`.
    #[tracing::instrument(skip_all, fields(actor = %actor, registration_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: RegistrationId,
        status: RegistrationStatus,
    ) -> Result<Registration, RegistryError> {
        Self::registrant(actor)?;
        let (_, event) = self.registration_with_event(id).await?;
        AuthorizationPolicy::authorize(actor, &Action::SetRegistrationStatus(&event))?;

        let updated = self
            .env
            .repository
            .change_registration_status(StatusChange::set(id, status))
            .await?;
        metrics::record_status_change(status);
        tracing::info!("Registration status changed");
        Ok(updated)
    }
}
