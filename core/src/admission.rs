//! Admission control for new registrations.
//!
//! Repositories gather an [`AdmissionSnapshot`] inside their atomic unit
//! (lock or transaction) and call [`check`] before inserting. Because the
//! snapshot and the insert share that unit, two callers racing for the last
//! seat cannot both pass.
//!
//! Check order:
//!
//! ```text
//! event in past?          → Validation("event in past")
//! already registered?     → Conflict("duplicate registration")
//! capacity exhausted?     → Capacity("event full")
//! ```

use crate::error::RegistryError;
use crate::types::{Capacity, Event, EventId, Occupancy};
use chrono::{DateTime, Utc};

/// Everything admission needs to know about an event at the instant of check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionSnapshot {
    /// Event being registered for
    pub event_id: EventId,
    /// When the event takes place
    pub event_date: DateTime<Utc>,
    /// Event capacity
    pub capacity: Capacity,
    /// Current count of `registered` registrations
    pub seats_taken: u32,
    /// Whether the user already has a registration in any status
    pub already_registered: bool,
}

impl AdmissionSnapshot {
    /// Builds a snapshot from a stored event and live counts.
    #[must_use]
    pub const fn of(event: &Event, seats_taken: u32, already_registered: bool) -> Self {
        Self {
            event_id: event.id,
            event_date: event.date,
            capacity: event.capacity,
            seats_taken,
            already_registered,
        }
    }

    /// Occupancy at the instant of check.
    #[must_use]
    pub const fn occupancy(&self) -> Occupancy {
        Occupancy::new(self.capacity, self.seats_taken)
    }
}

/// Decides whether a new registration may be admitted.
///
/// An event dated exactly `now` is still open.
///
/// # Errors
///
/// - [`RegistryError::Validation`] if the event date is before `now`
/// - [`RegistryError::Conflict`] if the user is already registered
/// - [`RegistryError::Capacity`] if the event is full
pub fn check(snapshot: &AdmissionSnapshot, now: DateTime<Utc>) -> Result<(), RegistryError> {
    if snapshot.event_date < now {
        return Err(RegistryError::validation("event in past"));
    }

    if snapshot.already_registered {
        return Err(RegistryError::conflict("duplicate registration"));
    }

    check_capacity(snapshot)
}

/// Capacity check alone, used when a registration moves back to
/// `registered` from another status.
///
/// # Errors
///
/// Returns [`RegistryError::Capacity`] if the event is full.
pub fn check_capacity(snapshot: &AdmissionSnapshot) -> Result<(), RegistryError> {
    if snapshot.occupancy().is_full() {
        return Err(RegistryError::capacity("event full"));
    }
    Ok(())
}
