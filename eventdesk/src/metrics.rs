//! Business metrics for the registration engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventdesk_registrations_total{outcome}` - Registration attempts by outcome
//!   (`registered`, `duplicate`, `full`, `past`, `not_found`, `error`)
//! - `eventdesk_registrations_cancelled_total` - Registrations cancelled
//! - `eventdesk_registration_status_changes_total{status}` - Administrative status changes
//! - `eventdesk_events_created_total` - Events created
//! - `eventdesk_storage_constraint_violations_total{kind}` - Constraint backstops hit
//!   by the `PostgreSQL` backend

use eventdesk_core::error::{ErrorKind, RegistryError};
use eventdesk_core::types::RegistrationStatus;
use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventdesk_registrations_total",
        "Total number of registration attempts by outcome"
    );
    describe_counter!(
        "eventdesk_registrations_cancelled_total",
        "Total number of registrations cancelled"
    );
    describe_counter!(
        "eventdesk_registration_status_changes_total",
        "Total number of administrative registration status changes by target status"
    );
    describe_counter!(
        "eventdesk_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "eventdesk_storage_constraint_violations_total",
        "Storage constraint violations mapped to domain errors"
    );

    tracing::info!("Business metrics registered");
}

/// Outcome label for a registration attempt.
#[must_use]
pub const fn registration_outcome<T>(result: &Result<T, RegistryError>) -> &'static str {
    match result {
        Ok(_) => "registered",
        Err(e) => match e.kind() {
            ErrorKind::Conflict => "duplicate",
            ErrorKind::Capacity => "full",
            ErrorKind::Validation => "past",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthenticated | ErrorKind::Permission | ErrorKind::Storage => "error",
        },
    }
}

/// Record a registration attempt.
pub fn record_registration<T>(result: &Result<T, RegistryError>) {
    let outcome = registration_outcome(result);
    metrics::counter!("eventdesk_registrations_total", "outcome" => outcome).increment(1);
    tracing::debug!(outcome, "Recorded registration metric");
}

/// Record a cancelled registration.
pub fn record_registration_cancelled() {
    metrics::counter!("eventdesk_registrations_cancelled_total").increment(1);
}

/// Record an administrative status change.
pub fn record_status_change(status: RegistrationStatus) {
    metrics::counter!("eventdesk_registration_status_changes_total", "status" => status.as_str())
        .increment(1);
}

/// Record an event created.
pub fn record_event_created() {
    metrics::counter!("eventdesk_events_created_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(
            registration_outcome(&Ok::<(), RegistryError>(())),
            "registered"
        );
        assert_eq!(
            registration_outcome::<()>(&Err(RegistryError::capacity("event full"))),
            "full"
        );
        assert_eq!(
            registration_outcome::<()>(&Err(RegistryError::conflict("duplicate registration"))),
            "duplicate"
        );
        assert_eq!(
            registration_outcome::<()>(&Err(RegistryError::validation("event in past"))),
            "past"
        );
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        register_business_metrics();
        record_registration(&Ok::<(), RegistryError>(()));
        record_event_created();
        record_registration_cancelled();
        record_status_change(RegistrationStatus::Attended);
    }
}
