//! Field and date rules for drafts and patches.
//!
//! These run inside the domain operations regardless of caller; storage only
//! backs them up with hard uniqueness constraints.

use crate::error::RegistryError;
use crate::types::{CategoryDraft, CategoryPatch, EventDraft, EventPatch, PricingPatch};
use chrono::{DateTime, Utc};

/// Longest category name accepted.
pub const MAX_CATEGORY_NAME_LEN: usize = 120;
/// Longest event title accepted.
pub const MAX_TITLE_LEN: usize = 255;
/// Longest event location accepted.
pub const MAX_LOCATION_LEN: usize = 255;
/// Longest ticket type label accepted.
pub const MAX_TICKET_TYPE_LEN: usize = 80;

/// Requires an event date strictly after `now`.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] if `date <= now`.
pub fn validate_event_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), RegistryError> {
    if date <= now {
        return Err(RegistryError::validation("Event date must be in the future"));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str, max: usize) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(RegistryError::validation(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

/// Validates a category draft.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on an empty or overlong name.
pub fn validate_category_draft(draft: &CategoryDraft) -> Result<(), RegistryError> {
    validate_text("Category name", &draft.name, MAX_CATEGORY_NAME_LEN)
}

/// Validates a category patch.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on an empty patch or a bad name.
pub fn validate_category_patch(patch: &CategoryPatch) -> Result<(), RegistryError> {
    if patch.name.is_none() && patch.description.is_none() {
        return Err(RegistryError::validation("No fields to update"));
    }
    if let Some(name) = &patch.name {
        validate_text("Category name", name, MAX_CATEGORY_NAME_LEN)?;
    }
    Ok(())
}

/// Validates an event draft against the current time.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on a non-future date or malformed
/// title/location.
pub fn validate_event_draft(draft: &EventDraft, now: DateTime<Utc>) -> Result<(), RegistryError> {
    validate_text("Title", &draft.title, MAX_TITLE_LEN)?;
    validate_text("Location", &draft.location, MAX_LOCATION_LEN)?;
    validate_event_date(draft.date, now)
}

/// Validates an event patch against the current time.
///
/// A supplied date is always re-checked, even when equal to the stored one.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on an empty patch, a non-future
/// date or malformed title/location.
pub fn validate_event_patch(patch: &EventPatch, now: DateTime<Utc>) -> Result<(), RegistryError> {
    if patch.is_empty() {
        return Err(RegistryError::validation("No fields to update"));
    }
    if let Some(title) = &patch.title {
        validate_text("Title", title, MAX_TITLE_LEN)?;
    }
    if let Some(location) = &patch.location {
        validate_text("Location", location, MAX_LOCATION_LEN)?;
    }
    if let Some(date) = patch.date {
        validate_event_date(date, now)?;
    }
    Ok(())
}

/// Validates a ticket type label.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on an empty or overlong label.
pub fn validate_ticket_type(ticket_type: &str) -> Result<(), RegistryError> {
    validate_text("Ticket type", ticket_type, MAX_TICKET_TYPE_LEN)
}

/// Validates a pricing patch.
///
/// # Errors
///
/// Returns [`RegistryError::Validation`] on an empty patch or bad label.
pub fn validate_pricing_patch(patch: &PricingPatch) -> Result<(), RegistryError> {
    if patch.ticket_type.is_none() && patch.price.is_none() && patch.currency.is_none() {
        return Err(RegistryError::validation("No fields to update"));
    }
    if let Some(ticket_type) = &patch.ticket_type {
        validate_ticket_type(ticket_type)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{Capacity, CategoryId};
    use chrono::Duration;

    fn draft(now: DateTime<Utc>) -> EventDraft {
        EventDraft {
            title: "Launch".to_string(),
            description: String::new(),
            date: now + Duration::days(5),
            location: "Lagos".to_string(),
            category_id: CategoryId::new(),
            capacity: Capacity::new(1),
        }
    }

    #[test]
    fn event_date_must_be_strictly_future() {
        let now = Utc::now();
        assert!(validate_event_date(now + Duration::seconds(1), now).is_ok());
        assert_eq!(
            validate_event_date(now, now).map_err(|e| e.kind()),
            Err(ErrorKind::Validation)
        );
        assert!(validate_event_date(now - Duration::days(1), now).is_err());
    }

    #[test]
    fn draft_requires_title_and_location() {
        let now = Utc::now();
        assert!(validate_event_draft(&draft(now), now).is_ok());

        let mut blank = draft(now);
        blank.title = "   ".to_string();
        assert!(validate_event_draft(&blank, now).is_err());

        let mut long = draft(now);
        long.location = "x".repeat(MAX_LOCATION_LEN + 1);
        assert!(validate_event_draft(&long, now).is_err());
    }

    #[test]
    fn patch_with_past_date_fails() {
        let now = Utc::now();
        let patch = EventPatch {
            date: Some(now - Duration::hours(1)),
            ..EventPatch::default()
        };
        assert!(validate_event_patch(&patch, now).is_err());
        assert!(validate_event_patch(&EventPatch::default(), now).is_err());
    }

    #[test]
    fn category_name_limits() {
        let ok = CategoryDraft {
            name: "Conference".to_string(),
            description: String::new(),
        };
        assert!(validate_category_draft(&ok).is_ok());
        let long = CategoryDraft {
            name: "c".repeat(MAX_CATEGORY_NAME_LEN + 1),
            description: String::new(),
        };
        assert!(validate_category_draft(&long).is_err());
    }
}
