//! Row tuples and their conversion into domain types.

use chrono::{DateTime, Utc};
use eventdesk_core::error::RegistryError;
use eventdesk_core::types::{
    Capacity, CategoryId, Currency, Event, EventCategory, EventId, Price, Registration,
    RegistrationId, RegistrationStatus, TicketId, TicketPricing, UserId,
};
use rust_decimal::Decimal;
use sqlx::types::Uuid;

pub(crate) const EVENT_COLUMNS: &str =
    "id, title, description, date, location, category_id, created_by, capacity, created_at";
pub(crate) const PRICING_COLUMNS: &str = "id, event_id, ticket_type, price, currency";
pub(crate) const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, registered_at";

pub(crate) type CategoryRow = (Uuid, String, String);

pub(crate) type EventRow = (
    Uuid,
    String,
    String,
    DateTime<Utc>,
    String,
    Uuid,
    Uuid,
    i64,
    DateTime<Utc>,
);

pub(crate) type PricingRow = (Uuid, Uuid, String, Decimal, String);

pub(crate) type RegistrationRow = (Uuid, Uuid, Uuid, String, DateTime<Utc>);

fn corrupt(what: &str, e: impl std::fmt::Display) -> RegistryError {
    RegistryError::storage(format!("Corrupt {what} row: {e}"))
}

pub(crate) fn category((id, name, description): CategoryRow) -> EventCategory {
    EventCategory {
        id: CategoryId::from_uuid(id),
        name,
        description,
    }
}

pub(crate) fn event(row: EventRow) -> Result<Event, RegistryError> {
    let (id, title, description, date, location, category_id, created_by, capacity, created_at) =
        row;
    let capacity = u32::try_from(capacity).map_err(|e| corrupt("event", e))?;
    Ok(Event {
        id: EventId::from_uuid(id),
        title,
        description,
        date,
        location,
        category_id: CategoryId::from_uuid(category_id),
        created_by: UserId::from_uuid(created_by),
        capacity: Capacity::new(capacity),
        created_at,
    })
}

pub(crate) fn pricing(
    (id, event_id, ticket_type, price, currency): PricingRow,
) -> Result<TicketPricing, RegistryError> {
    Ok(TicketPricing {
        id: TicketId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        ticket_type,
        price: Price::new(price).map_err(|e| corrupt("pricing", e))?,
        currency: Currency::new(currency).map_err(|e| corrupt("pricing", e))?,
    })
}

pub(crate) fn registration(
    (id, user_id, event_id, status, registered_at): RegistrationRow,
) -> Result<Registration, RegistryError> {
    let status: RegistrationStatus = status.parse().map_err(|e| corrupt("registration", e))?;
    Ok(Registration {
        id: RegistrationId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        event_id: EventId::from_uuid(event_id),
        status,
        registered_at,
    })
}

/// Count from `COUNT(*)`, saturated into `u32`.
pub(crate) fn count(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}
