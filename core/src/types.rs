//! Domain types for the registration engine.
//!
//! Value objects, entities, drafts and patches for categories, events,
//! ticket pricing and registrations.

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Stable identifier of a user, issued by the identity provider
    UserId
);
uuid_id!(
    /// Unique identifier for an event category
    CategoryId
);
uuid_id!(
    /// Unique identifier for an event
    EventId
);
uuid_id!(
    /// Unique identifier for a ticket pricing row
    TicketId
);
uuid_id!(
    /// Unique identifier for a registration
    RegistrationId
);

// ============================================================================
// Actors
// ============================================================================

/// Role carried by an authenticated user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative rights
    Admin,
    /// Regular user
    #[default]
    User,
}

/// The caller of an operation, as resolved by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// Unauthenticated caller
    Anonymous,
    /// Authenticated caller
    Authenticated {
        /// Stable user id
        id: UserId,
        /// Role of the user
        role: Role,
    },
}

impl Actor {
    /// An authenticated regular user.
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self::Authenticated {
            id,
            role: Role::User,
        }
    }

    /// An authenticated administrator.
    #[must_use]
    pub const fn admin(id: UserId) -> Self {
        Self::Authenticated {
            id,
            role: Role::Admin,
        }
    }

    /// The user id, if authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { id, .. } => Some(*id),
        }
    }

    /// Whether the caller is an authenticated admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Authenticated {
                role: Role::Admin,
                ..
            }
        )
    }

    /// Whether the caller is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Whether the caller is the given user.
    #[must_use]
    pub fn is(&self, user: UserId) -> bool {
        self.user_id() == Some(user)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticated { id, role } => write!(f, "{id} ({role:?})"),
        }
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Maximum number of concurrently `registered` registrations.
///
/// Zero means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a capacity (0 = unlimited)
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Unlimited capacity
    #[must_use]
    pub const fn unlimited() -> Self {
        Self(0)
    }

    /// Raw value (0 = unlimited)
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Whether no limit applies
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "unlimited")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Live seat accounting for one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    /// Event capacity
    pub capacity: Capacity,
    /// Count of registrations in `registered` status
    pub seats_taken: u32,
}

impl Occupancy {
    /// Creates an occupancy snapshot
    #[must_use]
    pub const fn new(capacity: Capacity, seats_taken: u32) -> Self {
        Self {
            capacity,
            seats_taken,
        }
    }

    /// Remaining seats, `None` when capacity is unlimited.
    ///
    /// Never negative: a capacity lowered below the seats already taken
    /// reports zero.
    #[must_use]
    pub const fn seats_available(&self) -> Option<u32> {
        if self.capacity.is_unlimited() {
            None
        } else {
            Some(self.capacity.value().saturating_sub(self.seats_taken))
        }
    }

    /// Whether no further registration can be admitted.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        !self.capacity.is_unlimited() && self.seats_taken >= self.capacity.value()
    }
}

// ============================================================================
// Categories
// ============================================================================

/// A category grouping events (e.g. "Conference").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    /// Category id
    pub id: CategoryId,
    /// Unique name
    pub name: String,
    /// Free-form description (may be empty)
    pub description: String,
}

/// Fields for creating a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
}

/// Partial update of a category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

/// A scheduled event users can register for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event id
    pub id: EventId,
    /// Title
    pub title: String,
    /// Description (may be empty)
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Where the event takes place
    pub location: String,
    /// Owning category
    pub category_id: CategoryId,
    /// The creator, who holds mutation rights
    pub created_by: UserId,
    /// Seat limit (0 = unlimited)
    pub capacity: Capacity,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Builds an event from a validated draft.
    #[must_use]
    pub fn from_draft(
        id: EventId,
        draft: EventDraft,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            date: draft.date,
            location: draft.location,
            category_id: draft.category_id,
            created_by,
            capacity: draft.capacity,
            created_at,
        }
    }

    /// Occupancy given the current count of `registered` registrations.
    #[must_use]
    pub const fn occupancy(&self, seats_taken: u32) -> Occupancy {
        Occupancy::new(self.capacity, seats_taken)
    }
}

/// Fields for creating an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Date (must be strictly in the future)
    pub date: DateTime<Utc>,
    /// Location
    pub location: String,
    /// Category
    pub category_id: CategoryId,
    /// Capacity (0 = unlimited)
    #[serde(default)]
    pub capacity: Capacity,
}

/// Partial update of an event; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New date (must be strictly in the future)
    pub date: Option<DateTime<Utc>>,
    /// New location
    pub location: Option<String>,
    /// New category
    pub category_id: Option<CategoryId>,
    /// New capacity
    pub capacity: Option<Capacity>,
}

impl EventPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.category_id.is_none()
            && self.capacity.is_none()
    }

    /// Applies the patch to an event in place.
    pub fn apply_to(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(category_id) = self.category_id {
            event.category_id = category_id;
        }
        if let Some(capacity) = self.capacity {
            event.capacity = capacity;
        }
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// Largest price accepted: ten digits, two of them decimal.
const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;

/// A non-negative ticket price with at most two decimal places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Validates and wraps an amount.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] if the amount is negative, has
    /// more than two decimal places, or exceeds ten digits.
    pub fn new(amount: Decimal) -> Result<Self, RegistryError> {
        if amount < Decimal::ZERO {
            return Err(RegistryError::validation("Price must not be negative"));
        }
        let normalized = amount.normalize();
        if normalized.scale() > 2 {
            return Err(RegistryError::validation("Price must have at most 2 decimal places"));
        }
        if normalized >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
            return Err(RegistryError::validation("Price must have at most 10 digits"));
        }
        let mut amount = normalized;
        amount.rescale(2);
        Ok(Self(amount))
    }

    /// A free ticket.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = RegistryError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| RegistryError::validation(format!("Invalid price '{s}': {e}")))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Currency code attached to a price (default `USD`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validates a currency code: 1 to 10 uppercase ASCII letters.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] for empty, overlong or
    /// non-alphabetic codes.
    pub fn new(code: impl Into<String>) -> Result<Self, RegistryError> {
        let code = code.into();
        if code.is_empty() || code.len() > 10 {
            return Err(RegistryError::validation(format!(
                "Currency code '{code}' must be 1 to 10 characters"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(RegistryError::validation(format!(
                "Currency code '{code}' must be uppercase letters"
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_string())
    }
}

impl TryFrom<String> for Currency {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One priced ticket type for an event (e.g. "VIP").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPricing {
    /// Ticket id
    pub id: TicketId,
    /// Owning event
    pub event_id: EventId,
    /// Label, unique per event
    pub ticket_type: String,
    /// Price
    pub price: Price,
    /// Currency
    pub currency: Currency,
}

/// Partial update of a ticket pricing row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPatch {
    /// New label
    pub ticket_type: Option<String>,
    /// New price
    pub price: Option<Price>,
    /// New currency
    pub currency: Option<Currency>,
}

impl PricingPatch {
    /// Applies the patch to a pricing row in place.
    pub fn apply_to(self, ticket: &mut TicketPricing) {
        if let Some(ticket_type) = self.ticket_type {
            ticket.ticket_type = ticket_type;
        }
        if let Some(price) = self.price {
            ticket.price = price;
        }
        if let Some(currency) = self.currency {
            ticket.currency = currency;
        }
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// Status of a registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Holds a seat
    #[default]
    Registered,
    /// Attended the event
    Attended,
    /// Cancelled, seat released
    Cancelled,
}

impl RegistrationStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Attended => "attended",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a registration in this status occupies a seat.
    #[must_use]
    pub const fn holds_seat(&self) -> bool {
        matches!(self, Self::Registered)
    }
}

impl FromStr for RegistrationStatus {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "attended" => Ok(Self::Attended),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(RegistryError::validation(format!(
                "Unknown registration status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's registration for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration id
    pub id: RegistrationId,
    /// Registered user
    pub user_id: UserId,
    /// Event registered for
    pub event_id: EventId,
    /// Current status
    pub status: RegistrationStatus,
    /// When the registration was created (immutable)
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// A fresh registration holding a seat.
    #[must_use]
    pub const fn new(
        id: RegistrationId,
        user_id: UserId,
        event_id: EventId,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            event_id,
            status: RegistrationStatus::Registered,
            registered_at,
        }
    }
}
