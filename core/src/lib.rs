//! # Eventdesk Core
//!
//! Domain types and rules for the Eventdesk registration engine.
//!
//! This crate holds everything that must behave identically no matter which
//! storage backend is in use:
//!
//! - **Types**: events, categories, ticket pricing, registrations, actors
//! - **Policy**: who may do what ([`policy::AuthorizationPolicy`])
//! - **Admission**: the ordered checks gating a new registration
//! - **Validation**: field and date rules for drafts and patches
//! - **Filtering**: the upcoming-events query and its pagination
//! - **Repository**: the storage contract implemented by backends
//!
//! ## Architecture Principles
//!
//! - Pure rules, injected time (see [`environment::Clock`])
//! - One validation path shared by every repository implementation
//! - Storage enforces uniqueness as a backstop, never as the only check
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use eventdesk_core::admission::{self, AdmissionSnapshot};
//! use eventdesk_core::types::{Capacity, EventId};
//!
//! let now = Utc::now();
//! let snapshot = AdmissionSnapshot {
//!     event_id: EventId::new(),
//!     event_date: now + Duration::days(5),
//!     capacity: Capacity::new(1),
//!     seats_taken: 1,
//!     already_registered: false,
//! };
//!
//! // The last seat is gone
//! assert!(admission::check(&snapshot, now).is_err());
//! ```

#![forbid(unsafe_code)]

pub mod admission;
pub mod error;
pub mod filter;
pub mod listing;
pub mod policy;
pub mod repository;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{ErrorKind, RegistryError};
pub use rust_decimal::Decimal;

/// Environment module - Dependency injection traits
///
/// All time-dependent rules read the current instant through [`Clock`] so
/// tests can pin or advance time deterministically.
pub mod environment {
    use chrono::{DateTime, SubsecRound, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventdesk_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Truncate an instant to microseconds, the precision storage keeps.
    ///
    /// Every instant written to a repository must pass through here first.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Timelike, Utc};
    /// use eventdesk_core::environment::truncate_micros;
    ///
    /// let precise = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    /// assert_eq!(truncate_micros(precise).nanosecond(), 123_456_000);
    /// ```
    #[must_use]
    pub fn truncate_micros(instant: DateTime<Utc>) -> DateTime<Utc> {
        instant.trunc_subsecs(6)
    }
}
