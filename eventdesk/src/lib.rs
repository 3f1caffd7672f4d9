//! Eventdesk - event registration engine
//!
//! Users publish events with a date, location, category and optional
//! capacity, attach ticket pricing, and register for events. Admission is
//! capacity-controlled and atomic: concurrent registrations never push an
//! event past its capacity.
//!
//! # Architecture
//!
//! ```text
//!             ┌──────────────────────── EventDesk ────────────────────────┐
//!             │                                                           │
//!   Actor ──▶ │  Catalog            PricingBook          RegistrationLedger│
//!             │  categories/events  ticket pricing       register/cancel   │
//!             │        │                  │                     │          │
//!             │        └──────────┬───────┴─────────────────────┘          │
//!             │                   ▼                                        │
//!             │          RegistryEnvironment { clock, repository }         │
//!             └───────────────────┬───────────────────────────────────────┘
//!                                 │
//!                 ┌───────────────┴───────────────┐
//!                 ▼                               ▼
//!        InMemoryRepository              PostgresRepository
//!        (mutex-guarded)                 (row lock + constraints)
//! ```
//!
//! # Usage
//!
//! ```
//! use eventdesk::EventDesk;
//! use eventdesk::types::{Actor, Capacity, CategoryDraft, EventDraft, UserId};
//!
//! # tokio_test::block_on(async {
//! let desk = EventDesk::in_memory();
//! let admin = Actor::admin(UserId::new());
//! let category = desk
//!     .catalog
//!     .create_category(&admin, CategoryDraft {
//!         name: "Conference".to_string(),
//!         description: String::new(),
//!     })
//!     .await?;
//!
//! let organiser = Actor::user(UserId::new());
//! let event = desk
//!     .catalog
//!     .create_event(&organiser, EventDraft {
//!         title: "Launch".to_string(),
//!         description: String::new(),
//!         date: eventdesk::Utc::now() + chrono::Duration::days(5),
//!         location: "Lagos".to_string(),
//!         category_id: category.id,
//!         capacity: Capacity::new(1),
//!     })
//!     .await?;
//!
//! desk.ledger.register(&Actor::user(UserId::new()), event.id).await?;
//! assert!(desk.catalog.is_full(event.id).await?);
//! # Ok::<(), eventdesk::RegistryError>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod ledger;
pub mod metrics;
pub mod pricing;

pub use app::{AppError, EventDesk};
pub use catalog::Catalog;
pub use config::Config;
pub use environment::RegistryEnvironment;
pub use ledger::RegistrationLedger;
pub use pricing::PricingBook;

pub use eventdesk_core::filter::{EventFilter, EventOrder};
pub use eventdesk_core::listing::{PAGE_SIZE, Page, UpcomingEvents};
pub use eventdesk_core::{DateTime, Decimal, ErrorKind, RegistryError, Utc, types};
