//! `PostgreSQL` storage backend for Eventdesk.
//!
//! This crate implements the `Repository` trait from `eventdesk-core` on top
//! of sqlx. It provides:
//!
//! - Unique constraints on category names, `(event, ticket type)` and
//!   `(user, event)`, mapped to conflict errors
//! - Cascade delete from events to pricing and registrations
//! - Restricted delete of categories still referenced by events
//! - Atomic admission using a transaction and a row lock on the event
//! - Embedded migrations (`migrations/`)
//!
//! # Example
//!
//! ```no_run
//! use eventdesk_postgres::PostgresRepository;
//! use sqlx::postgres::PgPoolOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = PostgresRepository::connect_with(
//!     "postgres://localhost/eventdesk",
//!     PgPoolOptions::new().max_connections(5),
//! )
//! .await?;
//! repository.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod rows;

pub use repository::PostgresRepository;
