//! `PostgreSQL` implementation of [`Repository`].

use crate::rows::{
    self, CategoryRow, EVENT_COLUMNS, EventRow, PRICING_COLUMNS, PricingRow, REGISTRATION_COLUMNS,
    RegistrationRow,
};
use chrono::{DateTime, Utc};
use eventdesk_core::admission::{self, AdmissionSnapshot};
use eventdesk_core::environment::truncate_micros;
use eventdesk_core::error::RegistryError;
use eventdesk_core::filter::{Direction, EventFilter, OrderField};
use eventdesk_core::listing::UpcomingEvents;
use eventdesk_core::repository::{AdmissionRequest, RepoFuture, Repository, StatusChange};
use eventdesk_core::types::{
    CategoryId, Event, EventCategory, EventId, Registration, RegistrationId, TicketId,
    TicketPricing, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};

/// Maps a failed statement, turning constraint violations into domain errors.
///
/// `on_unique` and `on_foreign_key` build the error for the respective
/// violation; everything else becomes [`RegistryError::Storage`].
fn map_db_error(
    context: &str,
    e: &sqlx::Error,
    on_unique: impl FnOnce() -> RegistryError,
    on_foreign_key: impl FnOnce() -> RegistryError,
) -> RegistryError {
    if let sqlx::Error::Database(db_err) = e {
        if db_err.is_unique_violation() {
            metrics::counter!("eventdesk_storage_constraint_violations_total", "kind" => "unique")
                .increment(1);
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            metrics::counter!("eventdesk_storage_constraint_violations_total", "kind" => "foreign_key")
                .increment(1);
            return on_foreign_key();
        }
    }
    storage(context, e)
}

fn storage(context: &str, e: &sqlx::Error) -> RegistryError {
    RegistryError::storage(format!("{context}: {e}"))
}

fn duplicate_category(name: &str) -> RegistryError {
    RegistryError::conflict(format!("Category '{name}' already exists"))
}

fn duplicate_ticket_type(ticket_type: &str) -> RegistryError {
    RegistryError::conflict(format!("Ticket type '{ticket_type}' already exists for this event"))
}

fn unknown_category(id: CategoryId) -> RegistryError {
    RegistryError::validation(format!("Category {id} does not exist"))
}

/// Escapes `LIKE` metacharacters and wraps the needle in wildcards.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `PostgreSQL`-backed repository.
///
/// Admission locks the event row with `SELECT ... FOR UPDATE` for the
/// length of a transaction, so concurrent registrations for one event are
/// serialised while registrations for other events proceed in parallel. The
/// `(user_id, event_id)` unique constraint backs up the duplicate check.
///
/// # Example
///
/// ```no_run
/// use eventdesk_postgres::PostgresRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repository = PostgresRepository::connect("postgres://localhost/eventdesk").await?;
/// repository.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with default pool options.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, RegistryError> {
        Self::connect_with(database_url, PgPoolOptions::new().max_connections(10)).await
    }

    /// Connect with caller-supplied pool options.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the connection fails.
    pub async fn connect_with(
        database_url: &str,
        options: PgPoolOptions,
    ) -> Result<Self, RegistryError> {
        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| storage("Failed to connect", &e))?;
        Ok(Self::from_pool(pool))
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if migration fails.
    pub async fn migrate(&self) -> Result<(), RegistryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegistryError::storage(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, RegistryError> {
        self.pool
            .begin()
            .await
            .map_err(|e| storage("Failed to begin transaction", &e))
    }

    async fn lock_event(
        tx: &mut Transaction<'static, Postgres>,
        id: EventId,
    ) -> Result<Option<Event>, RegistryError> {
        let row: Option<EventRow> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| storage("Failed to lock event", &e))?;
        row.map(rows::event).transpose()
    }

    async fn seats_taken_in(
        tx: &mut Transaction<'static, Postgres>,
        event_id: EventId,
    ) -> Result<u32, RegistryError> {
        let (taken,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'registered'",
        )
        .bind(event_id.as_uuid())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| storage("Failed to count seats", &e))?;
        Ok(rows::count(taken))
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), RegistryError> {
        tx.commit()
            .await
            .map_err(|e| storage("Failed to commit transaction", &e))
    }

    #[tracing::instrument(skip(self), fields(event_id = %request.event_id, user_id = %request.user_id))]
    async fn admit_in_transaction(
        &self,
        request: AdmissionRequest,
    ) -> Result<Registration, RegistryError> {
        let mut tx = self.begin().await?;

        let event = Self::lock_event(&mut tx, request.event_id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Event", request.event_id))?;

        let (already_registered,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(request.event_id.as_uuid())
        .bind(request.user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage("Failed to check registration", &e))?;

        let seats_taken = Self::seats_taken_in(&mut tx, request.event_id).await?;
        admission::check(
            &AdmissionSnapshot::of(&event, seats_taken, already_registered),
            request.now,
        )?;

        let registration = Registration::new(
            request.registration_id,
            request.user_id,
            request.event_id,
            truncate_micros(request.now),
        );
        sqlx::query(
            "INSERT INTO registrations (id, user_id, event_id, status, registered_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(registration.id.as_uuid())
        .bind(registration.user_id.as_uuid())
        .bind(registration.event_id.as_uuid())
        .bind(registration.status.as_str())
        .bind(registration.registered_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_db_error(
                "Failed to insert registration",
                &e,
                || RegistryError::conflict("duplicate registration"),
                || RegistryError::not_found("Event", request.event_id),
            )
        })?;

        Self::commit(tx).await?;
        tracing::debug!(registration_id = %registration.id, seats_taken = seats_taken + 1, "admitted");
        Ok(registration)
    }

    #[tracing::instrument(skip(self), fields(registration_id = %change.registration_id))]
    async fn change_status_in_transaction(
        &self,
        change: StatusChange,
    ) -> Result<Registration, RegistryError> {
        let mut tx = self.begin().await?;

        // Lock order matches admission: event row first, then registration.
        let (event_uuid,): (sqlx::types::Uuid,) =
            sqlx::query_as("SELECT event_id FROM registrations WHERE id = $1")
                .bind(change.registration_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| storage("Failed to load registration", &e))?
                .ok_or_else(|| RegistryError::not_found("Registration", change.registration_id))?;
        let event_id = EventId::from_uuid(event_uuid);
        let event = Self::lock_event(&mut tx, event_id)
            .await?
            .ok_or_else(|| RegistryError::not_found("Event", event_id))?;

        let row: Option<RegistrationRow> = sqlx::query_as(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(change.registration_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| storage("Failed to lock registration", &e))?;
        let current = row
            .map(rows::registration)
            .transpose()?
            .ok_or_else(|| RegistryError::not_found("Registration", change.registration_id))?;

        if change.check(current.status)? {
            let seats_taken = Self::seats_taken_in(&mut tx, event_id).await?;
            admission::check_capacity(&AdmissionSnapshot::of(&event, seats_taken, false))?;
        }

        sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
            .bind(current.id.as_uuid())
            .bind(change.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("Failed to update registration", &e))?;

        Self::commit(tx).await?;
        Ok(Registration {
            status: change.status,
            ..current
        })
    }

    async fn upcoming(
        &self,
        filter: EventFilter,
        now: DateTime<Utc>,
    ) -> Result<UpcomingEvents, RegistryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE date >= "
        ));
        query.push_bind(now);

        if let Some(title) = &filter.title {
            query
                .push(" AND title ILIKE ")
                .push_bind(like_pattern(title));
        }
        if let Some(location) = &filter.location {
            query
                .push(" AND location ILIKE ")
                .push_bind(like_pattern(location));
        }
        if let Some(category) = filter.category {
            query
                .push(" AND category_id = ")
                .push_bind(*category.as_uuid());
        }
        if let Some(text) = &filter.search {
            let pattern = like_pattern(text);
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR location ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(start) = filter.start_date {
            query.push(" AND date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND date <= ").push_bind(end);
        }

        let column = match filter.order.field {
            OrderField::Date => "date",
            OrderField::CreatedAt => "created_at",
        };
        let direction = match filter.order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        query.push(format!(" ORDER BY {column} {direction}, id ASC"));

        let rows: Vec<EventRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("Failed to list upcoming events", &e))?;
        let events = rows
            .into_iter()
            .map(rows::event)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UpcomingEvents::new(events))
    }
}

impl Repository for PostgresRepository {
    fn insert_category(&self, category: EventCategory) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
                .bind(category.id.as_uuid())
                .bind(&category.name)
                .bind(&category.description)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    map_db_error(
                        "Failed to insert category",
                        &e,
                        || duplicate_category(&category.name),
                        || storage("Failed to insert category", &e),
                    )
                })?;
            Ok(())
        })
    }

    fn category(&self, id: CategoryId) -> RepoFuture<'_, Option<EventCategory>> {
        Box::pin(async move {
            let row: Option<CategoryRow> =
                sqlx::query_as("SELECT id, name, description FROM categories WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to load category", &e))?;
            Ok(row.map(rows::category))
        })
    }

    fn categories(&self) -> RepoFuture<'_, Vec<EventCategory>> {
        Box::pin(async move {
            let rows: Vec<CategoryRow> =
                sqlx::query_as("SELECT id, name, description FROM categories ORDER BY name")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to list categories", &e))?;
            Ok(rows.into_iter().map(rows::category).collect())
        })
    }

    fn update_category(&self, category: EventCategory) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
                    .bind(category.id.as_uuid())
                    .bind(&category.name)
                    .bind(&category.description)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        map_db_error(
                            "Failed to update category",
                            &e,
                            || duplicate_category(&category.name),
                            || storage("Failed to update category", &e),
                        )
                    })?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Category", category.id));
            }
            Ok(())
        })
    }

    fn delete_category(&self, id: CategoryId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    map_db_error(
                        "Failed to delete category",
                        &e,
                        || storage("Failed to delete category", &e),
                        || RegistryError::conflict("Category is still referenced by events"),
                    )
                })?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Category", id));
            }
            Ok(())
        })
    }

    fn insert_event(&self, event: Event) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO events
                    (id, title, description, date, location, category_id,
                     created_by, capacity, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.category_id.as_uuid())
            .bind(event.created_by.as_uuid())
            .bind(i64::from(event.capacity.value()))
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_db_error(
                    "Failed to insert event",
                    &e,
                    || storage("Failed to insert event", &e),
                    || unknown_category(event.category_id),
                )
            })?;
            Ok(())
        })
    }

    fn event(&self, id: EventId) -> RepoFuture<'_, Option<Event>> {
        Box::pin(async move {
            let row: Option<EventRow> =
                sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to load event", &e))?;
            row.map(rows::event).transpose()
        })
    }

    fn update_event(&self, event: Event) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE events
                 SET title = $2, description = $3, date = $4, location = $5,
                     category_id = $6, capacity = $7
                 WHERE id = $1",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(&event.location)
            .bind(event.category_id.as_uuid())
            .bind(i64::from(event.capacity.value()))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_db_error(
                    "Failed to update event",
                    &e,
                    || storage("Failed to update event", &e),
                    || unknown_category(event.category_id),
                )
            })?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Event", event.id));
            }
            Ok(())
        })
    }

    fn delete_event(&self, id: EventId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| storage("Failed to delete event", &e))?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Event", id));
            }
            Ok(())
        })
    }

    fn upcoming_events(
        &self,
        filter: EventFilter,
        now: DateTime<Utc>,
    ) -> RepoFuture<'_, UpcomingEvents> {
        Box::pin(self.upcoming(filter, now))
    }

    fn seats_taken(&self, event_id: EventId) -> RepoFuture<'_, u32> {
        Box::pin(async move {
            let (taken,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'registered'",
            )
            .bind(event_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage("Failed to count seats", &e))?;
            Ok(rows::count(taken))
        })
    }

    fn insert_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO ticket_pricing (id, event_id, ticket_type, price, currency)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(ticket.id.as_uuid())
            .bind(ticket.event_id.as_uuid())
            .bind(&ticket.ticket_type)
            .bind(ticket.price.amount())
            .bind(ticket.currency.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_db_error(
                    "Failed to insert pricing",
                    &e,
                    || duplicate_ticket_type(&ticket.ticket_type),
                    || RegistryError::not_found("Event", ticket.event_id),
                )
            })?;
            Ok(())
        })
    }

    fn pricing(&self, id: TicketId) -> RepoFuture<'_, Option<TicketPricing>> {
        Box::pin(async move {
            let row: Option<PricingRow> = sqlx::query_as(&format!(
                "SELECT {PRICING_COLUMNS} FROM ticket_pricing WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("Failed to load pricing", &e))?;
            row.map(rows::pricing).transpose()
        })
    }

    fn update_pricing(&self, ticket: TicketPricing) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE ticket_pricing SET ticket_type = $2, price = $3, currency = $4
                 WHERE id = $1",
            )
            .bind(ticket.id.as_uuid())
            .bind(&ticket.ticket_type)
            .bind(ticket.price.amount())
            .bind(ticket.currency.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_db_error(
                    "Failed to update pricing",
                    &e,
                    || duplicate_ticket_type(&ticket.ticket_type),
                    || storage("Failed to update pricing", &e),
                )
            })?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Ticket", ticket.id));
            }
            Ok(())
        })
    }

    fn delete_pricing(&self, id: TicketId) -> RepoFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM ticket_pricing WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| storage("Failed to delete pricing", &e))?;
            if result.rows_affected() == 0 {
                return Err(RegistryError::not_found("Ticket", id));
            }
            Ok(())
        })
    }

    fn pricing_for_event(&self, event_id: EventId) -> RepoFuture<'_, Vec<TicketPricing>> {
        Box::pin(async move {
            let rows: Vec<PricingRow> = sqlx::query_as(&format!(
                "SELECT {PRICING_COLUMNS} FROM ticket_pricing WHERE event_id = $1 ORDER BY seq"
            ))
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("Failed to list pricing", &e))?;
            rows.into_iter().map(rows::pricing).collect()
        })
    }

    fn admit(&self, request: AdmissionRequest) -> RepoFuture<'_, Registration> {
        Box::pin(self.admit_in_transaction(request))
    }

    fn registration(&self, id: RegistrationId) -> RepoFuture<'_, Option<Registration>> {
        Box::pin(async move {
            let row: Option<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("Failed to load registration", &e))?;
            row.map(rows::registration).transpose()
        })
    }

    fn registrations_for_event(
        &self,
        event_id: EventId,
        user: Option<UserId>,
    ) -> RepoFuture<'_, Vec<Registration>> {
        Box::pin(async move {
            let rows: Vec<RegistrationRow> = sqlx::query_as(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations
                 WHERE event_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
                 ORDER BY registered_at, id"
            ))
            .bind(event_id.as_uuid())
            .bind(user.map(|u| *u.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("Failed to list registrations", &e))?;
            rows.into_iter().map(rows::registration).collect()
        })
    }

    fn change_registration_status(&self, change: StatusChange) -> RepoFuture<'_, Registration> {
        Box::pin(self.change_status_in_transaction(change))
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("launch"), "%launch%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
