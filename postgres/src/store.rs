//! [`InventoryStore`] backed by `PostgreSQL`.

use crate::error::map_sqlx_error;
use crate::lifecycle::batch_update_sql;
use crate::rows::{
    self, EVENT_COLUMNS, RESERVATION_COLUMNS, TICKET_COLUMNS, TICKET_TYPE_COLUMNS, db_money,
    db_quantity,
};
use boxoffice_core::{
    Event, EventId, InventoryError, InventoryStore, LifecycleTransition, NewTicket, Page,
    PageRequest, Reservation, ReservationId, ReservationRequest, Resource, Settlement, StoreFuture,
    Ticket, TicketId, TicketType, TicketTypeChanges, TicketTypeId, TicketTypeStatus,
    payment_claim_active, prepare_reservation,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

/// Pool settings for [`PostgresInventoryStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// How long to wait for a connection before failing
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// `PostgreSQL` inventory store.
///
/// Every stock or status write runs as
/// `BEGIN; SET LOCAL lock_timeout; SELECT … FOR UPDATE; validate; write; COMMIT`.
/// An error at any step drops the transaction, which rolls it back.
///
/// # Example
///
/// ```no_run
/// use boxoffice_postgres::PostgresInventoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresInventoryStore::connect("postgres://localhost/boxoffice", Default::default()).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Unavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str, config: PoolConfig) -> Result<Self, InventoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error(e, "connection pool"))?;
        Ok(Self::from_pool(pool))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), InventoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Migration failed");
                InventoryError::Database("migration failed".to_string())
            })
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self, lock_timeout: Option<Duration>) -> Result<Transaction<'static, Postgres>, InventoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "transaction"))?;
        if let Some(timeout) = lock_timeout {
            // SET does not accept bind parameters.
            let millis = timeout.as_millis().max(1);
            sqlx::query(&format!("SET LOCAL lock_timeout = '{millis}ms'"))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, "transaction"))?;
        }
        Ok(tx)
    }

    async fn commit(tx: Transaction<'static, Postgres>, target: &str) -> Result<(), InventoryError> {
        tx.commit().await.map_err(|e| map_sqlx_error(e, target))
    }
}

async fn load_event(conn: &mut PgConnection, id: EventId, lock: bool) -> Result<Event, InventoryError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query(&sql)
        .bind(*id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error(e, format!("event {id}")))?
        .ok_or_else(|| InventoryError::not_found(Resource::Event, id))?;
    rows::event(&row)
}

async fn lock_ticket_type(conn: &mut PgConnection, id: TicketTypeId) -> Result<(), InventoryError> {
    sqlx::query("SELECT id FROM ticket_types WHERE id = $1 FOR UPDATE")
        .bind(*id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?
        .map(|_| ())
        .ok_or_else(|| InventoryError::not_found(Resource::TicketType, id))
}

async fn load_ticket_type(conn: &mut PgConnection, id: TicketTypeId) -> Result<TicketType, InventoryError> {
    let sql = format!("SELECT {TICKET_TYPE_COLUMNS} FROM ticket_types tt WHERE tt.id = $1");
    let row = sqlx::query(&sql)
        .bind(*id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?
        .ok_or_else(|| InventoryError::not_found(Resource::TicketType, id))?;
    rows::ticket_type(&row)
}

async fn load_reservation(
    conn: &mut PgConnection,
    id: ReservationId,
    lock: bool,
) -> Result<Reservation, InventoryError> {
    let sql = format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query(&sql)
        .bind(*id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(|e| map_sqlx_error(e, format!("reservation {id}")))?
        .ok_or_else(|| InventoryError::not_found(Resource::Reservation, id))?;
    rows::reservation(&row)
}

async fn write_reservation_outcome(
    conn: &mut PgConnection,
    reservation: &Reservation,
) -> Result<(), InventoryError> {
    let result = sqlx::query(
        "UPDATE reservations \
         SET status = $2, transaction_id = $3, paid_at = $4, updated_at = $5 \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(*reservation.id.as_uuid())
    .bind(reservation.status.as_str())
    .bind(reservation.transaction_id.as_deref())
    .bind(reservation.paid_at)
    .bind(reservation.updated_at)
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error(e, format!("reservation {}", reservation.id)))?;

    if result.rows_affected() == 0 {
        return Err(InventoryError::Conflict(format!(
            "reservation {} is no longer pending",
            reservation.id
        )));
    }
    Ok(())
}

impl InventoryStore for PostgresInventoryStore {
    fn create_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO events (id, organizer_id, name, capacity, start_at, end_at, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(*event.id.as_uuid())
            .bind(*event.organizer_id.as_uuid())
            .bind(&event.name)
            .bind(db_quantity(event.capacity)?)
            .bind(event.start_at)
            .bind(event.end_at)
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("event {}", event.id)))?;

            tracing::debug!(event_id = %event.id, "Event created");
            Ok(event)
        })
    }

    fn find_event(&self, id: EventId) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| map_sqlx_error(e, "connection"))?;
            load_event(&mut conn, id, false).await
        })
    }

    fn create_ticket_type(&self, ticket_type: TicketType) -> StoreFuture<'_, TicketType> {
        Box::pin(async move {
            let mut tx = self.begin(None).await?;
            load_event(&mut tx, ticket_type.event_id, false).await?;

            sqlx::query(
                "INSERT INTO ticket_types \
                 (id, event_id, name, price_cents, quantity, sales_start_at, sales_end_at, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(*ticket_type.id.as_uuid())
            .bind(*ticket_type.event_id.as_uuid())
            .bind(&ticket_type.name)
            .bind(db_money(ticket_type.price_cents)?)
            .bind(db_quantity(ticket_type.quantity)?)
            .bind(ticket_type.sales_window.starts_at())
            .bind(ticket_type.sales_window.ends_at())
            .bind(ticket_type.status.as_str())
            .bind(ticket_type.created_at)
            .bind(ticket_type.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, format!("ticket type {}", ticket_type.id)))?;

            let created = load_ticket_type(&mut tx, ticket_type.id).await?;
            Self::commit(tx, "ticket type").await?;
            Ok(created)
        })
    }

    fn find_ticket_type(&self, id: TicketTypeId) -> StoreFuture<'_, TicketType> {
        Box::pin(async move {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| map_sqlx_error(e, "connection"))?;
            load_ticket_type(&mut conn, id).await
        })
    }

    fn list_ticket_types(&self, event_id: EventId) -> StoreFuture<'_, Vec<TicketType>> {
        Box::pin(async move {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| map_sqlx_error(e, "connection"))?;
            load_event(&mut conn, event_id, false).await?;

            let sql = format!(
                "SELECT {TICKET_TYPE_COLUMNS} FROM ticket_types tt \
                 WHERE tt.event_id = $1 ORDER BY tt.created_at, tt.id"
            );
            sqlx::query(&sql)
                .bind(*event_id.as_uuid())
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| map_sqlx_error(e, format!("ticket types of event {event_id}")))?
                .iter()
                .map(rows::ticket_type)
                .collect()
        })
    }

    fn update_ticket_type(
        &self,
        id: TicketTypeId,
        changes: TicketTypeChanges,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, TicketType> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            lock_ticket_type(&mut tx, id).await?;
            let mut ticket_type = load_ticket_type(&mut tx, id).await?;
            changes.apply(&mut ticket_type, now)?;

            sqlx::query(
                "UPDATE ticket_types \
                 SET name = $2, price_cents = $3, quantity = $4, sales_start_at = $5, \
                     sales_end_at = $6, updated_at = $7 \
                 WHERE id = $1",
            )
            .bind(*id.as_uuid())
            .bind(&ticket_type.name)
            .bind(db_money(ticket_type.price_cents)?)
            .bind(db_quantity(ticket_type.quantity)?)
            .bind(ticket_type.sales_window.starts_at())
            .bind(ticket_type.sales_window.ends_at())
            .bind(ticket_type.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?;

            Self::commit(tx, "ticket type").await?;
            tracing::debug!(ticket_type_id = %id, "Ticket type updated");
            Ok(ticket_type)
        })
    }

    fn delete_ticket_type(&self, id: TicketTypeId, lock_timeout: Duration) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            lock_ticket_type(&mut tx, id).await?;

            let references: i64 =
                sqlx::query("SELECT COUNT(*) AS reference_count FROM tickets WHERE ticket_type_id = $1")
                    .bind(*id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await
                    .and_then(|row| row.try_get("reference_count"))
                    .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?;
            if references > 0 {
                return Err(InventoryError::InUse {
                    resource: Resource::TicketType,
                    id: id.to_string(),
                    references: references.unsigned_abs(),
                });
            }

            sqlx::query("DELETE FROM ticket_types WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?;
            Self::commit(tx, "ticket type").await?;
            tracing::debug!(ticket_type_id = %id, "Ticket type deleted");
            Ok(())
        })
    }

    fn override_ticket_type_status(
        &self,
        id: TicketTypeId,
        status: TicketTypeStatus,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, TicketType> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            lock_ticket_type(&mut tx, id).await?;

            sqlx::query("UPDATE ticket_types SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(*id.as_uuid())
                .bind(status.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, format!("ticket type {id}")))?;

            let updated = load_ticket_type(&mut tx, id).await?;
            Self::commit(tx, "ticket type").await?;
            Ok(updated)
        })
    }

    fn issue_ticket(
        &self,
        id: TicketId,
        ticket: NewTicket,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Ticket> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            let event = load_event(&mut tx, ticket.event_id, true).await?;

            let type_remaining = match ticket.ticket_type_id {
                Some(type_id) => {
                    lock_ticket_type(&mut tx, type_id).await?;
                    let ticket_type = load_ticket_type(&mut tx, type_id).await?;
                    if ticket_type.event_id != ticket.event_id {
                        return Err(InventoryError::validation(
                            "ticket type belongs to a different event",
                        ));
                    }
                    Some(ticket_type.remaining_quantity())
                },
                None => None,
            };

            let issued: i64 = sqlx::query(
                "SELECT COALESCE(SUM(quantity), 0)::BIGINT AS issued FROM tickets WHERE event_id = $1",
            )
            .bind(*ticket.event_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("issued"))
            .map_err(|e| map_sqlx_error(e, format!("event {}", ticket.event_id)))?;
            ticket.check_limits(event.capacity, issued.unsigned_abs(), type_remaining)?;

            let ticket = ticket.into_ticket(id, now);
            sqlx::query(
                "INSERT INTO tickets \
                 (id, event_id, ticket_type_id, title, price_cents, quantity, available_quantity, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(*ticket.id.as_uuid())
            .bind(*ticket.event_id.as_uuid())
            .bind(ticket.ticket_type_id.map(|type_id| *type_id.as_uuid()))
            .bind(&ticket.title)
            .bind(db_money(ticket.price)?)
            .bind(db_quantity(ticket.quantity)?)
            .bind(db_quantity(ticket.available_quantity)?)
            .bind(ticket.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, format!("ticket {id}")))?;

            Self::commit(tx, "ticket").await?;
            tracing::debug!(ticket_id = %id, event_id = %ticket.event_id, quantity = ticket.quantity, "Ticket lot issued");
            Ok(ticket)
        })
    }

    fn find_ticket(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
        Box::pin(async move {
            let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, format!("ticket {id}")))?
                .ok_or_else(|| InventoryError::not_found(Resource::Ticket, id))?;
            rows::ticket(&row)
        })
    }

    fn list_available_tickets(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> StoreFuture<'_, Page<Ticket>> {
        Box::pin(async move {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| map_sqlx_error(e, "connection"))?;
            load_event(&mut conn, event_id, false).await?;
            let target = format!("tickets of event {event_id}");

            let total: i64 = sqlx::query(
                "SELECT COUNT(*) AS total FROM tickets WHERE event_id = $1 AND available_quantity > 0",
            )
            .bind(*event_id.as_uuid())
            .fetch_one(&mut *conn)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error(e, &target))?;

            let sql = format!(
                "SELECT {TICKET_COLUMNS} FROM tickets \
                 WHERE event_id = $1 AND available_quantity > 0 \
                 ORDER BY created_at, id LIMIT $2 OFFSET $3"
            );
            let items = sqlx::query(&sql)
                .bind(*event_id.as_uuid())
                .bind(i64::from(page.per_page()))
                .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| map_sqlx_error(e, &target))?
                .iter()
                .map(rows::ticket)
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page {
                items,
                page: page.page(),
                per_page: page.per_page(),
                total: total.unsigned_abs(),
            })
        })
    }

    fn create_reservation(
        &self,
        id: ReservationId,
        request: ReservationRequest,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let target = format!("ticket {}", request.ticket_id);
            let mut tx = self.begin(Some(lock_timeout)).await?;

            let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1 FOR UPDATE");
            let row = sqlx::query(&sql)
                .bind(*request.ticket_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, &target))?
                .ok_or_else(|| InventoryError::not_found(Resource::Ticket, request.ticket_id))?;
            let ticket = rows::ticket(&row)?;

            let draft = prepare_reservation(&ticket, &request)?;

            sqlx::query(
                "UPDATE tickets SET available_quantity = available_quantity - $2 WHERE id = $1",
            )
            .bind(*ticket.id.as_uuid())
            .bind(db_quantity(draft.quantity)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, &target))?;

            let reservation = Reservation::pending(id, request.user_id, ticket.id, draft, now);
            sqlx::query(
                "INSERT INTO reservations \
                 (id, user_id, ticket_id, quantity, total_price, status, payment_method, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(*reservation.id.as_uuid())
            .bind(*reservation.user_id.as_uuid())
            .bind(*reservation.ticket_id.as_uuid())
            .bind(db_quantity(reservation.quantity)?)
            .bind(db_money(reservation.total_price)?)
            .bind(reservation.status.as_str())
            .bind(reservation.payment_method.as_str())
            .bind(reservation.created_at)
            .bind(reservation.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, format!("reservation {id}")))?;

            Self::commit(tx, &target).await?;
            Ok(reservation)
        })
    }

    fn find_reservation(&self, id: ReservationId) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| map_sqlx_error(e, "connection"))?;
            load_reservation(&mut conn, id, false).await
        })
    }

    fn claim_payment(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lease: Duration,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            let reservation = load_reservation(&mut tx, id, true).await?;
            reservation.status.ensure_pending()?;

            let claimed_at: Option<DateTime<Utc>> =
                sqlx::query("SELECT payment_claimed_at FROM reservations WHERE id = $1")
                    .bind(*id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await
                    .and_then(|row| row.try_get("payment_claimed_at"))
                    .map_err(|e| map_sqlx_error(e, format!("reservation {id}")))?;
            if claimed_at.is_some_and(|claimed_at| payment_claim_active(claimed_at, now, lease)) {
                return Err(InventoryError::Conflict(format!(
                    "payment for reservation {id} is already in progress"
                )));
            }

            sqlx::query("UPDATE reservations SET payment_claimed_at = $2 WHERE id = $1")
                .bind(*id.as_uuid())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, format!("reservation {id}")))?;
            Self::commit(tx, "reservation").await?;
            Ok(reservation)
        })
    }

    fn release_payment_claim(&self, id: ReservationId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "UPDATE reservations SET payment_claimed_at = NULL \
                 WHERE id = $1 AND status = 'pending'",
            )
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error(e, format!("reservation {id}")))
        })
    }

    fn settle_reservation(
        &self,
        id: ReservationId,
        settlement: Settlement,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            let mut reservation = load_reservation(&mut tx, id, true).await?;
            reservation.settle(settlement, now)?;
            write_reservation_outcome(&mut tx, &reservation).await?;
            Self::commit(tx, "reservation").await?;
            Ok(reservation)
        })
    }

    fn cancel_reservation(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            let mut tx = self.begin(Some(lock_timeout)).await?;
            let mut reservation = load_reservation(&mut tx, id, true).await?;
            reservation.cancel(now)?;
            write_reservation_outcome(&mut tx, &reservation).await?;
            Self::commit(tx, "reservation").await?;
            Ok(reservation)
        })
    }

    fn run_lifecycle_batch(
        &self,
        transition: LifecycleTransition,
        now: DateTime<Utc>,
        batch_size: u32,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query(&batch_update_sql(transition))
                .bind(now)
                .bind(i64::from(batch_size))
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, format!("{transition} batch")))?;
            Ok(result.rows_affected())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(|e| map_sqlx_error(e, "health check"))
        })
    }
}
