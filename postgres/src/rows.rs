//! Row decoding and column conversions.
//!
//! Quantities are `INTEGER` and money is `BIGINT` in the schema; the domain
//! uses unsigned types, so every conversion is checked.

use crate::error::{corrupt_row, map_sqlx_error};
use boxoffice_core::{
    Event, EventId, InventoryError, Money, PaymentMethod, Reservation, ReservationId,
    ReservationStatus, SalesWindow, Ticket, TicketId, TicketType, TicketTypeId, TicketTypeStatus,
    UserId,
};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

pub(crate) const EVENT_COLUMNS: &str =
    "id, organizer_id, name, capacity, start_at, end_at, created_at";

/// Ticket type columns plus the issued aggregate, for `FROM ticket_types tt`.
pub(crate) const TICKET_TYPE_COLUMNS: &str = "tt.id, tt.event_id, tt.name, tt.price_cents, \
     tt.quantity, tt.sales_start_at, tt.sales_end_at, tt.status, tt.created_at, tt.updated_at, \
     COALESCE((SELECT SUM(t.quantity) FROM tickets t WHERE t.ticket_type_id = tt.id), 0)::BIGINT \
     AS issued_quantity";

pub(crate) const TICKET_COLUMNS: &str =
    "id, event_id, ticket_type_id, title, price_cents, quantity, available_quantity, created_at";

pub(crate) const RESERVATION_COLUMNS: &str = "id, user_id, ticket_id, quantity, total_price, \
     status, payment_method, transaction_id, paid_at, created_at, updated_at";

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, InventoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| map_sqlx_error(e, column))
}

fn quantity(row: &PgRow, column: &str) -> Result<u32, InventoryError> {
    let value: i32 = get(row, column)?;
    u32::try_from(value).map_err(|e| corrupt_row(column, e))
}

fn money(row: &PgRow, column: &str) -> Result<Money, InventoryError> {
    let value: i64 = get(row, column)?;
    Money::from_signed(value).ok_or_else(|| corrupt_row(column, value))
}

/// Convert a domain quantity for binding.
pub(crate) fn db_quantity(value: u32) -> Result<i32, InventoryError> {
    i32::try_from(value)
        .map_err(|_| InventoryError::validation(format!("Quantity {value} is too large")))
}

/// Convert a domain amount for binding.
pub(crate) fn db_money(value: Money) -> Result<i64, InventoryError> {
    value
        .to_signed()
        .ok_or_else(|| InventoryError::validation(format!("Amount {value} is too large")))
}

pub(crate) fn event(row: &PgRow) -> Result<Event, InventoryError> {
    Ok(Event {
        id: EventId::from_uuid(get::<Uuid>(row, "id")?),
        organizer_id: UserId::from_uuid(get::<Uuid>(row, "organizer_id")?),
        name: get(row, "name")?,
        capacity: quantity(row, "capacity")?,
        start_at: get(row, "start_at")?,
        end_at: get(row, "end_at")?,
        created_at: get(row, "created_at")?,
    })
}

pub(crate) fn ticket_type(row: &PgRow) -> Result<TicketType, InventoryError> {
    let status: String = get(row, "status")?;
    let issued: i64 = get(row, "issued_quantity")?;
    let sales_start_at: DateTime<Utc> = get(row, "sales_start_at")?;
    let sales_end_at: DateTime<Utc> = get(row, "sales_end_at")?;

    Ok(TicketType {
        id: TicketTypeId::from_uuid(get::<Uuid>(row, "id")?),
        event_id: EventId::from_uuid(get::<Uuid>(row, "event_id")?),
        name: get(row, "name")?,
        price_cents: money(row, "price_cents")?,
        quantity: quantity(row, "quantity")?,
        issued_quantity: u32::try_from(issued).map_err(|e| corrupt_row("issued_quantity", e))?,
        sales_window: SalesWindow::new(sales_start_at, sales_end_at)
            .map_err(|e| corrupt_row("sales window", e))?,
        status: TicketTypeStatus::parse(&status).map_err(|e| corrupt_row("status", e))?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

pub(crate) fn ticket(row: &PgRow) -> Result<Ticket, InventoryError> {
    Ok(Ticket {
        id: TicketId::from_uuid(get::<Uuid>(row, "id")?),
        event_id: EventId::from_uuid(get::<Uuid>(row, "event_id")?),
        ticket_type_id: get::<Option<Uuid>>(row, "ticket_type_id")?.map(TicketTypeId::from_uuid),
        title: get(row, "title")?,
        price: money(row, "price_cents")?,
        quantity: quantity(row, "quantity")?,
        available_quantity: quantity(row, "available_quantity")?,
        created_at: get(row, "created_at")?,
    })
}

pub(crate) fn reservation(row: &PgRow) -> Result<Reservation, InventoryError> {
    let status: String = get(row, "status")?;
    let method: String = get(row, "payment_method")?;

    Ok(Reservation {
        id: ReservationId::from_uuid(get::<Uuid>(row, "id")?),
        user_id: UserId::from_uuid(get::<Uuid>(row, "user_id")?),
        ticket_id: TicketId::from_uuid(get::<Uuid>(row, "ticket_id")?),
        quantity: quantity(row, "quantity")?,
        total_price: money(row, "total_price")?,
        status: ReservationStatus::parse(&status).map_err(|e| corrupt_row("status", e))?,
        payment_method: PaymentMethod::parse(&method).map_err(|e| corrupt_row("payment_method", e))?,
        transaction_id: get(row, "transaction_id")?,
        paid_at: get(row, "paid_at")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}
