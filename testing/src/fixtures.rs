//! Seed data builders.
//!
//! Every builder goes through the public [`InventoryStore`] API, so the same
//! fixtures seed the in-memory store and the Postgres store alike.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only when seeding itself fails

use boxoffice_core::{
    Event, EventId, InventoryStore, Money, NewEvent, NewTicket, NewTicketType, SalesWindow, Ticket,
    TicketId, TicketType, TicketTypeId, TicketTypeStatus, UserId,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;

const SEED_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// The instant every fixture and fixed clock agrees on: 2025-01-01T00:00:00Z.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// Create an event a month after [`now`], owned by `organizer`.
pub async fn seed_event(store: &dyn InventoryStore, organizer: UserId, capacity: u32) -> Event {
    let start_at = now() + ChronoDuration::days(30);
    let event = NewEvent {
        organizer_id: organizer,
        name: "Fixture Concert".to_string(),
        capacity,
        start_at,
        end_at: start_at + ChronoDuration::hours(4),
    };
    event.validate().unwrap();
    store
        .create_event(event.into_event(EventId::new(), now()))
        .await
        .unwrap()
}

/// Create a ticket type directly in `status`, bypassing the scheduler.
pub async fn seed_ticket_type(
    store: &dyn InventoryStore,
    event_id: EventId,
    status: TicketTypeStatus,
    quantity: u32,
    sales_start_at: DateTime<Utc>,
    sales_end_at: DateTime<Utc>,
) -> TicketType {
    let mut ticket_type = NewTicketType {
        event_id,
        name: format!("Fixture {status}"),
        price_cents: Money::from_minor_units(5_000),
        quantity,
        sales_window: SalesWindow::new(sales_start_at, sales_end_at).unwrap(),
    }
    .into_ticket_type(TicketTypeId::new(), now());
    ticket_type.status = status;
    store.create_ticket_type(ticket_type).await.unwrap()
}

/// Issue a lot of `quantity` tickets priced at 50.00.
pub async fn seed_lot(
    store: &dyn InventoryStore,
    event_id: EventId,
    ticket_type_id: Option<TicketTypeId>,
    quantity: u32,
) -> Ticket {
    store
        .issue_ticket(
            TicketId::new(),
            NewTicket {
                event_id,
                ticket_type_id,
                title: "Fixture Lot".to_string(),
                price: Money::from_minor_units(5_000),
                quantity,
            },
            now(),
            SEED_LOCK_TIMEOUT,
        )
        .await
        .unwrap()
}

/// Create a roomy event holding a single legacy lot of `quantity` tickets at
/// `price` minor units each.
pub async fn seed_ticket(store: &dyn InventoryStore, quantity: u32, price: u64) -> Ticket {
    let event = seed_event(store, UserId::new(), quantity.saturating_mul(10).max(100)).await;
    store
        .issue_ticket(
            TicketId::new(),
            NewTicket {
                event_id: event.id,
                ticket_type_id: None,
                title: "General Admission".to_string(),
                price: Money::from_minor_units(price),
                quantity,
            },
            now(),
            SEED_LOCK_TIMEOUT,
        )
        .await
        .unwrap()
}
