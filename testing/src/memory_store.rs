//! In-memory inventory store.
//!
//! Mirrors the Postgres store's semantics closely enough that engine and HTTP
//! tests exercise the same behavior:
//!
//! - Row locks are per-record async mutexes acquired with a timeout, so a held
//!   lock produces [`InventoryError::Timeout`]
//! - Reservation validation is [`prepare_reservation`] against the locked ticket
//! - Lifecycle batches skip rows whose lock is held (`SKIP LOCKED`)
//! - Reservation writes and payment claims lock the reservation row
//!
//! Fault injection helpers simulate connectivity failures.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned mutex

use boxoffice_core::{
    Event, EventId, InventoryError, InventoryStore, LifecycleTransition, NewTicket, Page,
    PageRequest, Reservation, ReservationId, ReservationRequest, Resource, Settlement,
    StoreFuture, Ticket, TicketId, TicketType, TicketTypeChanges, TicketTypeId, TicketTypeStatus,
    payment_claim_active, prepare_reservation,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Event(EventId),
    TicketType(TicketTypeId),
    Ticket(TicketId),
    Reservation(ReservationId),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(id) => write!(f, "event {id}"),
            Self::TicketType(id) => write!(f, "ticket type {id}"),
            Self::Ticket(id) => write!(f, "ticket {id}"),
            Self::Reservation(id) => write!(f, "reservation {id}"),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    ticket_types: Vec<TicketType>,
    tickets: Vec<Ticket>,
    reservations: HashMap<ReservationId, Reservation>,
    payment_claims: HashMap<ReservationId, DateTime<Utc>>,
}

impl Tables {
    fn issued_for_type(&self, id: TicketTypeId) -> u32 {
        self.tickets
            .iter()
            .filter(|ticket| ticket.ticket_type_id == Some(id))
            .map(|ticket| ticket.quantity)
            .sum()
    }

    fn issued_for_event(&self, id: EventId) -> u64 {
        self.tickets
            .iter()
            .filter(|ticket| ticket.event_id == id)
            .map(|ticket| u64::from(ticket.quantity))
            .sum()
    }

    fn ticket_type(&self, id: TicketTypeId) -> Result<TicketType, InventoryError> {
        let mut ticket_type = self
            .ticket_types
            .iter()
            .find(|ticket_type| ticket_type.id == id)
            .cloned()
            .ok_or_else(|| InventoryError::not_found(Resource::TicketType, id))?;
        ticket_type.issued_quantity = self.issued_for_type(id);
        Ok(ticket_type)
    }

    fn ticket_type_mut(&mut self, id: TicketTypeId) -> Result<&mut TicketType, InventoryError> {
        self.ticket_types
            .iter_mut()
            .find(|ticket_type| ticket_type.id == id)
            .ok_or_else(|| InventoryError::not_found(Resource::TicketType, id))
    }

    fn event(&self, id: EventId) -> Result<&Event, InventoryError> {
        self.events
            .get(&id)
            .ok_or_else(|| InventoryError::not_found(Resource::Event, id))
    }

    fn ticket_mut(&mut self, id: TicketId) -> Result<&mut Ticket, InventoryError> {
        self.tickets
            .iter_mut()
            .find(|ticket| ticket.id == id)
            .ok_or_else(|| InventoryError::not_found(Resource::Ticket, id))
    }

    fn reservation_mut(&mut self, id: ReservationId) -> Result<&mut Reservation, InventoryError> {
        self.reservations
            .get_mut(&id)
            .ok_or_else(|| InventoryError::not_found(Resource::Reservation, id))
    }
}

#[derive(Debug, Default)]
struct Faults {
    reservations: AtomicU32,
    lost_reservation_acks: AtomicU32,
    lifecycle_batches: AtomicU32,
    offline: AtomicBool,
}

impl Faults {
    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// In-memory [`InventoryStore`] for fast, deterministic tests.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use boxoffice_core::{InventoryError, InventoryStore, ReservationId, ReservationRequest, UserId};
/// use boxoffice_testing::{InMemoryInventoryStore, fixtures};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryInventoryStore::new();
/// let ticket = fixtures::seed_ticket(&store, 2, 1_000).await;
///
/// let result = store
///     .create_reservation(
///         ReservationId::new(),
///         ReservationRequest {
///             user_id: UserId::new(),
///             ticket_id: ticket.id,
///             quantity: 3,
///             payment_method: "credit_card".into(),
///         },
///         fixtures::now(),
///         Duration::from_millis(100),
///     )
///     .await;
///
/// assert_eq!(result, Err(InventoryError::InsufficientStock { requested: 3, remaining: 2 }));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    tables: Arc<Mutex<Tables>>,
    row_locks: Arc<Mutex<HashMap<RowKey, Arc<AsyncMutex<()>>>>>,
    faults: Arc<Faults>,
}

impl InMemoryInventoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn row_lock(&self, key: RowKey) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.row_locks.lock().unwrap().entry(key).or_default())
    }

    async fn lock_row(&self, key: RowKey, timeout: Duration) -> Result<OwnedMutexGuard<()>, InventoryError> {
        tokio::time::timeout(timeout, self.row_lock(key).lock_owned())
            .await
            .map_err(|_| InventoryError::Timeout(key.to_string()))
    }

    fn is_row_locked(&self, key: RowKey) -> bool {
        self.row_locks
            .lock()
            .unwrap()
            .get(&key)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    fn check_online(&self) -> Result<(), InventoryError> {
        if self.faults.offline.load(Ordering::SeqCst) {
            return Err(InventoryError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    /// Hold the row lock on a ticket, simulating a slow transaction.
    ///
    /// Reservations for this ticket time out until the guard is dropped.
    pub async fn hold_ticket_lock(&self, id: TicketId) -> OwnedMutexGuard<()> {
        self.row_lock(RowKey::Ticket(id)).lock_owned().await
    }

    /// Hold the row lock on a ticket type.
    pub async fn hold_ticket_type_lock(&self, id: TicketTypeId) -> OwnedMutexGuard<()> {
        self.row_lock(RowKey::TicketType(id)).lock_owned().await
    }

    /// Hold the row lock on a reservation.
    ///
    /// Settlement, cancellation and payment claims time out until the guard
    /// is dropped.
    pub async fn hold_reservation_lock(&self, id: ReservationId) -> OwnedMutexGuard<()> {
        self.row_lock(RowKey::Reservation(id)).lock_owned().await
    }

    /// Fail the next `count` reservation attempts with [`InventoryError::Unavailable`].
    pub fn fail_next_reservations(&self, count: u32) {
        self.faults.reservations.store(count, Ordering::SeqCst);
    }

    /// Commit the next `count` reservations, then report
    /// [`InventoryError::Unavailable`] as if the acknowledgement was lost.
    pub fn lose_next_reservation_acks(&self, count: u32) {
        self.faults.lost_reservation_acks.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` lifecycle batches with [`InventoryError::Unavailable`].
    pub fn fail_next_lifecycle_batches(&self, count: u32) {
        self.faults.lifecycle_batches.store(count, Ordering::SeqCst);
    }

    /// Make every [`InventoryStore::ping`] fail until set back.
    pub fn set_offline(&self, offline: bool) {
        self.faults.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored reservations
    #[must_use]
    pub fn reservation_count(&self) -> usize {
        self.tables.lock().unwrap().reservations.len()
    }

    /// Every ticket type's status, ordered by ID
    #[must_use]
    pub fn ticket_type_statuses(&self) -> Vec<(TicketTypeId, TicketTypeStatus)> {
        let mut statuses: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .ticket_types
            .iter()
            .map(|ticket_type| (ticket_type.id, ticket_type.status))
            .collect();
        statuses.sort();
        statuses
    }

    /// Overwrite a lot's remaining stock, bypassing the engine.
    pub fn set_available_quantity(&self, id: TicketId, available: u32) {
        if let Ok(ticket) = self.tables.lock().unwrap().ticket_mut(id) {
            ticket.available_quantity = available.min(ticket.quantity);
        }
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn create_event(&self, event: Event) -> StoreFuture<'_, Event> {
        Box::pin(async move {
            self.tables.lock().unwrap().events.insert(event.id, event.clone());
            Ok(event)
        })
    }

    fn find_event(&self, id: EventId) -> StoreFuture<'_, Event> {
        Box::pin(async move { self.tables.lock().unwrap().event(id).cloned() })
    }

    fn create_ticket_type(&self, ticket_type: TicketType) -> StoreFuture<'_, TicketType> {
        Box::pin(async move {
            let mut tables = self.tables.lock().unwrap();
            tables.event(ticket_type.event_id)?;
            tables.ticket_types.push(ticket_type.clone());
            tables.ticket_type(ticket_type.id)
        })
    }

    fn find_ticket_type(&self, id: TicketTypeId) -> StoreFuture<'_, TicketType> {
        Box::pin(async move { self.tables.lock().unwrap().ticket_type(id) })
    }

    fn list_ticket_types(&self, event_id: EventId) -> StoreFuture<'_, Vec<TicketType>> {
        Box::pin(async move {
            let tables = self.tables.lock().unwrap();
            tables.event(event_id)?;
            tables
                .ticket_types
                .iter()
                .filter(|ticket_type| ticket_type.event_id == event_id)
                .map(|ticket_type| tables.ticket_type(ticket_type.id))
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
            self.tables.lock().unwrap().ticket_type(id)?;
            let _row = self.lock_row(RowKey::TicketType(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            let mut updated = tables.ticket_type(id)?;
            changes.apply(&mut updated, now)?;
            let stored = tables.ticket_type_mut(id)?;
            *stored = TicketType {
                issued_quantity: 0,
                ..updated.clone()
            };
            Ok(updated)
        })
    }

    fn delete_ticket_type(&self, id: TicketTypeId, lock_timeout: Duration) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.tables.lock().unwrap().ticket_type(id)?;
            let _row = self.lock_row(RowKey::TicketType(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            tables.ticket_type(id)?;
            let references = tables
                .tickets
                .iter()
                .filter(|ticket| ticket.ticket_type_id == Some(id))
                .count() as u64;
            if references > 0 {
                return Err(InventoryError::InUse {
                    resource: Resource::TicketType,
                    id: id.to_string(),
                    references,
                });
            }
            tables.ticket_types.retain(|ticket_type| ticket_type.id != id);
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
            self.tables.lock().unwrap().ticket_type(id)?;
            let _row = self.lock_row(RowKey::TicketType(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            let stored = tables.ticket_type_mut(id)?;
            stored.status = status;
            stored.updated_at = now;
            tables.ticket_type(id)
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
            {
                let tables = self.tables.lock().unwrap();
                tables.event(ticket.event_id)?;
                if let Some(type_id) = ticket.ticket_type_id {
                    if tables.ticket_type(type_id)?.event_id != ticket.event_id {
                        return Err(InventoryError::validation(
                            "ticket type belongs to a different event",
                        ));
                    }
                }
            }

            let _event_row = self.lock_row(RowKey::Event(ticket.event_id), lock_timeout).await?;
            let _type_row = match ticket.ticket_type_id {
                Some(type_id) => Some(self.lock_row(RowKey::TicketType(type_id), lock_timeout).await?),
                None => None,
            };

            let mut tables = self.tables.lock().unwrap();
            let capacity = tables.event(ticket.event_id)?.capacity;
            let issued = tables.issued_for_event(ticket.event_id);
            let type_remaining = match ticket.ticket_type_id {
                Some(type_id) => Some(tables.ticket_type(type_id)?.remaining_quantity()),
                None => None,
            };
            ticket.check_limits(capacity, issued, type_remaining)?;

            let ticket = ticket.into_ticket(id, now);
            tables.tickets.push(ticket.clone());
            Ok(ticket)
        })
    }

    fn find_ticket(&self, id: TicketId) -> StoreFuture<'_, Ticket> {
        Box::pin(async move { self.tables.lock().unwrap().ticket_mut(id).map(|ticket| ticket.clone()) })
    }

    fn list_available_tickets(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> StoreFuture<'_, Page<Ticket>> {
        Box::pin(async move {
            let tables = self.tables.lock().unwrap();
            tables.event(event_id)?;
            let mut available: Vec<&Ticket> = tables
                .tickets
                .iter()
                .filter(|ticket| ticket.event_id == event_id && ticket.available_quantity > 0)
                .collect();
            available.sort_by_key(|ticket| ticket.created_at);

            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            Ok(Page {
                total: available.len() as u64,
                items: available
                    .into_iter()
                    .skip(offset)
                    .take(page.per_page() as usize)
                    .cloned()
                    .collect(),
                page: page.page(),
                per_page: page.per_page(),
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
            if Faults::take(&self.faults.reservations) {
                return Err(InventoryError::Unavailable("simulated connection failure".to_string()));
            }

            self.tables.lock().unwrap().ticket_mut(request.ticket_id)?;
            let _row = self.lock_row(RowKey::Ticket(request.ticket_id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            if tables.reservations.contains_key(&id) {
                return Err(InventoryError::Conflict(format!("reservation {id} already exists")));
            }
            let ticket = tables.ticket_mut(request.ticket_id)?;
            let draft = prepare_reservation(ticket, &request)?;
            ticket.available_quantity -= draft.quantity;

            let reservation = Reservation::pending(id, request.user_id, ticket.id, draft, now);
            tables.reservations.insert(id, reservation.clone());
            if Faults::take(&self.faults.lost_reservation_acks) {
                return Err(InventoryError::Unavailable("connection lost after commit".to_string()));
            }
            Ok(reservation)
        })
    }

    fn find_reservation(&self, id: ReservationId) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            self.tables
                .lock()
                .unwrap()
                .reservation_mut(id)
                .map(|reservation| reservation.clone())
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
            self.tables.lock().unwrap().reservation_mut(id)?;
            let _row = self.lock_row(RowKey::Reservation(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            let reservation = tables.reservation_mut(id)?.clone();
            reservation.status.ensure_pending()?;
            if let Some(claimed_at) = tables.payment_claims.get(&id) {
                if payment_claim_active(*claimed_at, now, lease) {
                    return Err(InventoryError::Conflict(format!(
                        "payment for reservation {id} is already in progress"
                    )));
                }
            }
            tables.payment_claims.insert(id, now);
            Ok(reservation)
        })
    }

    fn release_payment_claim(&self, id: ReservationId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.tables.lock().unwrap().payment_claims.remove(&id);
            Ok(())
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
            self.tables.lock().unwrap().reservation_mut(id)?;
            let _row = self.lock_row(RowKey::Reservation(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            let reservation = tables.reservation_mut(id)?;
            reservation.settle(settlement, now)?;
            Ok(reservation.clone())
        })
    }

    fn cancel_reservation(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            self.tables.lock().unwrap().reservation_mut(id)?;
            let _row = self.lock_row(RowKey::Reservation(id), lock_timeout).await?;

            let mut tables = self.tables.lock().unwrap();
            let reservation = tables.reservation_mut(id)?;
            reservation.cancel(now)?;
            Ok(reservation.clone())
        })
    }

    fn run_lifecycle_batch(
        &self,
        transition: LifecycleTransition,
        now: DateTime<Utc>,
        batch_size: u32,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            if Faults::take(&self.faults.lifecycle_batches) {
                return Err(InventoryError::Unavailable("simulated batch timeout".to_string()));
            }

            let mut tables = self.tables.lock().unwrap();
            let eligible: Vec<TicketTypeId> = tables
                .ticket_types
                .iter()
                .filter_map(|ticket_type| tables.ticket_type(ticket_type.id).ok())
                .filter(|ticket_type| transition.matches(ticket_type, now))
                .filter(|ticket_type| !self.is_row_locked(RowKey::TicketType(ticket_type.id)))
                .map(|ticket_type| ticket_type.id)
                .take(batch_size as usize)
                .collect();

            for id in &eligible {
                let stored = tables.ticket_type_mut(*id)?;
                stored.status = transition.to_status();
                stored.updated_at = now;
            }
            Ok(eligible.len() as u64)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.check_online() })
    }
}
