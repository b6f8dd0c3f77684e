//! Inventory store trait and related types.
//!
//! The store is the imperative shell around the pure rules in this crate. Every
//! state change it performs runs inside one database transaction, validated by
//! the same functions the in-memory implementation uses:
//!
//! - [`crate::prepare_reservation`] against a row-locked ticket
//! - [`crate::ReservationStatus::settle`] / [`crate::ReservationStatus::cancel`]
//!   behind a `status = 'pending'` guard
//! - [`crate::TicketTypeStatus::evaluate`], expressed as bulk conditional updates
//!
//! # Implementations
//!
//! - `PostgresInventoryStore` (in `boxoffice-postgres`): production implementation
//! - `InMemoryInventoryStore` (in `boxoffice-testing`): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! Methods return [`StoreFuture`] instead of using `async fn` so the store can be
//! shared as `Arc<dyn InventoryStore>` between the HTTP layer and the scheduler.

use crate::error::InventoryError;
use crate::event::Event;
use crate::ids::{EventId, ReservationId, TicketId, TicketTypeId};
use crate::reservation::{Reservation, ReservationRequest, Settlement};
use crate::ticket::{NewTicket, Ticket};
use crate::ticket_type::{TicketType, TicketTypeChanges, TicketTypeStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`InventoryStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, InventoryError>> + Send + 'a>>;

/// Largest page a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if `page` is 0 or `per_page` is
    /// outside `1..=100`.
    pub fn new(page: u32, per_page: u32) -> Result<Self, InventoryError> {
        if page == 0 {
            return Err(InventoryError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(InventoryError::validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(Self { page, per_page })
    }

    /// 1-based page number
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Total matching rows
    pub total: u64,
}

/// A bulk status transition applied by the lifecycle scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleTransition {
    /// `draft → on_sale` when `now ≥ sales_start_at`
    Open,
    /// `on_sale → closed` when `now > sales_end_at`
    Close,
    /// `on_sale → soldout` when `remaining_quantity ≤ 0` and the window is still open
    SellOut,
}

impl LifecycleTransition {
    /// Transitions in the order a scheduler run applies them.
    ///
    /// `Close` runs before `SellOut` so an expired type is reported as closed.
    pub const ORDERED: [Self; 3] = [Self::Open, Self::Close, Self::SellOut];

    /// Status a row must have to be eligible.
    #[must_use]
    pub const fn from_status(&self) -> TicketTypeStatus {
        match self {
            Self::Open => TicketTypeStatus::Draft,
            Self::Close | Self::SellOut => TicketTypeStatus::OnSale,
        }
    }

    /// Status written to eligible rows.
    #[must_use]
    pub const fn to_status(&self) -> TicketTypeStatus {
        match self {
            Self::Open => TicketTypeStatus::OnSale,
            Self::Close => TicketTypeStatus::Closed,
            Self::SellOut => TicketTypeStatus::SoldOut,
        }
    }

    /// Metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::SellOut => "sell_out",
        }
    }

    /// Whether this transition applies to `ticket_type` at `now`.
    ///
    /// Applying [`Self::ORDERED`] in sequence reaches the same status as
    /// [`TicketTypeStatus::evaluate`].
    #[must_use]
    pub fn matches(&self, ticket_type: &TicketType, now: DateTime<Utc>) -> bool {
        if ticket_type.status != self.from_status() {
            return false;
        }
        let window = &ticket_type.sales_window;
        match self {
            Self::Open => now >= window.starts_at(),
            Self::Close => now > window.ends_at(),
            Self::SellOut => ticket_type.remaining_quantity() <= 0 && now <= window.ends_at(),
        }
    }
}

impl std::fmt::Display for LifecycleTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    /// `draft → on_sale` transitions
    pub opened: u64,
    /// `on_sale → closed` transitions
    pub closed: u64,
    /// `on_sale → soldout` transitions
    pub sold_out: u64,
    /// Batches that failed and were left for the next run
    pub failed_batches: u64,
}

impl LifecycleReport {
    /// Add `count` rows moved by `transition`.
    pub fn record(&mut self, transition: LifecycleTransition, count: u64) {
        match transition {
            LifecycleTransition::Open => self.opened += count,
            LifecycleTransition::Close => self.closed += count,
            LifecycleTransition::SellOut => self.sold_out += count,
        }
    }

    /// Total rows transitioned.
    #[must_use]
    pub const fn transitioned(&self) -> u64 {
        self.opened + self.closed + self.sold_out
    }
}

/// Persistence for events, ticket types, ticket lots and reservations.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one instance serves every request
/// handler and the scheduler concurrently.
pub trait InventoryStore: Send + Sync {
    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// Storage failures only; the event is validated by the caller.
    fn create_event(&self, event: Event) -> StoreFuture<'_, Event>;

    /// Load an event.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the event does not exist.
    fn find_event(&self, id: EventId) -> StoreFuture<'_, Event>;

    /// Insert a new ticket type.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the owning event does not exist.
    fn create_ticket_type(&self, ticket_type: TicketType) -> StoreFuture<'_, TicketType>;

    /// Load a ticket type with its issued quantity.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the ticket type does not exist.
    fn find_ticket_type(&self, id: TicketTypeId) -> StoreFuture<'_, TicketType>;

    /// List an event's ticket types, oldest first.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the event does not exist.
    fn list_ticket_types(&self, event_id: EventId) -> StoreFuture<'_, Vec<TicketType>>;

    /// Apply `changes` to a ticket type under its row lock.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::Validation`] from
    /// [`TicketTypeChanges::apply`], or [`InventoryError::Timeout`].
    fn update_ticket_type(
        &self,
        id: TicketTypeId,
        changes: TicketTypeChanges,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, TicketType>;

    /// Delete a ticket type that no ticket references, under the ticket
    /// type's row lock.
    ///
    /// # Errors
    ///
    /// [`InventoryError::InUse`] while any ticket references it,
    /// [`InventoryError::NotFound`] or [`InventoryError::Timeout`].
    fn delete_ticket_type(&self, id: TicketTypeId, lock_timeout: Duration) -> StoreFuture<'_, ()>;

    /// Set a ticket type's status manually, under the same row lock as
    /// other ticket type writes.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] or [`InventoryError::Timeout`].
    fn override_ticket_type_status(
        &self,
        id: TicketTypeId,
        status: TicketTypeStatus,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, TicketType>;

    /// Issue a new lot after checking event capacity and type allotment
    /// under lock.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] for a missing event or ticket type,
    /// [`InventoryError::Validation`] if a limit would be exceeded or the type
    /// belongs to another event, or [`InventoryError::Timeout`].
    fn issue_ticket(
        &self,
        id: TicketId,
        ticket: NewTicket,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Ticket>;

    /// Load a ticket lot.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the lot does not exist.
    fn find_ticket(&self, id: TicketId) -> StoreFuture<'_, Ticket>;

    /// Page through an event's lots that still have stock, oldest first.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the event does not exist.
    fn list_available_tickets(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> StoreFuture<'_, Page<Ticket>>;

    /// Reserve stock and record a pending reservation in one transaction.
    ///
    /// Locks the ticket row (waiting at most `lock_timeout`), validates with
    /// [`crate::prepare_reservation`], decrements `available_quantity` and
    /// inserts the reservation. Any failure leaves stock untouched.
    ///
    /// # Errors
    ///
    /// The [`crate::prepare_reservation`] errors, [`InventoryError::NotFound`],
    /// [`InventoryError::Timeout`], [`InventoryError::Conflict`],
    /// [`InventoryError::Unavailable`] or [`InventoryError::Database`].
    fn create_reservation(
        &self,
        id: ReservationId,
        request: ReservationRequest,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation>;

    /// Load a reservation.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if the reservation does not exist.
    fn find_reservation(&self, id: ReservationId) -> StoreFuture<'_, Reservation>;

    /// Take the exclusive right to capture payment for a pending reservation.
    ///
    /// Another claim younger than `lease` blocks this one. An older claim is
    /// taken over. Capture must only start after a successful claim.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::Conflict`] if the
    /// reservation is no longer pending or a live claim exists, or
    /// [`InventoryError::Timeout`].
    fn claim_payment(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lease: Duration,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation>;

    /// Drop a payment claim so that a later attempt may capture.
    ///
    /// A no-op once the reservation has left `pending`.
    ///
    /// # Errors
    ///
    /// Storage failures.
    fn release_payment_claim(&self, id: ReservationId) -> StoreFuture<'_, ()>;

    /// Apply a payment outcome to a pending reservation.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::Conflict`] if the
    /// reservation is no longer pending, or [`InventoryError::Timeout`].
    fn settle_reservation(
        &self,
        id: ReservationId,
        settlement: Settlement,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation>;

    /// Cancel a pending reservation. Stock is not restored.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`], [`InventoryError::Conflict`] if the
    /// reservation is no longer pending, or [`InventoryError::Timeout`].
    fn cancel_reservation(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lock_timeout: Duration,
    ) -> StoreFuture<'_, Reservation>;

    /// Apply `transition` to at most `batch_size` eligible ticket types.
    ///
    /// Returns the number of rows moved. The eligibility predicate is
    /// re-checked at write time, so overlapping calls are safe.
    ///
    /// # Errors
    ///
    /// Storage failures. Callers treat them as best-effort.
    fn run_lifecycle_batch(
        &self,
        transition: LifecycleTransition,
        now: DateTime<Utc>,
        batch_size: u32,
    ) -> StoreFuture<'_, u64>;

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Unavailable`] if it is not.
    fn ping(&self) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::ids::EventId;
    use crate::money::Money;
    use crate::ticket_type::{NewTicketType, SalesWindow};
    use chrono::Duration as ChronoDuration;

    #[test]
    fn page_request_bounds() {
        assert!(PageRequest::new(0, 20).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 101).is_err());
        let page = PageRequest::new(3, 25).unwrap();
        assert_eq!(page.offset(), 50);
        assert_eq!(PageRequest::default().per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn transitions_agree_with_pure_rules() {
        let now = Utc::now();
        let mut ticket_type = NewTicketType {
            event_id: EventId::new(),
            name: "General".to_string(),
            price_cents: Money::from_minor_units(1_000),
            quantity: 10,
            sales_window: SalesWindow::new(
                now - ChronoDuration::days(30),
                now - ChronoDuration::hours(1),
            )
            .unwrap(),
        }
        .into_ticket_type(TicketTypeId::new(), now);
        ticket_type.status = TicketTypeStatus::OnSale;
        ticket_type.issued_quantity = 10;

        assert!(LifecycleTransition::Close.matches(&ticket_type, now));
        assert!(!LifecycleTransition::SellOut.matches(&ticket_type, now));
        assert!(!LifecycleTransition::Open.matches(&ticket_type, now));
    }

    #[test]
    fn ordered_transitions_reach_evaluated_status() {
        let now = Utc::now();
        let ticket_type = NewTicketType {
            event_id: EventId::new(),
            name: "Late".to_string(),
            price_cents: Money::from_minor_units(1_000),
            quantity: 0,
            sales_window: SalesWindow::new(
                now - ChronoDuration::days(2),
                now - ChronoDuration::days(1),
            )
            .unwrap(),
        }
        .into_ticket_type(TicketTypeId::new(), now);

        let expected = ticket_type.next_status(now);
        let mut stepped = ticket_type;
        for transition in LifecycleTransition::ORDERED {
            if transition.matches(&stepped, now) {
                stepped.status = transition.to_status();
            }
        }
        assert_eq!(Some(stepped.status), expected);
        assert_eq!(stepped.status, TicketTypeStatus::Closed);
    }

    #[test]
    fn report_accumulates_per_transition() {
        let mut report = LifecycleReport::default();
        report.record(LifecycleTransition::Open, 3);
        report.record(LifecycleTransition::SellOut, 2);
        report.record(LifecycleTransition::Open, 1);
        assert_eq!(report.opened, 4);
        assert_eq!(report.sold_out, 2);
        assert_eq!(report.transitioned(), 6);
    }
}
