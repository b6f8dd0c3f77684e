//! Ticket lots: concrete, purchasable batches with their own stock counter.

use crate::error::InventoryError;
use crate::ids::{EventId, TicketId, TicketTypeId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An issued lot of tickets.
///
/// Invariant: `0 ≤ available_quantity ≤ quantity`. `available_quantity` only
/// decreases, and only inside the reservation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Ticket ID
    pub id: TicketId,
    /// Owning event
    pub event_id: EventId,
    /// Ticket type this lot was issued under (`None` for legacy lots)
    pub ticket_type_id: Option<TicketTypeId>,
    /// Display title
    pub title: String,
    /// Unit price
    pub price: Money,
    /// Lot size
    pub quantity: u32,
    /// Units not yet reserved
    pub available_quantity: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Whether any unit can still be reserved.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available_quantity > 0
    }
}

/// Attributes for issuing a new lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Owning event
    pub event_id: EventId,
    /// Ticket type to issue under (`None` for a legacy event-level lot)
    pub ticket_type_id: Option<TicketTypeId>,
    /// Display title
    pub title: String,
    /// Unit price
    pub price: Money,
    /// Lot size
    pub quantity: u32,
}

impl NewTicket {
    /// Check lot-level invariants.
    ///
    /// Capacity checks against the event and ticket type need their rows
    /// locked and are done by the store.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] for an empty lot or blank title.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.quantity == 0 {
            return Err(InventoryError::validation("Ticket quantity must be at least 1"));
        }
        if self.title.trim().is_empty() {
            return Err(InventoryError::validation("Ticket title must not be blank"));
        }
        Ok(())
    }

    /// Check the lot fits the event capacity and the ticket type allotment.
    ///
    /// `issued_for_event` is Σ quantities of lots already issued for the event;
    /// `type_remaining` is the ticket type's remaining quantity, if the lot is
    /// issued under one.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if either limit would be exceeded.
    pub fn check_limits(
        &self,
        event_capacity: u32,
        issued_for_event: u64,
        type_remaining: Option<i64>,
    ) -> Result<(), InventoryError> {
        let requested = u64::from(self.quantity);
        if issued_for_event + requested > u64::from(event_capacity) {
            return Err(InventoryError::validation(format!(
                "Issuing {requested} ticket(s) would exceed the event capacity of {event_capacity} ({issued_for_event} already issued)"
            )));
        }
        if let Some(remaining) = type_remaining {
            if i64::from(self.quantity) > remaining {
                return Err(InventoryError::validation(format!(
                    "Issuing {requested} ticket(s) would exceed the ticket type allotment ({} remaining)",
                    remaining.max(0)
                )));
            }
        }
        Ok(())
    }

    /// Materialize the lot with full stock.
    #[must_use]
    pub fn into_ticket(self, id: TicketId, created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id,
            event_id: self.event_id,
            ticket_type_id: self.ticket_type_id,
            title: self.title,
            price: self.price,
            quantity: self.quantity,
            available_quantity: self.quantity,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(quantity: u32) -> NewTicket {
        NewTicket {
            event_id: EventId::new(),
            ticket_type_id: Some(TicketTypeId::new()),
            title: "Arena A".to_string(),
            price: Money::from_minor_units(8_000),
            quantity,
        }
    }

    #[test]
    fn empty_lot_is_rejected() {
        assert!(lot(0).validate().is_err());
        assert!(lot(1).validate().is_ok());
    }

    #[test]
    fn lot_must_fit_event_capacity() {
        assert!(lot(10).check_limits(100, 90, None).is_ok());
        assert!(lot(11).check_limits(100, 90, None).is_err());
    }

    #[test]
    fn lot_must_fit_type_allotment() {
        assert!(lot(5).check_limits(100, 0, Some(5)).is_ok());
        assert!(lot(6).check_limits(100, 0, Some(5)).is_err());
        assert!(lot(1).check_limits(100, 0, Some(-2)).is_err());
    }

    #[test]
    fn new_lot_starts_fully_available() {
        let ticket = lot(7).into_ticket(TicketId::new(), Utc::now());
        assert_eq!(ticket.available_quantity, ticket.quantity);
        assert!(ticket.is_available());
    }
}
