//! Reservations: a buyer's claim on a ticket lot, pending payment.
//!
//! # Payment lifecycle
//!
//! ```text
//!            settle(Confirmed)
//!   Pending ───────────────────▶ Confirmed
//!      │    settle(Failed)
//!      ├───────────────────────▶ PaymentFailed
//!      │    cancel
//!      └───────────────────────▶ Cancelled
//! ```
//!
//! All three targets are terminal. A reservation never re-enters `Pending`, and
//! none of these transitions touches ticket stock.

use crate::error::InventoryError;
use crate::ids::{ReservationId, TicketId, UserId};
use crate::money::Money;
use crate::ticket::Ticket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment
    CreditCard,
    /// Bank transfer
    BankTransfer,
    /// Pay at a convenience store
    ConvenienceStore,
}

impl PaymentMethod {
    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::BankTransfer => "bank_transfer",
            Self::ConvenienceStore => "convenience_store",
        }
    }

    /// Parse a payment method.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::InvalidPaymentMethod`] for anything outside the
    /// supported set.
    pub fn parse(s: &str) -> Result<Self, InventoryError> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "bank_transfer" => Ok(Self::BankTransfer),
            "convenience_store" => Ok(Self::ConvenienceStore),
            other => Err(InventoryError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reservation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Stock committed, awaiting payment
    Pending,
    /// Payment captured
    Confirmed,
    /// Payment declined
    PaymentFailed,
    /// Cancelled by the buyer before settlement
    Cancelled,
}

impl ReservationStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::PaymentFailed => "payment_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse status from database string.
    ///
    /// # Errors
    ///
    /// Returns error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, InventoryError> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "payment_failed" => Ok(Self::PaymentFailed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(InventoryError::validation(format!(
                "Invalid reservation status: {s}"
            ))),
        }
    }

    /// Status after applying `settlement`.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] unless the reservation is pending.
    pub fn settle(self, settlement: &Settlement) -> Result<Self, InventoryError> {
        self.ensure_pending()?;
        Ok(match settlement {
            Settlement::Confirmed { .. } => Self::Confirmed,
            Settlement::Failed { .. } => Self::PaymentFailed,
        })
    }

    /// Status after a buyer cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] unless the reservation is pending.
    pub fn cancel(self) -> Result<Self, InventoryError> {
        self.ensure_pending()?;
        Ok(Self::Cancelled)
    }

    /// Check that the reservation can still be paid, settled or cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] unless the reservation is pending.
    pub fn ensure_pending(self) -> Result<(), InventoryError> {
        if self == Self::Pending {
            Ok(())
        } else {
            Err(InventoryError::Conflict(format!("reservation is already {self}")))
        }
    }
}

/// Whether a payment claim taken at `claimed_at` still blocks other
/// claimants at `now`.
///
/// A claim older than `lease` is abandoned (its holder crashed or gave up) and
/// may be taken over. A lease too large to represent never expires.
#[must_use]
pub fn payment_claim_active(claimed_at: DateTime<Utc>, now: DateTime<Utc>, lease: Duration) -> bool {
    chrono::Duration::from_std(lease)
        .ok()
        .and_then(|lease| claimed_at.checked_add_signed(lease))
        .is_none_or(|expires_at| now < expires_at)
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Payment captured
    Confirmed {
        /// Gateway transaction reference
        transaction_id: String,
    },
    /// Payment declined
    Failed {
        /// Gateway reference for the failed attempt, if any
        transaction_id: Option<String>,
    },
}

impl Settlement {
    /// Gateway reference carried by this outcome.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Confirmed { transaction_id } => Some(transaction_id),
            Self::Failed { transaction_id } => transaction_id.as_deref(),
        }
    }
}

/// A buyer's claim on a ticket lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    /// Reservation ID
    pub id: ReservationId,
    /// Buyer
    pub user_id: UserId,
    /// Reserved lot
    pub ticket_id: TicketId,
    /// Number of tickets (> 0)
    pub quantity: u32,
    /// `ticket.price × quantity`, frozen at creation
    pub total_price: Money,
    /// Payment lifecycle status
    pub status: ReservationStatus,
    /// Chosen payment method
    pub payment_method: PaymentMethod,
    /// Gateway reference, set at settlement
    pub transaction_id: Option<String>,
    /// When payment was captured
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// A fresh pending reservation from a validated draft.
    #[must_use]
    pub fn pending(
        id: ReservationId,
        user_id: UserId,
        ticket_id: TicketId,
        draft: ReservationDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            ticket_id,
            quantity: draft.quantity,
            total_price: draft.total_price,
            status: ReservationStatus::Pending,
            payment_method: draft.payment_method,
            transaction_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a payment outcome.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] unless the reservation is pending.
    pub fn settle(&mut self, settlement: Settlement, now: DateTime<Utc>) -> Result<(), InventoryError> {
        self.status = self.status.settle(&settlement)?;
        if self.status == ReservationStatus::Confirmed {
            self.paid_at = Some(now);
        }
        self.transaction_id = match settlement {
            Settlement::Confirmed { transaction_id } => Some(transaction_id),
            Settlement::Failed { transaction_id } => transaction_id,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Cancel a pending reservation.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Conflict`] unless the reservation is pending.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), InventoryError> {
        self.status = self.status.cancel()?;
        self.updated_at = now;
        Ok(())
    }
}

/// Unvalidated input to `CreateReservation`.
///
/// `quantity` is signed so that zero and negative requests reach validation and
/// are reported as [`InventoryError::InvalidQuantity`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservationRequest {
    /// Buyer
    pub user_id: UserId,
    /// Lot to reserve from
    pub ticket_id: TicketId,
    /// Requested number of tickets
    pub quantity: i64,
    /// Requested payment method
    pub payment_method: String,
}

/// A request that passed every precondition against a locked ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationDraft {
    /// Validated quantity
    pub quantity: u32,
    /// Price frozen from the locked ticket
    pub total_price: Money,
    /// Validated payment method
    pub payment_method: PaymentMethod,
}

/// Validate `request` against `ticket`, which the caller must hold locked.
///
/// Checks run in a fixed order: quantity ≥ 1, quantity ≤ available stock,
/// supported payment method. The first failure wins.
///
/// # Errors
///
/// [`InventoryError::InvalidQuantity`], [`InventoryError::InsufficientStock`]
/// (with the remaining count), [`InventoryError::InvalidPaymentMethod`], or
/// [`InventoryError::Validation`] if the total overflows.
///
/// ```
/// use boxoffice_core::{
///     prepare_reservation, EventId, InventoryError, Money, NewTicket, ReservationRequest,
///     TicketId, UserId,
/// };
/// use chrono::Utc;
///
/// let ticket = NewTicket {
///     event_id: EventId::new(),
///     ticket_type_id: None,
///     title: "Standing".into(),
///     price: Money::from_minor_units(3_000),
///     quantity: 10,
/// }
/// .into_ticket(TicketId::new(), Utc::now());
///
/// let request = ReservationRequest {
///     user_id: UserId::new(),
///     ticket_id: ticket.id,
///     quantity: 4,
///     payment_method: "credit_card".into(),
/// };
/// let draft = prepare_reservation(&ticket, &request)?;
/// assert_eq!(draft.total_price, Money::from_minor_units(12_000));
/// # Ok::<(), InventoryError>(())
/// ```
pub fn prepare_reservation(
    ticket: &Ticket,
    request: &ReservationRequest,
) -> Result<ReservationDraft, InventoryError> {
    if request.quantity < 1 {
        return Err(InventoryError::InvalidQuantity {
            requested: request.quantity,
        });
    }

    let quantity = match u32::try_from(request.quantity) {
        Ok(quantity) if quantity <= ticket.available_quantity => quantity,
        _ => {
            return Err(InventoryError::InsufficientStock {
                requested: request.quantity,
                remaining: ticket.available_quantity,
            });
        },
    };

    let payment_method = PaymentMethod::parse(&request.payment_method)?;

    let total_price = ticket
        .price
        .checked_multiply(quantity)
        .ok_or_else(|| InventoryError::validation("total price overflows"))?;

    Ok(ReservationDraft {
        quantity,
        total_price,
        payment_method,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::ids::EventId;
    use crate::ticket::NewTicket;

    fn ticket(available: u32) -> Ticket {
        let mut ticket = NewTicket {
            event_id: EventId::new(),
            ticket_type_id: None,
            title: "Floor".to_string(),
            price: Money::from_minor_units(2_500),
            quantity: 10,
        }
        .into_ticket(TicketId::new(), Utc::now());
        ticket.available_quantity = available;
        ticket
    }

    fn request(ticket: &Ticket, quantity: i64, method: &str) -> ReservationRequest {
        ReservationRequest {
            user_id: UserId::new(),
            ticket_id: ticket.id,
            quantity,
            payment_method: method.to_string(),
        }
    }

    fn pending() -> Reservation {
        let ticket = ticket(10);
        let draft = prepare_reservation(&ticket, &request(&ticket, 2, "bank_transfer")).unwrap();
        Reservation::pending(ReservationId::new(), UserId::new(), ticket.id, draft, Utc::now())
    }

    #[test]
    fn quantity_is_checked_before_stock_and_method() {
        let ticket = ticket(0);
        assert_eq!(
            prepare_reservation(&ticket, &request(&ticket, 0, "bitcoin")),
            Err(InventoryError::InvalidQuantity { requested: 0 })
        );
        assert_eq!(
            prepare_reservation(&ticket, &request(&ticket, -3, "credit_card")),
            Err(InventoryError::InvalidQuantity { requested: -3 })
        );
    }

    #[test]
    fn stock_is_checked_before_method() {
        let ticket = ticket(2);
        assert_eq!(
            prepare_reservation(&ticket, &request(&ticket, 4, "bitcoin")),
            Err(InventoryError::InsufficientStock {
                requested: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn huge_quantity_is_insufficient_stock() {
        let ticket = ticket(2);
        assert!(matches!(
            prepare_reservation(&ticket, &request(&ticket, i64::MAX, "credit_card")),
            Err(InventoryError::InsufficientStock { remaining: 2, .. })
        ));
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let ticket = ticket(5);
        assert_eq!(
            prepare_reservation(&ticket, &request(&ticket, 1, "paypal")),
            Err(InventoryError::InvalidPaymentMethod("paypal".to_string()))
        );
    }

    #[test]
    fn total_price_is_price_times_quantity() {
        let ticket = ticket(10);
        let draft = prepare_reservation(&ticket, &request(&ticket, 10, "convenience_store")).unwrap();
        assert_eq!(draft.quantity, 10);
        assert_eq!(draft.total_price, Money::from_minor_units(25_000));
        assert_eq!(draft.payment_method, PaymentMethod::ConvenienceStore);
    }

    #[test]
    fn confirmation_records_transaction_and_paid_at() {
        let mut reservation = pending();
        let now = Utc::now();
        reservation
            .settle(
                Settlement::Confirmed {
                    transaction_id: "txn_1".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.transaction_id.as_deref(), Some("txn_1"));
        assert_eq!(reservation.paid_at, Some(now));
    }

    #[test]
    fn second_settlement_conflicts_and_keeps_first_outcome() {
        let mut reservation = pending();
        reservation
            .settle(
                Settlement::Confirmed {
                    transaction_id: "txn_1".to_string(),
                },
                Utc::now(),
            )
            .unwrap();

        let second = reservation.settle(Settlement::Failed { transaction_id: None }, Utc::now());
        assert!(matches!(second, Err(InventoryError::Conflict(_))));
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.transaction_id.as_deref(), Some("txn_1"));
    }

    #[test]
    fn failed_payment_has_no_paid_at() {
        let mut reservation = pending();
        reservation
            .settle(
                Settlement::Failed {
                    transaction_id: Some("txn_declined".to_string()),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(reservation.status, ReservationStatus::PaymentFailed);
        assert!(reservation.paid_at.is_none());
    }

    #[test]
    fn only_pending_can_be_cancelled() {
        let mut reservation = pending();
        reservation.cancel(Utc::now()).unwrap();
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert!(reservation.cancel(Utc::now()).is_err());
        assert!(
            reservation
                .settle(
                    Settlement::Confirmed {
                        transaction_id: "late".to_string()
                    },
                    Utc::now()
                )
                .is_err()
        );
    }

    #[test]
    fn statuses_roundtrip_through_strings() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::PaymentFailed,
            ReservationStatus::Cancelled,
        ] {
            assert_eq!(ReservationStatus::parse(status.as_str()), Ok(status));
        }
        for method in [
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::ConvenienceStore,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Ok(method));
        }
    }

    #[test]
    fn payment_claims_expire_after_lease() {
        let claimed_at = Utc::now();
        let lease = Duration::from_secs(300);

        assert!(payment_claim_active(claimed_at, claimed_at, lease));
        assert!(payment_claim_active(
            claimed_at,
            claimed_at + chrono::Duration::seconds(299),
            lease
        ));
        assert!(!payment_claim_active(
            claimed_at,
            claimed_at + chrono::Duration::seconds(300),
            lease
        ));
        assert!(payment_claim_active(claimed_at, claimed_at, Duration::MAX));
    }
}
