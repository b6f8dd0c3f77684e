//! Payment gateway boundary.
//!
//! Capture happens after stock is already committed as pending and the caller
//! holds the payment claim from [`crate::InventoryStore::claim_payment`]. The gateway
//! only reports an outcome; applying it is [`crate::InventoryStore::settle_reservation`].

use crate::ids::ReservationId;
use crate::money::Money;
use crate::reservation::PaymentMethod;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Successful capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Opaque gateway transaction reference
    pub transaction_id: String,
}

/// Gateway failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentGatewayError {
    /// The payment was refused.
    #[error("Payment declined: {reason}")]
    Declined {
        /// Gateway-provided reason
        reason: String,
        /// Gateway reference for the attempt, if any
        transaction_id: Option<String>,
    },

    /// The payer lacks funds.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// The gateway did not answer in time. The outcome is unknown.
    #[error("Payment gateway timed out")]
    Timeout,

    /// The gateway could not be reached.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

impl PaymentGatewayError {
    /// Whether the gateway gave a definitive "no".
    ///
    /// Business failures settle the reservation as `payment_failed`. Transport
    /// failures leave it pending because the charge may still have happened.
    #[must_use]
    pub const fn is_business_failure(&self) -> bool {
        matches!(self, Self::Declined { .. } | Self::InsufficientFunds)
    }
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// External payment processor.
///
/// The reservation ID is passed as the idempotency key so a retried capture
/// never charges twice.
pub trait PaymentGateway: Send + Sync {
    /// Capture `amount` for a reservation.
    ///
    /// # Errors
    ///
    /// See [`PaymentGatewayError`].
    fn charge(
        &self,
        reservation_id: ReservationId,
        amount: Money,
        method: PaymentMethod,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentReceipt>> + Send + '_>>;
}
