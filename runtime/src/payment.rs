//! Payment capture for pending reservations.
//!
//! A capture starts only after the store grants a payment claim on the
//! reservation, so concurrent attempts never reach the gateway twice. The
//! reservation ID doubles as the gateway's idempotency key for captures whose
//! claim outlived its lease.

use crate::engine::ReservationEngine;
use crate::metrics::SettlementMetrics;
use boxoffice_core::{
    InventoryError, PaymentGateway, PaymentGatewayError, Reservation, ReservationId, Settlement,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from [`PaymentService::pay`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The reservation could not be read or settled.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// The gateway failed without a definitive answer. The reservation is
    /// still pending and the payment may be retried.
    #[error("Payment gateway failure: {0}")]
    Gateway(PaymentGatewayError),
}

/// How long a payment claim blocks other attempts.
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(300);

/// Drives the payment gateway for a reservation, then settles it.
#[derive(Clone)]
pub struct PaymentService {
    engine: ReservationEngine,
    gateway: Arc<dyn PaymentGateway>,
    claim_lease: Duration,
}

impl PaymentService {
    /// Create a payment service.
    #[must_use]
    pub fn new(engine: ReservationEngine, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            engine,
            gateway,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    /// Override [`DEFAULT_CLAIM_LEASE`].
    #[must_use]
    pub const fn with_claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    /// Charge the frozen total of a pending reservation.
    ///
    /// A definitive decline settles the reservation as `payment_failed` and is
    /// returned as `Ok`. Transport failures leave it pending.
    ///
    /// # Errors
    ///
    /// [`PaymentError::Inventory`] with [`InventoryError::Conflict`] if the
    /// reservation is not pending or another payment for it is in progress,
    /// or [`PaymentError::Gateway`] for transport failures.
    pub async fn pay(&self, id: ReservationId) -> Result<Reservation, PaymentError> {
        let reservation = self.engine.claim_payment(id, self.claim_lease).await?;

        let charge = self
            .gateway
            .charge(id, reservation.total_price, reservation.payment_method)
            .await;

        let settlement = match charge {
            Ok(receipt) => Settlement::Confirmed {
                transaction_id: receipt.transaction_id,
            },
            Err(err) if err.is_business_failure() => {
                info!(reservation_id = %id, error = %err, "Payment refused");
                Settlement::Failed {
                    transaction_id: match err {
                        PaymentGatewayError::Declined { transaction_id, .. } => transaction_id,
                        _ => None,
                    },
                }
            },
            Err(err) => {
                SettlementMetrics::record("gateway_error");
                warn!(reservation_id = %id, error = %err, "Payment gateway failure, reservation left pending");
                if let Err(release) = self.engine.release_payment_claim(id).await {
                    warn!(reservation_id = %id, error = %release, "Payment claim not released, retry waits for lease");
                }
                return Err(PaymentError::Gateway(err));
            },
        };

        Ok(self.engine.settle_reservation(id, settlement).await?)
    }
}
