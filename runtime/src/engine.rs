//! The reservation engine.
//!
//! Creates reservations against the store's row-locked transaction, retrying
//! only connectivity failures and only within the configured budget. Lock
//! timeouts and conflicts go straight back to the caller.
//!
//! A retried attempt reuses the reservation ID. If an earlier attempt
//! committed but its acknowledgement was lost, the retry fails (duplicate ID
//! or no stock left) and the engine returns the committed reservation.

use crate::metrics::{ReservationMetrics, SettlementMetrics};
use crate::retry::{RetryPolicy, retry_with_predicate};
use boxoffice_core::{
    Clock, InventoryError, InventoryStore, Reservation, ReservationId, ReservationRequest,
    Settlement,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span, warn};

/// Engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Longest a reservation may wait for the ticket row lock
    pub lock_timeout: Duration,
    /// Retry budget for connectivity failures
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

/// Reservation engine.
///
/// Cheap to clone; all clones share the same store and clock.
#[derive(Clone)]
pub struct ReservationEngine {
    store: Arc<dyn InventoryStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl ReservationEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(store: Arc<dyn InventoryStore>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    /// The engine clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reserve tickets for a buyer.
    ///
    /// Every attempt reuses the same reservation ID, so a retry after a commit
    /// whose acknowledgement was lost never reserves twice. That reservation
    /// is returned instead of the retry's error.
    ///
    /// # Errors
    ///
    /// Any [`InventoryError`] from the store. Retryable errors are only
    /// returned after the retry budget is spent.
    pub async fn create_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<Reservation, InventoryError> {
        let id = ReservationId::new();
        let span = info_span!(
            "create_reservation",
            reservation_id = %id,
            ticket_id = %request.ticket_id,
            user_id = %request.user_id,
            quantity = request.quantity,
        );

        async {
            let started = Instant::now();
            let now = self.clock.now();

            let mut attempts = 0_u32;
            let result = retry_with_predicate(
                &self.config.retry,
                || {
                    attempts += 1;
                    self.store
                        .create_reservation(id, request.clone(), now, self.config.lock_timeout)
                },
                InventoryError::is_retryable,
            )
            .await;
            let result = match result {
                Err(err) if attempts > 1 => self.recover_committed(id, err).await,
                other => other,
            };

            ReservationMetrics::record(result.as_ref().map(|_| ()), started.elapsed());
            match &result {
                Ok(reservation) => info!(
                    total_price = %reservation.total_price,
                    "Reservation created"
                ),
                Err(err) if err.is_domain_error() => info!(error = %err, "Reservation rejected"),
                Err(err) => warn!(error = %err, "Reservation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// After a retried attempt failed, return the reservation an earlier
    /// attempt committed under `id`, or the retry's error if there is none.
    async fn recover_committed(&self, id: ReservationId, err: InventoryError) -> Result<Reservation, InventoryError> {
        match self.store.find_reservation(id).await {
            Ok(reservation) => {
                info!(error = %err, "Reservation committed by an earlier attempt");
                Ok(reservation)
            },
            Err(_) => Err(err),
        }
    }

    /// Look up a reservation.
    ///
    /// # Errors
    ///
    /// [`InventoryError::NotFound`] if it does not exist.
    pub async fn find_reservation(&self, id: ReservationId) -> Result<Reservation, InventoryError> {
        self.store.find_reservation(id).await
    }

    /// Apply a payment outcome to a pending reservation.
    ///
    /// Never changes stock.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Conflict`] if the reservation already left `pending`.
    pub async fn settle_reservation(
        &self,
        id: ReservationId,
        settlement: Settlement,
    ) -> Result<Reservation, InventoryError> {
        let result = self
            .store
            .settle_reservation(id, settlement, self.clock.now(), self.config.lock_timeout)
            .await;
        match &result {
            Ok(reservation) => {
                SettlementMetrics::record(reservation.status.as_str());
                info!(reservation_id = %id, status = %reservation.status, "Reservation settled");
            },
            Err(InventoryError::Conflict(reason)) => {
                SettlementMetrics::record("conflict");
                warn!(reservation_id = %id, reason = %reason, "Settlement rejected");
            },
            Err(err) => warn!(reservation_id = %id, error = %err, "Settlement failed"),
        }
        result
    }

    /// Take the right to capture payment for a pending reservation.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Conflict`] if the reservation left `pending` or
    /// another payment attempt holds a claim younger than `lease`.
    pub async fn claim_payment(&self, id: ReservationId, lease: Duration) -> Result<Reservation, InventoryError> {
        self.store
            .claim_payment(id, self.clock.now(), lease, self.config.lock_timeout)
            .await
    }

    /// Give up a payment claim so the buyer can try again.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn release_payment_claim(&self, id: ReservationId) -> Result<(), InventoryError> {
        self.store.release_payment_claim(id).await
    }

    /// Cancel a pending reservation. Stock is not restored.
    ///
    /// # Errors
    ///
    /// [`InventoryError::Conflict`] if the reservation already left `pending`.
    pub async fn cancel_reservation(&self, id: ReservationId) -> Result<Reservation, InventoryError> {
        let reservation = self
            .store
            .cancel_reservation(id, self.clock.now(), self.config.lock_timeout)
            .await?;
        SettlementMetrics::record("cancelled");
        info!(reservation_id = %id, "Reservation cancelled");
        Ok(reservation)
    }
}
