//! # Boxoffice Testing
//!
//! Testing utilities for the boxoffice inventory engine.
//!
//! This crate provides:
//! - Deterministic clocks
//! - [`InMemoryInventoryStore`], a store with the same locking and validation
//!   semantics as the Postgres store
//! - Mock payment gateway and principal provider
//! - Fixture builders that work against any [`boxoffice_core::InventoryStore`]
//!
//! ## Example
//!
//! ```
//! use boxoffice_core::InventoryStore;
//! use boxoffice_testing::{InMemoryInventoryStore, fixtures};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryInventoryStore::new();
//! let ticket = fixtures::seed_ticket(&store, 10, 2_500).await;
//! assert_eq!(store.find_ticket(ticket.id).await.ok().map(|t| t.available_quantity), Some(10));
//! # }
//! ```

use boxoffice_core::Clock;
use chrono::{DateTime, Utc};

pub mod fixtures;
pub mod memory_store;

/// Mock implementations of environment traits and external collaborators.
pub mod mocks {
    #![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
    #![allow(clippy::missing_panics_doc)] // Panics only on a poisoned mutex

    use super::{Clock, DateTime, Utc};
    use boxoffice_core::{
        GatewayResult, Money, PaymentGateway, PaymentGatewayError, PaymentMethod, PaymentReceipt,
        Principal, PrincipalProvider, ReservationId,
    };
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }

        /// Jump to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap() = time;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }

    /// Recorded capture: reservation, amount and method.
    pub type RecordedCharge = (ReservationId, Money, PaymentMethod);

    #[derive(Debug, Default)]
    struct Ledger {
        calls: usize,
        charges: Vec<RecordedCharge>,
        outcomes: HashMap<ReservationId, GatewayResult<PaymentReceipt>>,
    }

    /// Payment gateway that records charges and answers with a canned outcome.
    ///
    /// Like a real processor it treats the reservation ID as an idempotency
    /// key: a repeated charge returns the first outcome and captures nothing.
    #[derive(Debug)]
    pub struct MockPaymentGateway {
        failure: Option<PaymentGatewayError>,
        delay: Option<Duration>,
        ledger: Mutex<Ledger>,
    }

    impl MockPaymentGateway {
        /// A gateway that approves every charge
        #[must_use]
        pub fn approving() -> Self {
            Self {
                failure: None,
                delay: None,
                ledger: Mutex::default(),
            }
        }

        /// A gateway that fails every charge with `error`
        #[must_use]
        pub fn failing(error: PaymentGatewayError) -> Self {
            Self {
                failure: Some(error),
                ..Self::approving()
            }
        }

        /// Take `delay` to answer each charge
        #[must_use]
        pub const fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Distinct captures so far
        #[must_use]
        pub fn charges(&self) -> Vec<RecordedCharge> {
            self.ledger.lock().unwrap().charges.clone()
        }

        /// Every `charge` call, repeats included
        #[must_use]
        pub fn calls(&self) -> usize {
            self.ledger.lock().unwrap().calls
        }
    }

    impl PaymentGateway for MockPaymentGateway {
        fn charge(
            &self,
            reservation_id: ReservationId,
            amount: Money,
            method: PaymentMethod,
        ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentReceipt>> + Send + '_>> {
            Box::pin(async move {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                let mut ledger = self.ledger.lock().unwrap();
                ledger.calls += 1;
                if let Some(outcome) = ledger.outcomes.get(&reservation_id) {
                    return outcome.clone();
                }

                let outcome = match &self.failure {
                    Some(error) => Err(error.clone()),
                    None => {
                        ledger.charges.push((reservation_id, amount, method));
                        Ok(PaymentReceipt {
                            transaction_id: format!("txn_mock_{}", ledger.charges.len()),
                        })
                    },
                };
                // Transport failures carry no outcome; the next call tries again.
                let definitive = match &outcome {
                    Ok(_) => true,
                    Err(err) => err.is_business_failure(),
                };
                if definitive {
                    ledger.outcomes.insert(reservation_id, outcome.clone());
                }
                outcome
            })
        }
    }

    /// Principal provider backed by a fixed token table.
    #[derive(Debug, Clone, Default)]
    pub struct StaticPrincipalProvider {
        tokens: HashMap<String, Principal>,
    }

    impl StaticPrincipalProvider {
        /// Empty provider; every token is rejected
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Accept `token` as `principal`
        #[must_use]
        pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
            self.tokens.insert(token.into(), principal);
            self
        }
    }

    impl PrincipalProvider for StaticPrincipalProvider {
        fn authenticate<'a>(
            &'a self,
            token: &'a str,
        ) -> Pin<Box<dyn Future<Output = Option<Principal>> + Send + 'a>> {
            Box::pin(async move { self.tokens.get(token).copied() })
        }
    }
}

// Re-export commonly used items
pub use memory_store::InMemoryInventoryStore;
pub use mocks::{FixedClock, ManualClock, MockPaymentGateway, StaticPrincipalProvider};
