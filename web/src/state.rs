//! Application state shared by every handler.

use boxoffice_core::{Clock, InventoryStore, PaymentGateway, PrincipalProvider, ReservationId};
use boxoffice_runtime::{CatalogService, EngineConfig, PaymentService, ReservationEngine};
use std::sync::Arc;

/// Services and collaborators behind the HTTP surface.
///
/// Cheap to clone; every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Reservation creation, lookup and cancellation
    pub engine: ReservationEngine,
    /// Payment capture and settlement
    pub payments: PaymentService,
    /// Events, ticket types and ticket lots
    pub catalog: CatalogService,
    /// Bearer token resolution
    pub principals: Arc<dyn PrincipalProvider>,
    /// Raw store handle for readiness checks
    pub store: Arc<dyn InventoryStore>,
    payment_base_url: Arc<str>,
}

impl AppState {
    /// Wire the services over one store and clock.
    ///
    /// `payment_base_url` prefixes the `payment_url` returned for new
    /// reservations; a trailing slash is ignored.
    #[must_use]
    pub fn new(
        store: Arc<dyn InventoryStore>,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
        principals: Arc<dyn PrincipalProvider>,
        config: EngineConfig,
        payment_base_url: &str,
    ) -> Self {
        let catalog = CatalogService::new(Arc::clone(&store), Arc::clone(&clock), config.lock_timeout);
        let engine = ReservationEngine::new(Arc::clone(&store), clock, config);
        let payments = PaymentService::new(engine.clone(), gateway);
        Self {
            engine,
            payments,
            catalog,
            principals,
            store,
            payment_base_url: Arc::from(payment_base_url.trim_end_matches('/')),
        }
    }

    /// Where the buyer completes payment for `id`.
    #[must_use]
    pub fn payment_url(&self, id: ReservationId) -> String {
        format!("{}/ticket_reservations/{id}/payment", self.payment_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_testing::{
        FixedClock, InMemoryInventoryStore, MockPaymentGateway, StaticPrincipalProvider, fixtures,
    };

    #[test]
    fn payment_url_ignores_trailing_slash() {
        let state = AppState::new(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(FixedClock::new(fixtures::now())),
            Arc::new(MockPaymentGateway::approving()),
            Arc::new(StaticPrincipalProvider::new()),
            EngineConfig::default(),
            "https://tickets.example.com/",
        );
        let id = ReservationId::new();
        assert_eq!(
            state.payment_url(id),
            format!("https://tickets.example.com/ticket_reservations/{id}/payment")
        );
    }
}
