//! Bundled implementations of the external collaborator traits.

use boxoffice_core::{
    GatewayResult, Money, PaymentGateway, PaymentMethod, PaymentReceipt, Principal,
    PrincipalProvider, ReservationId,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::info;

/// Principal provider backed by the `AUTH_TOKENS` table.
#[derive(Debug, Clone, Default)]
pub struct EnvPrincipalProvider {
    tokens: HashMap<String, Principal>,
}

impl EnvPrincipalProvider {
    /// Build from `(token, principal)` pairs. A repeated token keeps its last
    /// principal.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = (String, Principal)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Number of accepted tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether every token is rejected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl PrincipalProvider for EnvPrincipalProvider {
    fn authenticate<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Principal>> + Send + 'a>> {
        Box::pin(async move { self.tokens.get(token).copied() })
    }
}

/// Gateway that approves every charge without moving money.
///
/// For development and staging; transaction ids are prefixed `sandbox_`.
/// The id is derived from the reservation, so a repeated charge for the same
/// reservation reports the same transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxPaymentGateway;

impl PaymentGateway for SandboxPaymentGateway {
    fn charge(
        &self,
        reservation_id: ReservationId,
        amount: Money,
        method: PaymentMethod,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentReceipt>> + Send + '_>> {
        Box::pin(async move {
            let transaction_id = format!("sandbox_{}", reservation_id.as_uuid().simple());
            info!(
                reservation_id = %reservation_id,
                amount = %amount,
                method = %method,
                transaction_id = %transaction_id,
                "Sandbox charge approved"
            );
            Ok(PaymentReceipt { transaction_id })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use boxoffice_core::UserId;

    #[tokio::test]
    async fn env_provider_resolves_configured_tokens() {
        let principal = Principal::user(UserId::new());
        let provider = EnvPrincipalProvider::new([("abc".to_string(), principal)]);

        assert_eq!(provider.authenticate("abc").await, Some(principal));
        assert_eq!(provider.authenticate("abd").await, None);
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn sandbox_gateway_reference_follows_reservation() {
        let gateway = SandboxPaymentGateway;
        let reservation_id = ReservationId::new();
        let charge = |id| gateway.charge(id, Money::from_minor_units(1_000), PaymentMethod::CreditCard);

        let first = charge(reservation_id).await.unwrap();
        let repeated = charge(reservation_id).await.unwrap();
        let other = charge(ReservationId::new()).await.unwrap();

        assert!(first.transaction_id.starts_with("sandbox_"));
        assert_eq!(first, repeated);
        assert_ne!(first.transaction_id, other.transaction_id);
    }
}
