//! Error types for web handlers.
//!
//! [`AppError`] bridges [`InventoryError`] and HTTP. The status code follows
//! the error class, and the body carries a localized, user-facing message.
//! Internal details are logged and never returned to the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use boxoffice_core::{InventoryError, Locale};
use boxoffice_runtime::PaymentError;
use serde::Serialize;
use std::fmt;

/// Seconds a client should wait before retrying a lock timeout.
const RETRY_AFTER_SECS: u64 = 1;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(locale: RequestLocale) -> Result<Json<Reservation>, AppError> {
///     let reservation = engine.find_reservation(id).await.map_err(locale.error())?;
///     Ok(Json(reservation))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Seconds for the `Retry-After` header
    retry_after: Option<u64>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            retry_after: None,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Ask the client to retry after `seconds`.
    #[must_use]
    pub const fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Map an inventory error, rendering its message in `locale`.
    #[must_use]
    pub fn inventory(err: InventoryError, locale: Locale) -> Self {
        let status = match &err {
            InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            InventoryError::InvalidQuantity { .. }
            | InventoryError::InsufficientStock { .. }
            | InventoryError::InvalidPaymentMethod(_)
            | InventoryError::Validation(_)
            | InventoryError::InUse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InventoryError::Conflict(_) => StatusCode::CONFLICT,
            InventoryError::Timeout(_) | InventoryError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            },
            InventoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let app_error = Self::new(status, err.user_message(locale), err.code().to_string());
        let app_error = if matches!(err, InventoryError::Timeout(_)) {
            app_error.with_retry_after(RETRY_AFTER_SECS)
        } else {
            app_error
        };
        app_error.with_source(anyhow::Error::new(err))
    }

    /// Map a payment error, rendering its message in `locale`.
    #[must_use]
    pub fn payment(err: PaymentError, locale: Locale) -> Self {
        match err {
            PaymentError::Inventory(err) => Self::inventory(err, locale),
            PaymentError::Gateway(err) => {
                let message = match locale {
                    Locale::En => "Payment could not be processed. Please try again later.",
                    Locale::Ja => "決済を処理できませんでした。時間をおいて再度お試しください。",
                };
                Self::unavailable(message).with_source(anyhow::Error::new(err))
            },
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST".to_string())
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED".to_string())
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN".to_string())
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable error message.
    error: String,
    /// Error code (for client error handling).
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(status = %self.status, code = %self.code, "Request failed"),
            }
        } else if let Some(source) = &self.source {
            tracing::debug!(status = %self.status, code = %self.code, error = %source, "Request rejected");
        }

        let retry_after = self.retry_after;
        let body = ErrorResponse {
            error: self.message,
            code: self.code,
        };
        let mut response = (self.status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred".to_string(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
        .with_source(err)
    }
}

/// Convert with the default locale. Prefer [`AppError::inventory`] when the
/// request locale is known.
impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        Self::inventory(err, Locale::default())
    }
}

/// Malformed or ill-typed JSON bodies keep axum's status (400, 415 or 422).
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text(), "INVALID_BODY".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text(), "INVALID_PATH".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text(), "INVALID_QUERY".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use boxoffice_core::{PaymentGatewayError, Resource};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn domain_errors_are_unprocessable() {
        for err in [
            InventoryError::InvalidQuantity { requested: 0 },
            InventoryError::InsufficientStock {
                requested: 3,
                remaining: 1,
            },
            InventoryError::InvalidPaymentMethod("bitcoin".to_string()),
            InventoryError::validation("sales window is empty"),
            InventoryError::InUse {
                resource: Resource::TicketType,
                id: "t".to_string(),
                references: 2,
            },
        ] {
            assert_eq!(AppError::from(err).status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn insufficient_stock_message_is_localized() {
        let err = InventoryError::InsufficientStock {
            requested: 4,
            remaining: 2,
        };
        let app_error = AppError::inventory(err, Locale::Ja);
        assert_eq!(app_error.message, "チケットの在庫が不足しています（残り2枚）。");
        assert_eq!(app_error.code, "INSUFFICIENT_STOCK");
    }

    #[test]
    fn timeout_asks_client_to_retry() {
        let response = AppError::from(InventoryError::Timeout("ticket".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::from(InventoryError::Database("relation \"tickets\" does not exist".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("relation"));
    }

    #[test]
    fn gateway_outage_is_unavailable() {
        let err = AppError::payment(PaymentError::Gateway(PaymentGatewayError::Timeout), Locale::En);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(matches!(
            AppError::payment(PaymentError::Inventory(InventoryError::Conflict("settled".into())), Locale::En).status,
            StatusCode::CONFLICT
        ));
    }
}
