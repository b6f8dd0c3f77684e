//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`RequestLocale`]: message language from `Accept-Language`
//! - [`BearerToken`]: raw token from `Authorization: Bearer …`
//! - [`Authenticated`]: the caller, resolved through
//!   [`boxoffice_core::PrincipalProvider`]
//! - [`AppJson`], [`AppPath`], [`AppQuery`]: axum's extractors with
//!   rejections rendered as [`AppError`] bodies
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     State(state): State<AppState>,
//!     Authenticated(principal): Authenticated,
//!     locale: RequestLocale,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(user_id = %principal.user_id, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use boxoffice_core::{InventoryError, Locale, Principal};
use boxoffice_runtime::PaymentError;
use std::convert::Infallible;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from request extensions when the correlation middleware ran,
/// otherwise from the `X-Correlation-ID` header, otherwise freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }
        let id = parts
            .headers
            .get(crate::middleware::CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        Ok(Self(id))
    }
}

/// Language for user-facing error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestLocale(pub Locale);

impl RequestLocale {
    /// Closure mapping an inventory error into a localized [`AppError`].
    ///
    /// ```ignore
    /// let event = state.catalog.find_event(id).await.map_err(locale.error())?;
    /// ```
    #[must_use]
    pub fn error(self) -> impl Fn(InventoryError) -> AppError {
        move |err| AppError::inventory(err, self.0)
    }

    /// Closure mapping a payment error into a localized [`AppError`].
    #[must_use]
    pub fn payment_error(self) -> impl Fn(PaymentError) -> AppError {
        move |err| AppError::payment(err, self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default();
        Ok(Self(locale))
    }
}

/// Bearer token from the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authorization header must be 'Bearer <token>'"))?;

        Ok(Self(token.to_string()))
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        state
            .principals
            .authenticate(&token)
            .await
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))
    }
}

/// JSON body whose rejection is an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query string whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
