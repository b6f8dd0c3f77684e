//! Reservation endpoints.
//!
//! ```text
//! POST /ticket_reservations              create (201)
//! GET  /ticket_reservations/:id          read, owner only
//! POST /ticket_reservations/:id/payment  capture and settle, owner only
//! POST /ticket_reservations/:id/cancel   cancel while pending, owner only
//! ```

use crate::error::AppError;
use crate::extractors::{AppJson, AppPath, Authenticated, RequestLocale};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::{
    Money, Principal, Reservation, ReservationId, ReservationRequest, ReservationStatus, TicketId,
};
use serde::{Deserialize, Serialize};

/// `POST /ticket_reservations` body.
#[derive(Debug, Deserialize)]
pub struct CreateReservationBody {
    /// Ticket lot to reserve from
    pub ticket_id: TicketId,
    /// Signed so that zero and negative requests reach domain validation
    pub quantity: i64,
    /// One of `credit_card`, `bank_transfer`, `convenience_store`
    pub payment_method: String,
}

/// The reservation fields a buyer needs before paying.
#[derive(Debug, Serialize)]
pub struct ReservationSummary {
    /// Reservation ID
    pub id: ReservationId,
    /// Frozen total in minor units
    pub total_price: Money,
    /// Always `pending` on creation
    pub status: ReservationStatus,
}

/// `201` body for a new reservation.
#[derive(Debug, Serialize)]
pub struct CreatedReservation {
    /// Summary of the reservation
    pub reservation: ReservationSummary,
    /// Where the buyer completes payment
    pub payment_url: String,
}

/// Body wrapping a full reservation.
#[derive(Debug, Serialize)]
pub struct ReservationBody {
    /// The reservation
    pub reservation: Reservation,
}

/// Reserve tickets for the caller.
///
/// # Errors
///
/// `401` without a valid token. Engine errors map per [`AppError::inventory`]:
/// `404` for an unknown lot, `422` for invalid quantity, insufficient stock or
/// unsupported payment method, `503` when the lock budget is exhausted.
pub async fn create_reservation(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppJson(body): AppJson<CreateReservationBody>,
) -> Result<(StatusCode, Json<CreatedReservation>), AppError> {
    let request = ReservationRequest {
        user_id: principal.user_id,
        ticket_id: body.ticket_id,
        quantity: body.quantity,
        payment_method: body.payment_method,
    };
    let reservation = state
        .engine
        .create_reservation(request)
        .await
        .map_err(locale.error())?;

    let payment_url = state.payment_url(reservation.id);
    Ok((
        StatusCode::CREATED,
        Json(CreatedReservation {
            reservation: ReservationSummary {
                id: reservation.id,
                total_price: reservation.total_price,
                status: reservation.status,
            },
            payment_url,
        }),
    ))
}

/// Load a reservation the caller owns.
async fn owned_reservation(
    state: &AppState,
    principal: &Principal,
    id: ReservationId,
    locale: RequestLocale,
) -> Result<Reservation, AppError> {
    let reservation = state
        .engine
        .find_reservation(id)
        .await
        .map_err(locale.error())?;
    if reservation.user_id != principal.user_id {
        return Err(AppError::forbidden("This reservation belongs to another user"));
    }
    Ok(reservation)
}

/// Read one of the caller's reservations.
///
/// # Errors
///
/// `404` if missing, `403` if owned by someone else.
pub async fn get_reservation(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(id): AppPath<ReservationId>,
) -> Result<Json<ReservationBody>, AppError> {
    let reservation = owned_reservation(&state, &principal, id, locale).await?;
    Ok(Json(ReservationBody { reservation }))
}

/// Capture payment for a pending reservation and settle it.
///
/// A declined payment is a successful request whose reservation ends in
/// `payment_failed`.
///
/// # Errors
///
/// `404`, `403`, `409` if already settled, `503` if the gateway gave no
/// definitive answer.
pub async fn pay_reservation(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(id): AppPath<ReservationId>,
) -> Result<Json<ReservationBody>, AppError> {
    owned_reservation(&state, &principal, id, locale).await?;
    let reservation = state
        .payments
        .pay(id)
        .await
        .map_err(locale.payment_error())?;
    Ok(Json(ReservationBody { reservation }))
}

/// Cancel a pending reservation. Stock is not returned.
///
/// # Errors
///
/// `404`, `403`, `409` if no longer pending.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(id): AppPath<ReservationId>,
) -> Result<Json<ReservationBody>, AppError> {
    owned_reservation(&state, &principal, id, locale).await?;
    let reservation = state
        .engine
        .cancel_reservation(id)
        .await
        .map_err(locale.error())?;
    Ok(Json(ReservationBody { reservation }))
}
