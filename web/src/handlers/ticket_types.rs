//! Ticket type CRUD for event organizers.
//!
//! Every route requires the caller to manage the event (`403` otherwise).

use super::managed_event;
use crate::error::AppError;
use crate::extractors::{AppJson, AppPath, Authenticated, RequestLocale};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::{
    DateTime, EventId, Money, NewTicketType, SalesWindow, TicketType, TicketTypeChanges,
    TicketTypeId, TicketTypeStatus, Utc,
};
use serde::{Deserialize, Serialize};

/// `POST /events/:event_id/ticket_types` body.
#[derive(Debug, Deserialize)]
pub struct CreateTicketTypeBody {
    /// Display name
    pub name: String,
    /// Unit price in minor units
    pub price_cents: Money,
    /// Total allotment
    pub quantity: u32,
    /// Sales open
    pub sales_start_at: DateTime<Utc>,
    /// Sales close
    pub sales_end_at: DateTime<Utc>,
}

/// `PUT /events/:event_id/ticket_types/:id` body. Omitted fields are unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketTypeBody {
    /// New display name
    pub name: Option<String>,
    /// New unit price
    pub price_cents: Option<Money>,
    /// New allotment; rejected once the type left `draft`
    pub quantity: Option<u32>,
    /// New sales start
    pub sales_start_at: Option<DateTime<Utc>>,
    /// New sales end
    pub sales_end_at: Option<DateTime<Utc>>,
}

impl From<UpdateTicketTypeBody> for TicketTypeChanges {
    fn from(body: UpdateTicketTypeBody) -> Self {
        Self {
            name: body.name,
            price_cents: body.price_cents,
            quantity: body.quantity,
            sales_start_at: body.sales_start_at,
            sales_end_at: body.sales_end_at,
        }
    }
}

/// `PUT /events/:event_id/ticket_types/:id/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusOverrideBody {
    /// Target status
    pub status: TicketTypeStatus,
}

/// Body wrapping one ticket type.
#[derive(Debug, Serialize)]
pub struct TicketTypeBody {
    /// The ticket type
    pub ticket_type: TicketType,
}

/// Body wrapping an event's ticket types.
#[derive(Debug, Serialize)]
pub struct TicketTypeList {
    /// The ticket types
    pub ticket_types: Vec<TicketType>,
}

/// Create a ticket type in `draft`.
///
/// # Errors
///
/// `403`, `404`, `422` for a blank name or empty sales window.
pub async fn create_ticket_type(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(event_id): AppPath<EventId>,
    AppJson(body): AppJson<CreateTicketTypeBody>,
) -> Result<(StatusCode, Json<TicketTypeBody>), AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let sales_window =
        SalesWindow::new(body.sales_start_at, body.sales_end_at).map_err(locale.error())?;
    let ticket_type = state
        .catalog
        .create_ticket_type(NewTicketType {
            event_id,
            name: body.name,
            price_cents: body.price_cents,
            quantity: body.quantity,
            sales_window,
        })
        .await
        .map_err(locale.error())?;
    Ok((StatusCode::CREATED, Json(TicketTypeBody { ticket_type })))
}

/// List an event's ticket types.
///
/// # Errors
///
/// `403`, `404`.
pub async fn list_ticket_types(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(event_id): AppPath<EventId>,
) -> Result<Json<TicketTypeList>, AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let ticket_types = state
        .catalog
        .list_ticket_types(event_id)
        .await
        .map_err(locale.error())?;
    Ok(Json(TicketTypeList { ticket_types }))
}

/// Read one ticket type.
///
/// # Errors
///
/// `403`, `404`.
pub async fn get_ticket_type(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath((event_id, id)): AppPath<(EventId, TicketTypeId)>,
) -> Result<Json<TicketTypeBody>, AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let ticket_type = state
        .catalog
        .find_ticket_type(event_id, id)
        .await
        .map_err(locale.error())?;
    Ok(Json(TicketTypeBody { ticket_type }))
}

/// Update a ticket type.
///
/// # Errors
///
/// `403`, `404`, `422` for invalid attributes or a quantity change after
/// sales began.
pub async fn update_ticket_type(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath((event_id, id)): AppPath<(EventId, TicketTypeId)>,
    AppJson(body): AppJson<UpdateTicketTypeBody>,
) -> Result<Json<TicketTypeBody>, AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let ticket_type = state
        .catalog
        .update_ticket_type(event_id, id, body.into())
        .await
        .map_err(locale.error())?;
    Ok(Json(TicketTypeBody { ticket_type }))
}

/// Delete a ticket type no lot references.
///
/// # Errors
///
/// `403`, `404`, `422` while tickets reference the type.
pub async fn delete_ticket_type(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath((event_id, id)): AppPath<(EventId, TicketTypeId)>,
) -> Result<StatusCode, AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    state
        .catalog
        .delete_ticket_type(event_id, id)
        .await
        .map_err(locale.error())?;
    Ok(StatusCode::NO_CONTENT)
}

/// Manually set a ticket type's status.
///
/// # Errors
///
/// `403`, `404`, `422` for an unknown status, `503` on lock timeout.
pub async fn override_status(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath((event_id, id)): AppPath<(EventId, TicketTypeId)>,
    AppJson(body): AppJson<StatusOverrideBody>,
) -> Result<Json<TicketTypeBody>, AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let ticket_type = state
        .catalog
        .override_status(event_id, id, body.status)
        .await
        .map_err(locale.error())?;
    Ok(Json(TicketTypeBody { ticket_type }))
}
