//! Event and ticket lot endpoints.

use super::managed_event;
use crate::error::AppError;
use crate::extractors::{AppJson, AppPath, AppQuery, Authenticated, RequestLocale};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::store::DEFAULT_PER_PAGE;
use boxoffice_core::{
    DateTime, Event, EventId, Money, NewEvent, NewTicket, PageRequest, Ticket, TicketTypeId, Utc,
};
use serde::{Deserialize, Serialize};

/// `POST /events` body. The caller becomes the organizer.
#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
    /// Display name
    pub name: String,
    /// Maximum number of tickets across all lots
    pub capacity: u32,
    /// Event start
    pub start_at: DateTime<Utc>,
    /// Event end
    pub end_at: DateTime<Utc>,
}

/// Body wrapping an event.
#[derive(Debug, Serialize)]
pub struct EventBody {
    /// The event
    pub event: Event,
}

/// Create an event owned by the caller.
///
/// # Errors
///
/// `401`, or `422` if `end_at <= start_at` or the name is blank.
pub async fn create_event(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppJson(body): AppJson<CreateEventBody>,
) -> Result<(StatusCode, Json<EventBody>), AppError> {
    let event = state
        .catalog
        .create_event(NewEvent {
            organizer_id: principal.user_id,
            name: body.name,
            capacity: body.capacity,
            start_at: body.start_at,
            end_at: body.end_at,
        })
        .await
        .map_err(locale.error())?;
    Ok((StatusCode::CREATED, Json(EventBody { event })))
}

/// Pagination query for ticket listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page, default 1
    pub page: Option<u32>,
    /// Page size, default 20, at most 100
    pub per_page: Option<u32>,
}

/// A page of available lots.
#[derive(Debug, Serialize)]
pub struct TicketPage {
    /// Lots with stock left
    pub tickets: Vec<Ticket>,
    /// Page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Total matching lots
    pub total: u64,
}

/// List an event's lots that still have stock.
///
/// # Errors
///
/// `404` if the event is missing, `422` for out-of-range pagination.
pub async fn list_available_tickets(
    State(state): State<AppState>,
    locale: RequestLocale,
    AppPath(event_id): AppPath<EventId>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<TicketPage>, AppError> {
    let request = PageRequest::new(
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    )
    .map_err(locale.error())?;
    let page = state
        .catalog
        .available_tickets(event_id, request)
        .await
        .map_err(locale.error())?;
    Ok(Json(TicketPage {
        tickets: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// `POST /events/:event_id/tickets` body.
#[derive(Debug, Deserialize)]
pub struct IssueTicketBody {
    /// Ticket type to issue under; omitted for an event-level lot
    #[serde(default)]
    pub ticket_type_id: Option<TicketTypeId>,
    /// Display title
    pub title: String,
    /// Unit price in minor units
    pub price: Money,
    /// Lot size
    pub quantity: u32,
}

/// Body wrapping a ticket lot.
#[derive(Debug, Serialize)]
pub struct TicketBody {
    /// The lot
    pub ticket: Ticket,
}

/// Issue a ticket lot for an event the caller manages.
///
/// # Errors
///
/// `403`, `404`, or `422` when the lot would exceed event capacity or the
/// ticket type allotment.
pub async fn issue_ticket(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    locale: RequestLocale,
    AppPath(event_id): AppPath<EventId>,
    AppJson(body): AppJson<IssueTicketBody>,
) -> Result<(StatusCode, Json<TicketBody>), AppError> {
    managed_event(&state, &principal, event_id, locale).await?;
    let ticket = state
        .catalog
        .issue_ticket(NewTicket {
            event_id,
            ticket_type_id: body.ticket_type_id,
            title: body.title,
            price: body.price,
            quantity: body.quantity,
        })
        .await
        .map_err(locale.error())?;
    Ok((StatusCode::CREATED, Json(TicketBody { ticket })))
}
