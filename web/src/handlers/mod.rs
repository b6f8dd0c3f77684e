//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod events;
pub mod health;
pub mod reservations;
pub mod ticket_types;

use crate::error::AppError;
use crate::extractors::RequestLocale;
use crate::state::AppState;
use boxoffice_core::{Event, EventId, Principal};

/// Load `event_id` and require that `principal` may manage it.
pub(crate) async fn managed_event(
    state: &AppState,
    principal: &Principal,
    event_id: EventId,
    locale: RequestLocale,
) -> Result<Event, AppError> {
    let event = state
        .catalog
        .find_event(event_id)
        .await
        .map_err(locale.error())?;
    if !principal.can_manage(&event) {
        tracing::info!(
            event_id = %event_id,
            user_id = %principal.user_id,
            "Caller does not manage event"
        );
        return Err(AppError::forbidden("You do not manage this event"));
    }
    Ok(event)
}
