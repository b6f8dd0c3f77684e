//! Router assembly.

use crate::handlers::{events, health, reservations, ticket_types};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full HTTP surface.
///
/// # Routes
///
/// - `GET /health`, `GET /health/ready`
/// - `POST /ticket_reservations`
/// - `GET /ticket_reservations/:id`
/// - `POST /ticket_reservations/:id/payment`
/// - `POST /ticket_reservations/:id/cancel`
/// - `POST /events`
/// - `GET|POST /events/:event_id/tickets`
/// - `GET|POST /events/:event_id/ticket_types`
/// - `GET|PUT|DELETE /events/:event_id/ticket_types/:id`
/// - `PUT /events/:event_id/ticket_types/:id/status`
///
/// # Example
///
/// ```rust,ignore
/// let app = build_router(AppState::new(store, clock, gateway, principals, config, base_url));
/// axum::serve(listener, app).await?;
/// ```
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/ticket_reservations", post(reservations::create_reservation))
        .route("/ticket_reservations/:id", get(reservations::get_reservation))
        .route(
            "/ticket_reservations/:id/payment",
            post(reservations::pay_reservation),
        )
        .route(
            "/ticket_reservations/:id/cancel",
            post(reservations::cancel_reservation),
        )
        .route("/events", post(events::create_event))
        .route(
            "/events/:event_id/tickets",
            get(events::list_available_tickets).post(events::issue_ticket),
        )
        .route(
            "/events/:event_id/ticket_types",
            get(ticket_types::list_ticket_types).post(ticket_types::create_ticket_type),
        )
        .route(
            "/events/:event_id/ticket_types/:id",
            get(ticket_types::get_ticket_type)
                .put(ticket_types::update_ticket_type)
                .delete(ticket_types::delete_ticket_type),
        )
        .route(
            "/events/:event_id/ticket_types/:id/status",
            put(ticket_types::override_status),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(correlation_id_layer())
}
