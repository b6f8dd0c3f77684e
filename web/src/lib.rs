//! Axum HTTP surface for the boxoffice inventory engine.
//!
//! Handlers are a thin imperative shell: they authenticate the caller, check
//! event or reservation ownership, translate JSON into domain requests, call
//! a runtime service and map the result to a status code.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, bearer tokens
//! │  - Request parsing                      │  ← Correlation ids, CORS
//! │  - Ownership checks                     │  ← Localized errors
//! ├─────────────────────────────────────────┤
//! │         boxoffice-runtime               │
//! │  - Reservation engine, payments         │  ← Lock budget, retry
//! │  - Catalog, lifecycle                   │
//! ├─────────────────────────────────────────┤
//! │         boxoffice-core                  │
//! │  - Pure validation and transitions      │  ← No I/O
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Error mapping
//!
//! | Error | Status |
//! |---|---|
//! | `NotFound` | 404 |
//! | `InvalidQuantity`, `InsufficientStock`, `InvalidPaymentMethod`, `Validation`, `InUse` | 422 |
//! | `Conflict` | 409 |
//! | `Timeout` | 503 + `Retry-After` |
//! | `Unavailable` | 503 |
//! | `Database` | 500 |
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_web::{AppState, build_router};
//!
//! let state = AppState::new(store, clock, gateway, principals, engine_config, &payment_base_url);
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, build_router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{Authenticated, BearerToken, CorrelationId, RequestLocale};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;
