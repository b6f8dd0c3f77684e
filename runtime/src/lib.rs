//! # Boxoffice Runtime
//!
//! The imperative shell around `boxoffice-core`: services that read the clock,
//! call the store, retry, log and record metrics.
//!
//! ## Core Components
//!
//! - **Reservation engine**: creates reservations under a bounded lock wait and
//!   a bounded connectivity retry, and settles or cancels them
//! - **Payment service**: charges the gateway, then settles
//! - **Catalog service**: events, ticket types and ticket lot issuance
//! - **Lifecycle scheduler**: periodic, batched, best-effort status updates
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_runtime::{EngineConfig, ReservationEngine};
//!
//! let engine = ReservationEngine::new(store, clock, EngineConfig::default());
//! let reservation = engine.create_reservation(request).await?;
//! ```

/// Event, ticket type and lot management
pub mod catalog;

/// Reservation creation and settlement
pub mod engine;

/// Prometheus metrics for observability
pub mod metrics;

/// Payment capture
pub mod payment;

/// Bounded retry with exponential backoff
pub mod retry;

/// Periodic ticket type status updates
pub mod scheduler;

pub use catalog::CatalogService;
pub use engine::{EngineConfig, ReservationEngine};
pub use payment::{PaymentError, PaymentService};
pub use retry::RetryPolicy;
pub use scheduler::{LifecycleScheduler, SchedulerConfig};
