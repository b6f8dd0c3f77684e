//! # Boxoffice Core
//!
//! Domain types, invariants and collaborator traits for the boxoffice ticket
//! inventory engine.
//!
//! This crate has no I/O. It describes *what* the inventory looks like and which
//! state changes are legal; the `boxoffice-postgres` and `boxoffice-testing`
//! crates decide *how* those changes are persisted.
//!
//! ## Core Concepts
//!
//! - **Event**: a scheduled occasion with a capacity and a time window
//! - **Ticket type**: a priced SKU whose sale status evolves with time and stock
//! - **Ticket (lot)**: an issued batch of a ticket type with its own stock counter
//! - **Reservation**: a buyer's claim on a lot, pending payment settlement
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: every status transition is a pure function
//!   on closed enums ([`TicketTypeStatus::evaluate`], [`ReservationStatus::settle`])
//! - The database transaction is the coordination primitive; no in-process locks
//!   guard inventory
//! - Dependency injection via traits ([`InventoryStore`], [`Clock`],
//!   [`PaymentGateway`], [`PrincipalProvider`])
//!
//! ## Example
//!
//! ```
//! use boxoffice_core::{SalesWindow, TicketTypeStatus};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let window = SalesWindow::new(now - Duration::hours(1), now + Duration::days(1))?;
//!
//! // A draft whose sales window has opened goes on sale.
//! assert_eq!(
//!     TicketTypeStatus::Draft.evaluate(now, &window, 10),
//!     Some(TicketTypeStatus::OnSale)
//! );
//! # Ok::<(), boxoffice_core::InventoryError>(())
//! ```

pub mod environment;
pub mod error;
pub mod event;
pub mod ids;
pub mod money;
pub mod payment;
pub mod principal;
pub mod reservation;
pub mod store;
pub mod ticket;
pub mod ticket_type;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub use environment::{Clock, SystemClock};
pub use error::{InventoryError, Locale, Resource};
pub use event::{Event, NewEvent};
pub use ids::{EventId, ReservationId, TicketId, TicketTypeId, UserId};
pub use money::Money;
pub use payment::{GatewayResult, PaymentGateway, PaymentGatewayError, PaymentReceipt};
pub use principal::{Principal, PrincipalProvider};
pub use reservation::{
    PaymentMethod, Reservation, ReservationDraft, ReservationRequest, ReservationStatus,
    Settlement, payment_claim_active, prepare_reservation,
};
pub use store::{InventoryStore, LifecycleReport, LifecycleTransition, Page, PageRequest, StoreFuture};
pub use ticket::{NewTicket, Ticket};
pub use ticket_type::{NewTicketType, SalesWindow, TicketType, TicketTypeChanges, TicketTypeStatus};

/// Result alias used throughout the inventory domain.
pub type Result<T> = std::result::Result<T, InventoryError>;
