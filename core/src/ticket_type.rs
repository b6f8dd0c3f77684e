//! Ticket types (SKUs) and their sale-status state machine.
//!
//! # State Machine
//!
//! ```text
//!            now ≥ sales_start_at
//!   Draft ───────────────────────▶ OnSale ──── now > sales_end_at ────▶ Closed
//!                                    │
//!                                    └──── remaining_quantity ≤ 0 ───▶ SoldOut
//! ```
//!
//! `Closed` wins over `SoldOut` when both predicates hold. `SoldOut` and `Closed`
//! are terminal for automatic transitions.
//!
//! [`TicketTypeStatus::evaluate`] is the single source of these rules. The
//! Postgres store expresses the same predicates as bulk conditional updates.

use crate::error::InventoryError;
use crate::ids::{EventId, TicketTypeId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sale status of a ticket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketTypeStatus {
    /// Not yet on sale
    Draft,
    /// Accepting reservations
    OnSale,
    /// All allotted tickets have been issued
    #[serde(rename = "soldout")]
    SoldOut,
    /// The sales window has ended
    Closed,
}

impl TicketTypeStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Draft, Self::OnSale, Self::SoldOut, Self::Closed];

    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::OnSale => "on_sale",
            Self::SoldOut => "soldout",
            Self::Closed => "closed",
        }
    }

    /// Parse status from database string.
    ///
    /// # Errors
    ///
    /// Returns error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, InventoryError> {
        match s {
            "draft" => Ok(Self::Draft),
            "on_sale" => Ok(Self::OnSale),
            "soldout" => Ok(Self::SoldOut),
            "closed" => Ok(Self::Closed),
            _ => Err(InventoryError::validation(format!(
                "Invalid ticket type status: {s}"
            ))),
        }
    }

    /// Whether automatic transitions may still move this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::SoldOut | Self::Closed)
    }

    /// Derive the status a scheduler run would assign.
    ///
    /// Returns `None` when no transition applies. Applying the result and
    /// evaluating again with the same inputs always yields `None`.
    #[must_use]
    pub fn evaluate(
        self,
        now: DateTime<Utc>,
        window: &SalesWindow,
        remaining_quantity: i64,
    ) -> Option<Self> {
        let mut status = self;

        if status == Self::Draft && now >= window.starts_at() {
            status = Self::OnSale;
        }

        if status == Self::OnSale {
            if now > window.ends_at() {
                status = Self::Closed;
            } else if remaining_quantity <= 0 {
                status = Self::SoldOut;
            }
        }

        (status != self).then_some(status)
    }
}

impl std::fmt::Display for TicketTypeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open sales window with `end > start`.
///
/// Only constructible through [`SalesWindow::new`], so an empty window cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SalesWindow {
    /// Create a sales window.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InventoryError> {
        if end <= start {
            return Err(InventoryError::validation(
                "sales_end_at must be after sales_start_at",
            ));
        }
        Ok(Self { start, end })
    }

    /// When sales open
    #[must_use]
    pub const fn starts_at(&self) -> DateTime<Utc> {
        self.start
    }

    /// When sales close
    #[must_use]
    pub const fn ends_at(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A sellable SKU of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketType {
    /// Ticket type ID
    pub id: TicketTypeId,
    /// Owning event
    pub event_id: EventId,
    /// Display name (e.g. "VIP")
    pub name: String,
    /// Unit price
    pub price_cents: Money,
    /// Total allotment
    pub quantity: u32,
    /// Sum of quantities of lots issued under this type
    pub issued_quantity: u32,
    /// Sales window
    pub sales_window: SalesWindow,
    /// Current sale status
    pub status: TicketTypeStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    /// `quantity − Σ issued lot quantities`. Negative if over-issued.
    #[must_use]
    pub fn remaining_quantity(&self) -> i64 {
        i64::from(self.quantity) - i64::from(self.issued_quantity)
    }

    /// The status a scheduler run at `now` would assign, if any.
    #[must_use]
    pub fn next_status(&self, now: DateTime<Utc>) -> Option<TicketTypeStatus> {
        self.status
            .evaluate(now, &self.sales_window, self.remaining_quantity())
    }
}

/// Attributes for a new ticket type. New types always start as [`TicketTypeStatus::Draft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketType {
    /// Owning event
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price_cents: Money,
    /// Total allotment
    pub quantity: u32,
    /// Sales window
    pub sales_window: SalesWindow,
}

impl NewTicketType {
    /// Check entity-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if the name is blank.
    pub fn validate(&self) -> Result<(), InventoryError> {
        validate_name(&self.name)
    }

    /// Materialize the ticket type with a fresh ID.
    #[must_use]
    pub fn into_ticket_type(self, id: TicketTypeId, now: DateTime<Utc>) -> TicketType {
        TicketType {
            id,
            event_id: self.event_id,
            name: self.name,
            price_cents: self.price_cents,
            quantity: self.quantity,
            issued_quantity: 0,
            sales_window: self.sales_window,
            status: TicketTypeStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a ticket type. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketTypeChanges {
    /// New display name
    pub name: Option<String>,
    /// New unit price
    pub price_cents: Option<Money>,
    /// New allotment (only while `draft`)
    pub quantity: Option<u32>,
    /// New sales start
    pub sales_start_at: Option<DateTime<Utc>>,
    /// New sales end
    pub sales_end_at: Option<DateTime<Utc>>,
}

impl TicketTypeChanges {
    /// Apply the changes to `ticket_type`, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if the resulting window is empty,
    /// the name is blank, or the allotment changes after the type left `draft`.
    pub fn apply(&self, ticket_type: &mut TicketType, now: DateTime<Utc>) -> Result<(), InventoryError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
            ticket_type.name.clone_from(name);
        }
        if let Some(price) = self.price_cents {
            ticket_type.price_cents = price;
        }
        if let Some(quantity) = self.quantity {
            if quantity != ticket_type.quantity && ticket_type.status != TicketTypeStatus::Draft {
                return Err(InventoryError::validation(
                    "quantity cannot change once sales have begun",
                ));
            }
            if quantity < ticket_type.issued_quantity {
                return Err(InventoryError::validation(format!(
                    "quantity cannot be lower than the {} ticket(s) already issued",
                    ticket_type.issued_quantity
                )));
            }
            ticket_type.quantity = quantity;
        }
        if self.sales_start_at.is_some() || self.sales_end_at.is_some() {
            ticket_type.sales_window = SalesWindow::new(
                self.sales_start_at
                    .unwrap_or_else(|| ticket_type.sales_window.starts_at()),
                self.sales_end_at
                    .unwrap_or_else(|| ticket_type.sales_window.ends_at()),
            )?;
        }
        ticket_type.updated_at = now;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), InventoryError> {
    if name.trim().is_empty() {
        return Err(InventoryError::validation("Ticket type name must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn window(start_offset: Duration, end_offset: Duration, now: DateTime<Utc>) -> SalesWindow {
        SalesWindow::new(now + start_offset, now + end_offset).expect("valid sales window")
    }

    #[test]
    fn status_roundtrip() {
        for status in TicketTypeStatus::ALL {
            assert_eq!(TicketTypeStatus::parse(status.as_str()), Ok(status));
        }
        assert!(TicketTypeStatus::parse("archived").is_err());
    }

    #[test]
    fn window_requires_end_after_start() {
        let now = Utc::now();
        assert!(SalesWindow::new(now, now).is_err());
        assert!(SalesWindow::new(now, now - Duration::seconds(1)).is_err());
        assert!(SalesWindow::new(now, now + Duration::seconds(1)).is_ok());
    }

    #[test]
    fn draft_opens_when_sales_start() {
        let now = Utc::now();
        let w = window(-Duration::hours(1), Duration::days(1), now);
        assert_eq!(
            TicketTypeStatus::Draft.evaluate(now, &w, 10),
            Some(TicketTypeStatus::OnSale)
        );

        let future = window(Duration::hours(1), Duration::days(1), now);
        assert_eq!(TicketTypeStatus::Draft.evaluate(now, &future, 10), None);
    }

    #[test]
    fn draft_opens_exactly_at_start() {
        let now = Utc::now();
        let w = window(Duration::zero(), Duration::days(1), now);
        assert_eq!(
            TicketTypeStatus::Draft.evaluate(now, &w, 10),
            Some(TicketTypeStatus::OnSale)
        );
    }

    #[test]
    fn closed_takes_priority_over_soldout() {
        let now = Utc::now();
        let w = window(-Duration::days(30), -Duration::hours(1), now);
        assert_eq!(
            TicketTypeStatus::OnSale.evaluate(now, &w, 0),
            Some(TicketTypeStatus::Closed)
        );
        assert_eq!(
            TicketTypeStatus::OnSale.evaluate(now, &w, 5),
            Some(TicketTypeStatus::Closed)
        );
    }

    #[test]
    fn on_sale_sells_out_when_stock_exhausted() {
        let now = Utc::now();
        let w = window(-Duration::days(1), Duration::days(1), now);
        assert_eq!(
            TicketTypeStatus::OnSale.evaluate(now, &w, 0),
            Some(TicketTypeStatus::SoldOut)
        );
        assert_eq!(
            TicketTypeStatus::OnSale.evaluate(now, &w, -3),
            Some(TicketTypeStatus::SoldOut)
        );
        assert_eq!(TicketTypeStatus::OnSale.evaluate(now, &w, 1), None);
    }

    #[test]
    fn end_boundary_is_exclusive_for_closing() {
        let now = Utc::now();
        let w = window(-Duration::days(1), Duration::zero(), now);
        assert_eq!(TicketTypeStatus::OnSale.evaluate(now, &w, 3), None);
    }

    #[test]
    fn terminal_statuses_never_move() {
        let now = Utc::now();
        let w = window(-Duration::days(2), -Duration::days(1), now);
        assert_eq!(TicketTypeStatus::SoldOut.evaluate(now, &w, 0), None);
        assert_eq!(TicketTypeStatus::Closed.evaluate(now, &w, 10), None);
    }

    #[test]
    fn quantity_is_frozen_after_draft() {
        let now = Utc::now();
        let mut ticket_type = NewTicketType {
            event_id: EventId::new(),
            name: "VIP".to_string(),
            price_cents: Money::from_minor_units(12_000),
            quantity: 10,
            sales_window: window(-Duration::hours(1), Duration::days(1), now),
        }
        .into_ticket_type(TicketTypeId::new(), now);
        ticket_type.status = TicketTypeStatus::OnSale;

        let changes = TicketTypeChanges {
            quantity: Some(20),
            ..TicketTypeChanges::default()
        };
        assert!(matches!(
            changes.apply(&mut ticket_type, now),
            Err(InventoryError::Validation(_))
        ));

        let rename = TicketTypeChanges {
            name: Some("Premium".to_string()),
            ..TicketTypeChanges::default()
        };
        assert!(rename.apply(&mut ticket_type, now).is_ok());
        assert_eq!(ticket_type.name, "Premium");
    }

    #[test]
    fn window_change_is_revalidated() {
        let now = Utc::now();
        let mut ticket_type = NewTicketType {
            event_id: EventId::new(),
            name: "General".to_string(),
            price_cents: Money::from_minor_units(5_000),
            quantity: 10,
            sales_window: window(Duration::hours(1), Duration::days(1), now),
        }
        .into_ticket_type(TicketTypeId::new(), now);

        let changes = TicketTypeChanges {
            sales_end_at: Some(now),
            ..TicketTypeChanges::default()
        };
        assert!(changes.apply(&mut ticket_type, now).is_err());
    }

    fn any_status() -> impl Strategy<Value = TicketTypeStatus> {
        prop_oneof![
            Just(TicketTypeStatus::Draft),
            Just(TicketTypeStatus::OnSale),
            Just(TicketTypeStatus::SoldOut),
            Just(TicketTypeStatus::Closed),
        ]
    }

    proptest! {
        #[test]
        fn evaluation_is_idempotent(
            status in any_status(),
            start_mins in -10_000i64..10_000,
            len_mins in 1i64..10_000,
            remaining in -5i64..50,
        ) {
            let now = Utc::now();
            let w = window(
                Duration::minutes(start_mins),
                Duration::minutes(start_mins + len_mins),
                now,
            );
            let once = status.evaluate(now, &w, remaining).unwrap_or(status);
            prop_assert_eq!(once.evaluate(now, &w, remaining), None);
        }
    }
}
