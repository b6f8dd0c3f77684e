//! Events: the scheduled occasions that own ticket types and lots.

use crate::error::InventoryError;
use crate::ids::{EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled event.
///
/// Invariants: `end_at > start_at`, and the sum of issued ticket quantities never
/// exceeds `capacity` (enforced by the store when lots are issued).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Organizer who owns the event
    pub organizer_id: UserId,
    /// Display name
    pub name: String,
    /// Maximum attendees
    pub capacity: u32,
    /// Start of the event (inclusive)
    pub start_at: DateTime<Utc>,
    /// End of the event (exclusive)
    pub end_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Attributes for a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Organizer who will own the event
    pub organizer_id: UserId,
    /// Display name
    pub name: String,
    /// Maximum attendees
    pub capacity: u32,
    /// Start of the event
    pub start_at: DateTime<Utc>,
    /// End of the event
    pub end_at: DateTime<Utc>,
}

impl NewEvent {
    /// Check entity-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Validation`] if the name is blank or the
    /// window is empty.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::validation("Event name must not be blank"));
        }
        if self.end_at <= self.start_at {
            return Err(InventoryError::validation("Event end_at must be after start_at"));
        }
        Ok(())
    }

    /// Materialize the event with a fresh ID.
    #[must_use]
    pub fn into_event(self, id: EventId, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            organizer_id: self.organizer_id,
            name: self.name,
            capacity: self.capacity,
            start_at: self.start_at,
            end_at: self.end_at,
            created_at,
        }
    }
}
