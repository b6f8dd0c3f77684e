//! Strongly-typed identifiers.
//!
//! Every persisted entity is keyed by a UUID wrapped in its own newtype so that a
//! `TicketId` can never be passed where a `TicketTypeId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an event
    EventId
);
uuid_id!(
    /// Unique identifier for a ticket type (SKU)
    TicketTypeId
);
uuid_id!(
    /// Unique identifier for an issued ticket lot
    TicketId
);
uuid_id!(
    /// Unique identifier for a reservation
    ReservationId
);
uuid_id!(
    /// Unique identifier for a user (buyer or organizer)
    UserId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_uuids() {
        let uuid = Uuid::new_v4();
        let id = TicketId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn ids_display_inner_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(EventId::from(uuid).to_string(), uuid.to_string());
    }
}
