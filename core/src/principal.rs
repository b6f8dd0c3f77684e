//! Caller identity.
//!
//! Tokens are issued elsewhere. This crate only needs "who is calling" and
//! "may they manage this event".

use crate::event::Event;
use crate::ids::UserId;
use std::future::Future;
use std::pin::Pin;

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Caller's user ID
    pub user_id: UserId,
    /// Administrators may manage every event
    pub admin: bool,
}

impl Principal {
    /// A regular (non-admin) user.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    /// Whether the caller owns `event` or is an administrator.
    #[must_use]
    pub fn can_manage(&self, event: &Event) -> bool {
        self.admin || event.organizer_id == self.user_id
    }
}

/// Resolves bearer tokens to principals.
pub trait PrincipalProvider: Send + Sync {
    /// Authenticate `token`. `None` means the token is unknown or expired.
    fn authenticate<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Principal>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EventId;
    use chrono::{Duration, Utc};

    #[test]
    fn only_owner_or_admin_can_manage() {
        let owner = UserId::new();
        let now = Utc::now();
        let event = Event {
            id: EventId::new(),
            organizer_id: owner,
            name: "Jazz Night".to_string(),
            capacity: 50,
            start_at: now,
            end_at: now + Duration::hours(2),
            created_at: now,
        };

        assert!(Principal::user(owner).can_manage(&event));
        assert!(!Principal::user(UserId::new()).can_manage(&event));
        assert!(
            Principal {
                user_id: UserId::new(),
                admin: true
            }
            .can_manage(&event)
        );
    }
}
