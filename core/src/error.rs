//! Error taxonomy for the inventory domain.
//!
//! Every failure the engine can report is a classified [`InventoryError`]. Raw
//! driver errors never cross this boundary: stores translate them into
//! [`InventoryError::Timeout`], [`InventoryError::Conflict`],
//! [`InventoryError::Unavailable`] or [`InventoryError::Database`].
//!
//! Buyer-facing text comes from [`InventoryError::user_message`], which renders
//! a localized message. Internal classes collapse to a generic "please retry".

use std::fmt;
use thiserror::Error;

/// Kind of record referenced by [`InventoryError::NotFound`] and [`InventoryError::InUse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// An event
    Event,
    /// A ticket type (SKU)
    TicketType,
    /// An issued ticket lot
    Ticket,
    /// A reservation
    Reservation,
}

impl Resource {
    /// English resource name used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::TicketType => "Ticket type",
            Self::Ticket => "Ticket",
            Self::Reservation => "Reservation",
        }
    }

    const fn as_ja(self) -> &'static str {
        match self {
            Self::Event => "イベント",
            Self::TicketType => "チケット種別",
            Self::Ticket => "チケット",
            Self::Reservation => "予約",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language used for buyer-facing messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Japanese
    Ja,
}

impl Locale {
    /// Pick a locale from an `Accept-Language` header value.
    ///
    /// The first supported language tag wins; quality weights are ignored.
    ///
    /// ```
    /// use boxoffice_core::Locale;
    ///
    /// assert_eq!(Locale::from_accept_language("ja-JP,ja;q=0.9,en;q=0.8"), Locale::Ja);
    /// assert_eq!(Locale::from_accept_language("fr-FR"), Locale::En);
    /// ```
    #[must_use]
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|tag| tag.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| match tag.split('-').next() {
                Some("ja") => Some(Self::Ja),
                Some("en") => Some(Self::En),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Errors that can occur in inventory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The referenced record does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record
        resource: Resource,
        /// Identifier that was looked up
        id: String,
    },

    /// Fewer than one ticket was requested.
    #[error("Invalid quantity {requested}: at least one ticket must be requested")]
    InvalidQuantity {
        /// The quantity the caller asked for
        requested: i64,
    },

    /// More tickets were requested than remain in stock.
    #[error("Insufficient stock: requested {requested}, {remaining} remaining")]
    InsufficientStock {
        /// The quantity the caller asked for
        requested: i64,
        /// Stock remaining when the request was evaluated under lock
        remaining: u32,
    },

    /// The payment method is not one of the supported methods.
    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// A concurrent writer won, or the record already left the required state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A row lock could not be acquired within the configured budget.
    #[error("Timed out waiting for lock on {0}")]
    Timeout(String),

    /// An entity-level invariant would be violated.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A record cannot be deleted while other records reference it.
    #[error("{resource} {id} is still referenced by {references} ticket(s)")]
    InUse {
        /// Kind of record
        resource: Resource,
        /// Identifier of the record
        id: String,
        /// Number of referencing rows
        references: u64,
    },

    /// The database could not be reached. Safe to retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Unexpected storage failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl InventoryError {
    /// Shorthand for [`InventoryError::NotFound`].
    #[must_use]
    pub fn not_found(resource: Resource, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`InventoryError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the engine may transparently retry the operation.
    ///
    /// Only connectivity failures qualify. Conflicts and lock timeouts are
    /// surfaced to the caller, who decides whether to retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Whether this error describes a problem with the caller's request rather
    /// than with the system.
    #[must_use]
    pub const fn is_domain_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidQuantity { .. }
                | Self::InsufficientStock { .. }
                | Self::InvalidPaymentMethod(_)
                | Self::Validation(_)
                | Self::InUse { .. }
        )
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidPaymentMethod(_) => "INVALID_PAYMENT_METHOD",
            Self::Conflict(_) => "CONFLICT",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InUse { .. } => "IN_USE",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Database(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Human-readable message for buyers and organizers.
    ///
    /// Internal failures never expose their details.
    ///
    /// ```
    /// use boxoffice_core::{InventoryError, Locale};
    ///
    /// let err = InventoryError::InsufficientStock { requested: 4, remaining: 2 };
    /// assert_eq!(err.user_message(Locale::En), "Not enough tickets left: only 2 remaining.");
    /// assert_eq!(err.user_message(Locale::Ja), "チケットの在庫が不足しています（残り2枚）。");
    /// ```
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::NotFound { resource, .. }, Locale::En) => format!("{resource} not found."),
            (Self::NotFound { resource, .. }, Locale::Ja) => {
                format!("{}が見つかりません。", resource.as_ja())
            },
            (Self::InvalidQuantity { .. }, Locale::En) => {
                "Please choose at least one ticket.".to_string()
            },
            (Self::InvalidQuantity { .. }, Locale::Ja) => {
                "購入枚数は1枚以上を指定してください。".to_string()
            },
            (Self::InsufficientStock { remaining, .. }, Locale::En) => {
                format!("Not enough tickets left: only {remaining} remaining.")
            },
            (Self::InsufficientStock { remaining, .. }, Locale::Ja) => {
                format!("チケットの在庫が不足しています（残り{remaining}枚）。")
            },
            (Self::InvalidPaymentMethod(method), Locale::En) => {
                format!("Unsupported payment method: {method}.")
            },
            (Self::InvalidPaymentMethod(method), Locale::Ja) => {
                format!("ご利用いただけない支払い方法です: {method}")
            },
            (Self::Validation(message), Locale::En) => message.clone(),
            (Self::Validation(message), Locale::Ja) => {
                format!("入力内容に誤りがあります: {message}")
            },
            (Self::InUse { references, .. }, Locale::En) => format!(
                "This ticket type cannot be deleted while {references} ticket(s) still reference it."
            ),
            (Self::InUse { .. }, Locale::Ja) => {
                "発行済みのチケットがあるため削除できません。".to_string()
            },
            (
                Self::Conflict(_) | Self::Timeout(_) | Self::Unavailable(_) | Self::Database(_),
                Locale::En,
            ) => "The service is busy right now. Please retry in a moment.".to_string(),
            (
                Self::Conflict(_) | Self::Timeout(_) | Self::Unavailable(_) | Self::Database(_),
                Locale::Ja,
            ) => "ただいま混み合っております。しばらくしてから再度お試しください。".to_string(),
        }
    }
}
