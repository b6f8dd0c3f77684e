//! `PostgreSQL` inventory store for boxoffice.
//!
//! Implements [`boxoffice_core::InventoryStore`] with sqlx. Stock is protected
//! by pessimistic row locks bounded by `SET LOCAL lock_timeout`; the
//! lifecycle scheduler's writes are bulk conditional updates that skip locked
//! rows.
//!
//! Driver errors are classified before they leave the crate:
//!
//! | `SQLSTATE` / driver error | [`boxoffice_core::InventoryError`] |
//! |---|---|
//! | `55P03` lock not available | `Timeout` |
//! | `40001`, `40P01`, `23505` | `Conflict` |
//! | I/O, pool exhaustion, `08xxx` | `Unavailable` |
//! | anything else | `Database` |
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_postgres::{PoolConfig, PostgresInventoryStore};
//!
//! let store = PostgresInventoryStore::connect(&database_url, PoolConfig::default()).await?;
//! store.migrate().await?;
//! ```

#![forbid(unsafe_code)]

mod error;
mod lifecycle;
mod rows;
mod store;

pub use store::{PoolConfig, PostgresInventoryStore};
