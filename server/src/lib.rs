//! Boxoffice server wiring.
//!
//! The binary in `main.rs` loads [`config::Config`], connects the Postgres
//! store, and runs the HTTP surface, the lifecycle scheduler and the metrics
//! listener until a shutdown signal arrives.

pub mod collaborators;
pub mod config;

pub use collaborators::{EnvPrincipalProvider, SandboxPaymentGateway};
pub use config::{Config, ConfigError};
