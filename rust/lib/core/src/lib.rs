//! Shared building blocks of the ComptaOHADA client runtime.

pub mod config;
pub mod error;
pub mod route;
pub mod types;

pub use config::ClientConfig;
pub use error::ConfigError;
pub use route::{guard, AppRoute};
pub use types::User;
