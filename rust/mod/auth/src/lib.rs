//! Session store: who is logged in, persisted across restarts.
//!
//! [`SessionCell`] holds the live token and user, writes them through to
//! durable storage and publishes [`AuthState`] at `auth/state`. It is also
//! the [`compta_client::TokenSource`] of the shared HTTP client, which is how
//! a 401 anywhere in the app signs the user out.
//!
//! [`SessionStore`] adds the backend round-trips: login, restore at
//! startup, logout.

pub mod cell;
pub mod error;
pub mod model;
pub mod store;

pub use cell::SessionCell;
pub use error::AuthError;
pub use model::{AuthPhase, AuthState, Session};
pub use store::{RestoreOutcome, SessionStore};
