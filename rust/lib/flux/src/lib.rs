//! Flux: observable client state.
//!
//! A flat, path-addressed state store with pub/sub. The session store and
//! the notification queue publish into it; views subscribe and re-render.
//!
//! # Paths
//!
//! - `auth/state`: who is logged in
//! - `app/route`: the route the shell should display
//! - `notify/list`: the visible notifications, in display order
//!
//! # Patterns
//!
//! Subscriptions use MQTT-style wildcards:
//! - Exact: `auth/state`
//! - Single-level: `auth/+` matches `auth/state`, not `auth/a/b`
//! - Multi-level: `notify/#` matches everything under `notify/`
//! - All: `#`
//!
//! # Example
//!
//! ```ignore
//! let store = StateStore::new();
//! store.subscribe("auth/#", |path, value| {
//!     println!("{} changed", path);
//! });
//! store.set("auth/state", AuthState::signed_out());
//! ```

pub mod pattern;
pub mod store;
pub mod value;

pub use store::{ChangeHandler, StateStore};
pub use value::{StateValue, SubscriptionId};
