//! Composition root of the ComptaOHADA client runtime.
//!
//! One [`App`] owns the state store, the durable session storage, the
//! shared HTTP client, the session store and the notification queue, and
//! wires them together. Pages receive it (or the parts they need) instead
//! of reaching for globals.

mod app;
mod error;

pub use app::App;
pub use error::AppError;
