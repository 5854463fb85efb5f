//! ComptaOHADA HTTP client.
//!
//! Every page talks to the backend through one shared [`ApiClient`]. It
//! attaches the session's bearer token to outgoing requests and, when the
//! backend answers 401, tells the [`TokenSource`] so the session can be torn
//! down before the error reaches the caller.
//!
//! # Usage
//!
//! ```ignore
//! use compta_client::{ApiClient, StaticToken};
//!
//! let client = ApiClient::new("http://localhost:5001", Arc::new(StaticToken::new("T1")));
//! let kpi: Kpi = client.get("/api/v1/dashboard/kpi").await?;
//! ```

mod client;
mod envelope;
mod error;
mod token;


pub use client::ApiClient;
pub use envelope::Envelope;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use token::{NoAuth, StaticToken, TokenSource};
