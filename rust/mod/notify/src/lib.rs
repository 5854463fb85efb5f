//! Transient user feedback: a list of notifications that expire on their
//! own unless dismissed first.

mod model;
mod queue;

pub use model::{
    Notification, NotificationList, Placed, Severity, DEFAULT_DURATION_MS, ERROR_DURATION_MS,
};
pub use queue::NotificationQueue;
