use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lifetime of a notification unless stated otherwise.
pub const DEFAULT_DURATION_MS: u64 = 6000;

/// Errors stay up longer.
pub const ERROR_DURATION_MS: u64 = 8000;

/// Vertical layout of the stacked list, in pixels.
const STACK_TOP_PX: u32 = 20;
const STACK_STEP_PX: u32 = 70;

const ID_SUFFIX_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    pub fn default_duration_ms(self) -> u64 {
        match self {
            Severity::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    /// 0 means the notification stays until dismissed.
    pub duration_ms: u64,
}

impl Notification {
    pub fn is_sticky(&self) -> bool {
        self.duration_ms == 0
    }
}

/// Current list, published at [`NotificationList::PATH`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationList(pub Vec<Notification>);

impl NotificationList {
    pub const PATH: &'static str = "notify/list";
}

/// A notification with its position in the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub notification: Notification,
    pub offset_px: u32,
}

pub(crate) fn stack_offset(index: usize) -> u32 {
    STACK_TOP_PX + STACK_STEP_PX * index as u32
}

/// Base-36 millisecond timestamp followed by a short random suffix.
pub(crate) fn next_id() -> String {
    let mut id = to_base36(chrono::Utc::now().timestamp_millis().max(0) as u64);
    let mut rng = rand::thread_rng();
    for _ in 0..ID_SUFFIX_LEN {
        let digit = rng.gen_range(0..36u32);
        id.push(std::char::from_digit(digit, 36).unwrap_or('0'));
    }
    id
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(std::char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
        n /= 36;
    }
    digits.iter().rev().collect()
}
