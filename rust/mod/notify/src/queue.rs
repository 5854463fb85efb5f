use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use compta_flux::StateStore;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::model::{next_id, stack_offset, Notification, NotificationList, Placed, Severity};

/// Shared notification list. Clones are handles to the same queue.
///
/// Timed entries are removed by a Tokio task each; dismissing or clearing
/// aborts it. The list is published with no lock held, so state-store
/// subscribers may call back into the queue.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<Inner>,
}

struct Inner {
    entries: Mutex<Vec<Entry>>,
    /// Bumped under the entries lock on every change.
    seq: AtomicU64,
    state: Option<Arc<StateStore>>,
    closed: AtomicBool,
}

struct Entry {
    notification: Notification,
    timer: Option<AbortHandle>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Publish every change of the list at `notify/list`.
    pub fn with_state(state: Arc<StateStore>) -> Self {
        state.set(NotificationList::PATH, NotificationList::default());
        Self::build(Some(state))
    }

    fn build(state: Option<Arc<StateStore>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                seq: AtomicU64::new(0),
                state,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Append a notification and return its id.
    ///
    /// With `duration_ms > 0` it is removed after that delay; this needs a
    /// Tokio runtime, without one the entry stays until dismissed.
    ///
    /// # Panics
    ///
    /// If the queue was shut down.
    pub fn show(&self, message: impl Into<String>, severity: Severity, duration_ms: u64) -> String {
        assert!(
            !self.inner.closed.load(Ordering::Acquire),
            "notification queue used after shutdown"
        );
        let notification = Notification {
            id: next_id(),
            message: message.into(),
            severity,
            duration_ms,
        };
        let id = notification.id.clone();
        debug!("notify {:?} {}: {}", severity, id, notification.message);

        {
            let mut entries = self.inner.entries.lock().unwrap();
            let timer = if duration_ms > 0 {
                self.schedule(&id, duration_ms)
            } else {
                None
            };
            entries.push(Entry {
                notification,
                timer,
            });
            self.inner.bump();
        }
        self.inner.publish();
        id
    }

    pub fn show_success(&self, message: impl Into<String>) -> String {
        self.show(message, Severity::Success, Severity::Success.default_duration_ms())
    }

    pub fn show_error(&self, message: impl Into<String>) -> String {
        self.show(message, Severity::Error, Severity::Error.default_duration_ms())
    }

    pub fn show_warning(&self, message: impl Into<String>) -> String {
        self.show(message, Severity::Warning, Severity::Warning.default_duration_ms())
    }

    pub fn show_info(&self, message: impl Into<String>) -> String {
        self.show(message, Severity::Info, Severity::Info.default_duration_ms())
    }

    /// Remove one entry now. Returns false if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        {
            let mut entries = self.inner.entries.lock().unwrap();
            let Some(pos) = entries.iter().position(|e| e.notification.id == id) else {
                return false;
            };
            let entry = entries.remove(pos);
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            self.inner.bump();
        }
        self.inner.publish();
        true
    }

    /// Remove everything and cancel every pending timer.
    pub fn clear(&self) {
        {
            let mut entries = self.inner.entries.lock().unwrap();
            for entry in entries.drain(..) {
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
            }
            self.inner.bump();
        }
        self.inner.publish();
    }

    /// Snapshot in insertion order.
    pub fn list(&self) -> Vec<Notification> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.notification.clone())
            .collect()
    }

    /// Snapshot with the vertical offset of each entry.
    pub fn stacked(&self) -> Vec<Placed> {
        self.list()
            .into_iter()
            .enumerate()
            .map(|(i, notification)| Placed {
                notification,
                offset_px: stack_offset(i),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel all timers and empty the queue. Later `show` calls panic.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn schedule(&self, id: &str, duration_ms: u64) -> Option<AbortHandle> {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime, notification {} will not expire", id);
            return None;
        };
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let id = id.to_string();
        let task = handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(&id);
            }
        });
        Some(task.abort_handle())
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn expire(&self, id: &str) {
        {
            let mut entries = self.entries.lock().unwrap();
            let Some(pos) = entries.iter().position(|e| e.notification.id == id) else {
                return;
            };
            entries.remove(pos);
            self.bump();
        }
        debug!("notification {} expired", id);
        self.publish();
    }

    /// Caller holds the entries lock.
    fn bump(&self) {
        self.seq.fetch_add(1, Ordering::AcqRel);
    }

    /// Publish the current list with no lock held. A change that lands in
    /// between may have been overwritten by this older snapshot, so publish
    /// again until the sequence is stable.
    fn publish(&self) {
        let Some(state) = &self.state else { return };
        loop {
            let (list, seq) = {
                let entries = self.entries.lock().unwrap();
                let list: Vec<Notification> =
                    entries.iter().map(|e| e.notification.clone()).collect();
                (list, self.seq.load(Ordering::Acquire))
            };
            state.set(NotificationList::PATH, NotificationList(list));
            if self.seq.load(Ordering::Acquire) == seq {
                break;
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(entries) = self.entries.get_mut() {
            for timer in entries.iter().filter_map(|e| e.timer.as_ref()) {
                timer.abort();
            }
        }
    }
}
