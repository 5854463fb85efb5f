use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::pattern;
use crate::value::{StateValue, SubscriptionId};

/// Called with the changed path and its new value.
pub type ChangeHandler = Arc<dyn Fn(&str, &StateValue) + Send + Sync>;

/// Values keyed by path, observed through wildcard subscriptions.
///
/// Handlers run synchronously on the thread that called `set`, after the
/// new value is visible to `get`. They are invoked without any store lock
/// held, so a handler may read the store.
pub struct StateStore {
    values: RwLock<BTreeMap<String, StateValue>>,
    handlers: RwLock<Vec<HandlerEntry>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    pattern: String,
    handler: ChangeHandler,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publish `value` at `path`.
    pub fn set<T: Any + Send + Sync>(&self, path: &str, value: T) {
        self.set_value(path, StateValue::new(value));
    }

    pub fn set_value(&self, path: &str, value: StateValue) {
        self.values
            .write()
            .unwrap()
            .insert(path.to_string(), value.clone());

        // Snapshot the matching handlers so none of our locks is held while
        // user code runs.
        let matching: Vec<ChangeHandler> = self
            .handlers
            .read()
            .unwrap()
            .iter()
            .filter(|entry| pattern::matches(&entry.pattern, path))
            .map(|entry| entry.handler.clone())
            .collect();

        trace!(path, subscribers = matching.len(), "state changed");
        for handler in matching {
            handler(path, &value);
        }
    }

    /// Get the current value at `path`.
    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.values.read().unwrap().get(path).cloned()
    }

    /// Get the current value at `path` as `T`. `None` if absent or of
    /// another type.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| v.cloned::<T>())
    }

    /// Remove the value at `path`. Does NOT notify subscribers.
    pub fn remove(&self, path: &str) -> Option<StateValue> {
        self.values.write().unwrap().remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.read().unwrap().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All paths and values, ordered by path.
    pub fn snapshot(&self) -> Vec<(String, StateValue)> {
        self.values
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Subscribe to changes of every path matching `pattern`.
    ///
    /// Panics on a malformed pattern (empty level, `#` not last).
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        assert!(
            pattern::is_valid(pattern),
            "invalid subscription pattern: {:?}",
            pattern
        );
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().unwrap().push(HandlerEntry {
            id,
            pattern: pattern.to_string(),
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns false if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap();
        let before = handlers.len();
        handlers.retain(|entry| entry.id != id);
        handlers.len() < before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().unwrap().len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Route(String);

    fn counter() -> (Arc<AtomicU64>, Arc<AtomicU64>) {
        let c = Arc::new(AtomicU64::new(0));
        (c.clone(), c)
    }

    // ========================================================================
    // get / set / remove
    // ========================================================================

    #[test]
    fn set_and_get_struct() {
        let store = StateStore::new();
        store.set("app/route", Route("/dashboard".into()));

        let route: Route = store.get_as("app/route").unwrap();
        assert_eq!(route, Route("/dashboard".into()));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = StateStore::new();
        assert!(store.get("app/route").is_none());
        assert!(store.get_as::<Route>("app/route").is_none());
    }

    #[test]
    fn get_as_wrong_type_returns_none() {
        let store = StateStore::new();
        store.set("app/route", 42u32);
        assert!(store.get_as::<Route>("app/route").is_none());
    }

    #[test]
    fn set_overwrites() {
        let store = StateStore::new();
        store.set("counter", 1u32);
        store.set("counter", 2u32);
        assert_eq!(store.get_as::<u32>("counter"), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_is_silent() {
        let store = StateStore::new();
        let (count, c) = counter();
        store.subscribe("#", move |_, _| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        store.set("a", 1u32);
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(!store.contains("a"));
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn snapshot_is_ordered() {
        let store = StateStore::new();
        store.set("notify/list", 0u32);
        store.set("app/route", 0u32);
        store.set("auth/state", 0u32);

        let paths: Vec<String> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(paths, vec!["app/route", "auth/state", "notify/list"]);
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    #[test]
    fn exact_subscription_sees_value() {
        let store = StateStore::new();
        let seen = Arc::new(Mutex::new(Vec::<Route>::new()));
        let s = seen.clone();

        store.subscribe("app/route", move |path, value| {
            assert_eq!(path, "app/route");
            s.lock().unwrap().push(value.cloned::<Route>().unwrap());
        });

        store.set("app/route", Route("/login".into()));
        store.set("auth/state", 0u32);
        store.set("app/route", Route("/dashboard".into()));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Route("/login".into()), Route("/dashboard".into())]
        );
    }

    #[test]
    fn wildcard_subscriptions() {
        let store = StateStore::new();
        let (single, s) = counter();
        let (multi, m) = counter();
        let (all, a) = counter();

        store.subscribe("auth/+", move |_, _| {
            s.fetch_add(1, Ordering::Relaxed);
        });
        store.subscribe("auth/#", move |_, _| {
            m.fetch_add(1, Ordering::Relaxed);
        });
        store.subscribe("#", move |_, _| {
            a.fetch_add(1, Ordering::Relaxed);
        });

        store.set("auth/state", 1u32);
        store.set("auth/deep/path", 2u32);
        store.set("notify/list", 3u32);

        assert_eq!(single.load(Ordering::Relaxed), 1);
        assert_eq!(multi.load(Ordering::Relaxed), 2);
        assert_eq!(all.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = StateStore::new();
        let (count, c) = counter();
        let id = store.subscribe("auth/state", move |_, _| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        store.set("auth/state", 1u32);
        assert!(store.unsubscribe(id));
        store.set("auth/state", 2u32);

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(!store.unsubscribe(id));
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let store = StateStore::new();
        let a = store.subscribe("a", |_, _| {});
        let b = store.subscribe("a", |_, _| {});
        assert_ne!(a, b);
    }

    #[test]
    fn handler_can_read_the_store() {
        let store = Arc::new(StateStore::new());
        let reader = store.clone();
        let (hits, h) = counter();

        store.subscribe("counter", move |path, _| {
            assert_eq!(reader.get_as::<u32>(path), Some(7));
            h.fetch_add(1, Ordering::Relaxed);
        });

        store.set("counter", 7u32);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    #[should_panic(expected = "invalid subscription pattern")]
    fn malformed_pattern_panics() {
        let store = StateStore::new();
        store.subscribe("#/state", |_, _| {});
    }

    #[test]
    fn concurrent_writers() {
        use std::thread;

        let store = Arc::new(StateStore::new());
        let (total, t) = counter();
        store.subscribe("#", move |_, _| {
            t.fetch_add(1, Ordering::Relaxed);
        });

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50u32 {
                        store.set(&format!("thread/{}/{}", n, i), i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert_eq!(total.load(Ordering::Relaxed), 200);
    }
}
