pub mod file;

pub use file::FileSettings;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub const TARGET_APP_NAME_KEY: &str = "target-app-name";

pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("setting not found: {0}")]
    MissingKey(String),
    #[error("settings unavailable: {0}")]
    Unavailable(String),
}

/// String-valued settings with per-key change notification.
pub trait SettingsStore: Send + Sync + 'static {
    fn get_string(&self, key: &str) -> Result<String, SettingsError>;

    /// Registers `callback` for changes to `key`. The callback receives the new value
    /// and may run on any thread.
    fn on_change(&self, key: &str, callback: ChangeCallback) -> SubscriptionId;

    /// Returns false if `id` was not (or no longer) registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    entries: Mutex<HashMap<SubscriptionId, (String, ChangeCallback)>>,
}

impl Subscribers {
    pub fn add(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.entries).insert(id, (key.to_string(), callback));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        lock(&self.entries).remove(&id).is_some()
    }

    pub fn notify(&self, key: &str, value: &str) {
        let callbacks: Vec<ChangeCallback> = lock(&self.entries)
            .values()
            .filter(|(k, _)| k == key)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        log::debug!("Setting {} changed, notifying {} subscriber(s)", key, callbacks.len());
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process settings store, used when no settings file is wanted and in tests.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    subscribers: Subscribers,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let settings = Self::new();
        lock(&settings.values).insert(key.to_string(), value.to_string());
        settings
    }

    /// Stores `value` and notifies subscribers when it differs from the current one.
    pub fn set(&self, key: &str, value: &str) {
        let previous = lock(&self.values).insert(key.to_string(), value.to_string());
        if previous.as_deref() != Some(value) {
            self.subscribers.notify(key, value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        lock(&self.values)
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::MissingKey(key.to_string()))
    }

    fn on_change(&self, key: &str, callback: ChangeCallback) -> SubscriptionId {
        self.subscribers.add(key, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (ChangeCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ChangeCallback = Arc::new(move |value: &str| {
            sink.lock().unwrap().push(value.to_string());
        });
        (callback, seen)
    }

    #[test]
    fn get_string_reports_missing_key() {
        let settings = MemorySettings::with_value(TARGET_APP_NAME_KEY, "Teams - Chat");

        assert_eq!(settings.get_string(TARGET_APP_NAME_KEY).unwrap(), "Teams - Chat");
        assert_eq!(
            settings.get_string("other"),
            Err(SettingsError::MissingKey("other".to_string()))
        );
    }

    #[test]
    fn set_notifies_only_matching_key_and_only_on_change() {
        // Arrange
        let settings = MemorySettings::new();
        let (callback, seen) = recorder();
        settings.on_change(TARGET_APP_NAME_KEY, callback);

        // Act
        settings.set(TARGET_APP_NAME_KEY, "Slack");
        settings.set(TARGET_APP_NAME_KEY, "Slack");
        settings.set("unrelated", "value");
        settings.set(TARGET_APP_NAME_KEY, "Teams - Chat");

        // Assert
        assert_eq!(*seen.lock().unwrap(), vec!["Slack".to_string(), "Teams - Chat".to_string()]);
    }

    #[test]
    fn unsubscribe_stops_notifications_and_is_single_shot() {
        // Arrange
        let settings = MemorySettings::new();
        let (callback, seen) = recorder();
        let id = settings.on_change(TARGET_APP_NAME_KEY, callback);

        // Act
        let first = settings.unsubscribe(id);
        let second = settings.unsubscribe(id);
        settings.set(TARGET_APP_NAME_KEY, "Slack");

        // Assert
        assert!(first);
        assert!(!second);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(settings.subscriber_count(), 0);
    }

    #[test]
    fn subscription_ids_are_unique() {
        let subscribers = Subscribers::default();
        let (callback, _) = recorder();

        let ids: Vec<SubscriptionId> = (0..5)
            .map(|_| subscribers.add(TARGET_APP_NAME_KEY, Arc::clone(&callback)))
            .collect();

        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert_eq!(subscribers.len(), 5);
    }

    #[test]
    fn callback_may_unsubscribe_itself() {
        let settings = Arc::new(MemorySettings::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&settings);
        let slot_clone = Arc::clone(&slot);
        let id = settings.on_change(
            TARGET_APP_NAME_KEY,
            Arc::new(move |_: &str| {
                let id = slot_clone.lock().unwrap().take();
                if let (Some(settings), Some(id)) = (weak.upgrade(), id) {
                    settings.unsubscribe(id);
                }
            }),
        );
        *slot.lock().unwrap() = Some(id);

        settings.set(TARGET_APP_NAME_KEY, "Slack");

        assert_eq!(settings.subscriber_count(), 0);
    }
}
