use std::collections::HashMap;

use crate::error::StorageError;
use crate::notification::{NotificationConfig, NotificationPayload};

/// Lookup of watched geofences by region id.
pub trait NotificationStore: Send + Sync {
    /// Get the config registered for a region.
    fn get(&self, region_id: &str) -> Result<Option<NotificationConfig>, StorageError>;
}

/// Dispatches a single notification. Fire-and-forget: failures stay with
/// the implementation.
pub trait Notifier: Send + Sync {
    fn notify(&self, payload: &NotificationPayload);
}

impl<T: NotificationStore + ?Sized> NotificationStore for &T {
    fn get(&self, region_id: &str) -> Result<Option<NotificationConfig>, StorageError> {
        (**self).get(region_id)
    }
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn notify(&self, payload: &NotificationPayload) {
        (**self).notify(payload)
    }
}

/// Configs preloaded for the regions of one event.
///
/// Lets an async backend do its reads up front, in trigger order, and hand
/// the evaluator a synchronous store.
#[derive(Debug, Clone, Default)]
pub struct NotificationSnapshot {
    configs: HashMap<String, NotificationConfig>,
}

impl NotificationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: NotificationConfig) {
        self.configs.insert(config.region_id.clone(), config);
    }

    pub fn contains(&self, region_id: &str) -> bool {
        self.configs.contains_key(region_id)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl FromIterator<NotificationConfig> for NotificationSnapshot {
    fn from_iter<I: IntoIterator<Item = NotificationConfig>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for config in iter {
            snapshot.insert(config);
        }
        snapshot
    }
}

impl NotificationStore for NotificationSnapshot {
    fn get(&self, region_id: &str) -> Result<Option<NotificationConfig>, StorageError> {
        Ok(self.configs.get(region_id).cloned())
    }
}

// In-memory implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::sync::{Mutex, RwLock};

    /// In-memory notification store for testing.
    #[derive(Default)]
    pub struct InMemoryNotificationStore {
        configs: RwLock<HashMap<String, NotificationConfig>>,
        failing: RwLock<Vec<String>>,
    }

    impl InMemoryNotificationStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_configs(configs: impl IntoIterator<Item = NotificationConfig>) -> Self {
            let store = Self::new();
            for config in configs {
                store.put(config);
            }
            store
        }

        pub fn put(&self, config: NotificationConfig) {
            self.configs
                .write()
                .unwrap()
                .insert(config.region_id.clone(), config);
        }

        /// Make lookups of `region_id` return a database error.
        pub fn fail_on(&self, region_id: impl Into<String>) {
            self.failing.write().unwrap().push(region_id.into());
        }
    }

    impl NotificationStore for InMemoryNotificationStore {
        fn get(&self, region_id: &str) -> Result<Option<NotificationConfig>, StorageError> {
            if self.failing.read().unwrap().iter().any(|id| id == region_id) {
                return Err(StorageError::Database(format!("lookup failed: {}", region_id)));
            }
            Ok(self.configs.read().unwrap().get(region_id).cloned())
        }
    }

    /// Notifier that remembers every payload it was handed.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<NotificationPayload>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<NotificationPayload> {
            self.sent.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, payload: &NotificationPayload) {
            self.sent.lock().unwrap().push(payload.clone());
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_store_get() {
            let store = InMemoryNotificationStore::with_configs([NotificationConfig::new(
                "home", None,
            )]);

            assert!(store.get("home").unwrap().is_some());
            assert!(store.get("work").unwrap().is_none());
        }

        #[test]
        fn test_store_failure() {
            let store = InMemoryNotificationStore::new();
            store.fail_on("home");
            assert!(store.get("home").is_err());
        }

        #[test]
        fn test_recording_notifier() {
            let notifier = RecordingNotifier::new();
            notifier.notify(&NotificationPayload::always(1, "a", "b"));
            notifier.notify(&NotificationPayload::always(2, "c", "d"));

            assert_eq!(notifier.count(), 2);
            assert_eq!(notifier.sent()[1].id, 2);
        }
    }
}
