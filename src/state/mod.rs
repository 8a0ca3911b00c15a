// Configuration store
//
// This module provides the ConfigStore which owns the session's current QrConfig,
// replaces it atomically on every update and notifies observers of the change.

use crate::metrics::Metrics;
use crate::models::{ConfigField, QrConfig, QrConfigPatch};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change event emitted after the configuration has been replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigChange {
    /// Fields whose values differ from the previous configuration
    pub changed: Vec<ConfigField>,

    /// The configuration now held by the store
    pub config: Arc<QrConfig>,
}

impl ConfigChange {
    pub fn touches(&self, field: ConfigField) -> bool {
        self.changed.contains(&field)
    }
}

/// Synchronous observer of configuration changes.
///
/// Listeners run on the caller's thread, after the new value is visible through
/// [`ConfigStore::current`] and before [`ConfigStore::update`] returns. They must not block.
pub trait ConfigListener: Send + Sync {
    fn config_changed(&self, config: &Arc<QrConfig>);
}

/// Owner of the session's current [`QrConfig`].
///
/// - [`current()`](Self::current) hands out a shared read-only view
/// - [`update()`](Self::update) is the single mutation entry point; it merges a
///   [`QrConfigPatch`] into a *new* value and swaps it in
/// - [`add_listener()`](Self::add_listener) registers synchronous observers (the render
///   pipeline)
/// - [`subscribe()`](Self::subscribe) returns a broadcast receiver of [`ConfigChange`] events
///   for anything that prefers to listen asynchronously
///
/// Merging never fails. Malformed field values (a bad hex color, an unsupported size) are
/// stored as-is and rejected later, where they are used.
pub struct ConfigStore {
    current: Arc<RwLock<Arc<QrConfig>>>,
    listeners: Arc<RwLock<Vec<Arc<dyn ConfigListener>>>>,
    change_tx: broadcast::Sender<ConfigChange>,
    metrics: Arc<Metrics>,
}

impl ConfigStore {
    /// Create a store holding `initial`, with a broadcast buffer of 100 events
    pub fn new(initial: QrConfig, metrics: Arc<Metrics>) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
            listeners: Arc::new(RwLock::new(Vec::new())),
            change_tx,
            metrics,
        }
    }

    /// The configuration currently in effect.
    pub fn current(&self) -> Arc<QrConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Execute a function with read access to the current configuration
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&QrConfig) -> R,
    {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }

    /// Merge `patch` into the current configuration and make the result current.
    ///
    /// Returns the configuration in effect afterwards. When the patch does not change any
    /// field, the existing value is returned unchanged (same allocation) and nobody is
    /// notified.
    pub fn update(&self, patch: QrConfigPatch) -> Arc<QrConfig> {
        let (next, changed) = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let merged = current.merged(&patch);
            let changed = current.diff(&merged);

            if changed.is_empty() {
                tracing::trace!("Configuration update without effect: {:?}", patch);
                return Arc::clone(&current);
            }

            let next = Arc::new(merged);
            *current = Arc::clone(&next);
            (next, changed)
        };

        self.metrics.record_config_update();
        tracing::debug!("Configuration changed: {:?}", changed);

        self.notify(&next);

        // Ignore send errors - it's OK if no one is listening
        let _ = self.change_tx.send(ConfigChange {
            changed,
            config: Arc::clone(&next),
        });

        next
    }

    /// Register a synchronous observer
    pub fn add_listener(&self, listener: Arc<dyn ConfigListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Subscribe to configuration change events
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.change_tx.subscribe()
    }

    fn notify(&self, config: &Arc<QrConfig>) {
        // Clone the list so listeners may register further listeners without deadlocking
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in listeners {
            listener.config_changed(config);
        }
    }
}

impl Clone for ConfigStore {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            listeners: Arc::clone(&self.listeners),
            change_tx: self.change_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCorrectionLevel;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingListener {
        seen: Mutex<Vec<Arc<QrConfig>>>,
    }

    impl ConfigListener for RecordingListener {
        fn config_changed(&self, config: &Arc<QrConfig>) {
            self.seen.lock().unwrap().push(Arc::clone(config));
        }
    }

    fn store() -> ConfigStore {
        ConfigStore::new(QrConfig::default(), Arc::new(Metrics::new()))
    }

    #[test]
    fn test_update_does_not_touch_previous_value() {
        let store = store();
        let before = store.current();

        let after = store.update(QrConfigPatch::new().content("hello"));

        assert_eq!(before.content, "https://example.com");
        assert_eq!(after.content, "hello");
        assert!(Arc::ptr_eq(&after, &store.current()));
    }

    #[test]
    fn test_update_is_field_local() {
        let store = store();
        let before = store.current();

        let after = store.update(QrConfigPatch::new().size(2048));

        assert_eq!(after.size, 2048);
        assert_eq!(after.content, before.content);
        assert_eq!(after.error_correction_level, before.error_correction_level);
        assert_eq!(after.dark_color, before.dark_color);
        assert_eq!(after.light_color, before.light_color);
    }

    #[test]
    fn test_repeated_patch_is_idempotent() {
        let store = store();
        let patch = QrConfigPatch::new()
            .error_correction_level(ErrorCorrectionLevel::H)
            .transparent_background(true);

        let once = store.update(patch.clone());
        let twice = store.update(patch);

        assert_eq!(*once, *twice);
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_listeners_see_new_value() {
        let store = store();
        let listener = Arc::new(RecordingListener::default());
        store.add_listener(listener.clone());

        store.update(QrConfigPatch::new().pixel_density(12));
        store.update(QrConfigPatch::new().pixel_density(12));

        let seen = listener.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].pixel_density, 12);
    }

    #[test]
    fn test_subscribe_to_changes() {
        let store = store();
        let mut rx = store.subscribe();

        store.update(QrConfigPatch::new().transparent_background(true).content("x"));

        let change = rx.try_recv().unwrap();
        assert!(change.touches(ConfigField::TransparentBackground));
        assert!(change.touches(ConfigField::Content));
        assert!(!change.touches(ConfigField::Size));
        assert!(change.config.transparent_background);
    }

    #[test]
    fn test_metrics_count_effective_updates() {
        let metrics = Arc::new(Metrics::new());
        let store = ConfigStore::new(QrConfig::default(), metrics.clone());

        store.update(QrConfigPatch::new().size(512));
        store.update(QrConfigPatch::new().size(512));
        store.update(QrConfigPatch::new());

        assert_eq!(metrics.config_updates(), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let store1 = store();
        let store2 = store1.clone();

        store1.update(QrConfigPatch::new().content("shared"));

        assert_eq!(store2.read(|c| c.content.clone()), "shared");
    }
}
