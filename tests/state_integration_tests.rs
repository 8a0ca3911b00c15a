//! Integration tests for ConfigStore
//!
//! These tests verify that the ConfigStore correctly:
//! - Emits change events naming exactly the fields that changed
//! - Leaves fields absent from a patch untouched
//! - Treats a repeated patch as a no-op

use proptest::prelude::*;
use qrstudio::models::{ConfigField, SUPPORTED_SIZES};
use qrstudio::{ConfigStore, ErrorCorrectionLevel, Metrics, QrConfig, QrConfigPatch};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

fn store() -> ConfigStore {
    ConfigStore::new(QrConfig::default(), Arc::new(Metrics::new()))
}

fn patch_strategy() -> impl Strategy<Value = QrConfigPatch> {
    (
        proptest::option::of("[a-z ]{0,12}"),
        proptest::option::of(proptest::sample::select(SUPPORTED_SIZES.to_vec())),
        proptest::option::of(proptest::sample::select(ErrorCorrectionLevel::ALL.to_vec())),
        proptest::option::of(4u32..=12),
        proptest::option::of(any::<bool>()),
        proptest::option::of("#[0-9a-f]{6}"),
        proptest::option::of("#[0-9a-f]{6}"),
    )
        .prop_map(
            |(content, size, level, density, transparent, dark, light)| QrConfigPatch {
                content,
                size,
                error_correction_level: level,
                pixel_density: density,
                transparent_background: transparent,
                dark_color: dark,
                light_color: light,
            },
        )
}

#[tokio::test]
async fn test_change_event_lists_changed_fields() {
    let store = store();
    let mut rx = store.subscribe();

    store.update(
        QrConfigPatch::new()
            .transparent_background(true)
            .content("https://example.com"),
    );

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    // content was set to its current value, so only the background changed
    assert_eq!(event.changed, vec![ConfigField::TransparentBackground]);
    assert!(event.touches(ConfigField::TransparentBackground));
    assert!(event.config.transparent_background);
}

#[tokio::test]
async fn test_noop_update_emits_nothing() {
    let store = store();
    let mut rx = store.subscribe();

    store.update(QrConfigPatch::new().size(256));

    let result = timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "Expected no event for a no-op update");
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let store = store();
    let mut rx1 = store.subscribe();
    let mut rx2 = store.subscribe();

    store.update(QrConfigPatch::new().size(1024));

    let event1 = timeout(Duration::from_millis(100), rx1.recv())
        .await
        .expect("Timeout on rx1")
        .expect("rx1 closed");
    let event2 = timeout(Duration::from_millis(100), rx2.recv())
        .await
        .expect("Timeout on rx2")
        .expect("rx2 closed");

    assert_eq!(event1, event2);
    assert_eq!(event1.config.size, 1024);
}

#[test]
fn test_concurrent_updates_leave_consistent_value() {
    let store = store();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            std::thread::spawn(move || {
                for j in 0..50 {
                    store.update(QrConfigPatch::new().content(format!("t{i}-{j}")));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let current = store.current();
    assert!(current.content.starts_with('t'));
    assert_eq!(current.size, 256);
}

proptest! {
    #[test]
    fn prop_fields_outside_patch_are_preserved(patch in patch_strategy()) {
        let store = store();
        let before = store.current();
        let after = store.update(patch.clone());

        prop_assert_eq!(&after.content, patch.content.as_ref().unwrap_or(&before.content));
        prop_assert_eq!(after.size, patch.size.unwrap_or(before.size));
        prop_assert_eq!(
            after.error_correction_level,
            patch.error_correction_level.unwrap_or(before.error_correction_level)
        );
        prop_assert_eq!(after.pixel_density, patch.pixel_density.unwrap_or(before.pixel_density));
        prop_assert_eq!(
            after.transparent_background,
            patch.transparent_background.unwrap_or(before.transparent_background)
        );
        prop_assert_eq!(&after.dark_color, patch.dark_color.as_ref().unwrap_or(&before.dark_color));
        prop_assert_eq!(&after.light_color, patch.light_color.as_ref().unwrap_or(&before.light_color));
    }

    #[test]
    fn prop_repeated_patch_is_noop(patch in patch_strategy()) {
        let metrics = Arc::new(Metrics::new());
        let store = ConfigStore::new(QrConfig::default(), metrics.clone());

        let first = store.update(patch.clone());
        let updates = metrics.config_updates();
        let second = store.update(patch);

        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(metrics.config_updates(), updates);
    }
}
